//! Agent model: entities, identifiers, tasks and assignments

pub mod entities;
pub mod value_objects;

pub use entities::{Agent, AgentMetadata, AgentStatus, AgentType, ConnectionInfo};
pub use value_objects::{AgentId, Assignment, Task, TaskId, TaskMetadata};
