//! Core domain primitives shared across the swarm

pub mod clock;
pub mod error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SwarmError;
