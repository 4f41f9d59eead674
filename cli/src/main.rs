//! CLI entrypoint for warden-swarm
//!
//! This is the main binary that wires together all layers using
//! dependency injection and runs a local swarm demonstration: a typed
//! agent cohort, a batch of authorization requests through the pipeline,
//! and a closing consensus round.

use anyhow::Result;
use clap::Parser;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use warden_application::SwarmCoordinator;
use warden_domain::{AgentType, AuthzDecision, AuthzRequest, SystemClock};
use warden_infrastructure::{ConfigLoader, InMemoryAgentFactory, InMemoryAgentGateway};

#[derive(Parser, Debug)]
#[command(name = "warden-swarm", version, about = "Agent swarm orchestration for the Warden authorization platform")]
struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Explicit configuration file
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Skip all configuration files and use built-in defaults
    #[arg(long)]
    no_config: bool,

    /// Guardian agents to register
    #[arg(long, default_value_t = 3)]
    guardians: usize,

    /// Analyst agents to register
    #[arg(long, default_value_t = 2)]
    analysts: usize,

    /// Enforcer agents to register
    #[arg(long, default_value_t = 2)]
    enforcers: usize,

    /// Advisor agents to register
    #[arg(long, default_value_t = 0)]
    advisors: usize,

    /// Authorization requests to run through the pipeline
    #[arg(long, default_value_t = 5)]
    requests: usize,

    /// Validate every decision with a consensus round
    #[arg(long)]
    consensus: bool,

    /// Override the load-balancing strategy
    #[arg(long)]
    strategy: Option<String>,

    /// Override the topology type
    #[arg(long)]
    topology: Option<String>,

    /// Emit pipeline results as JSON lines instead of text
    #[arg(long)]
    json: bool,

    /// Suppress the banner and summaries
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting warden-swarm");

    let file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?
    };
    file_config.validate()?;
    let mut config = file_config.to_swarm_config();
    if let Some(strategy) = &cli.strategy {
        config.balancer.strategy = strategy.clone();
    }
    if let Some(topology) = &cli.topology {
        config.topology.topology = topology.clone();
    }
    // The demo cohort must fit the pool
    let cohort_size = cli.guardians + cli.analysts + cli.enforcers + cli.advisors;
    config.pool.max_agents = config
        .pool
        .max_agents
        .max(config.pool.min_agents + cohort_size);

    // === Dependency Injection ===
    let clock = Arc::new(SystemClock);
    let factory = Arc::new(InMemoryAgentFactory::new(clock.clone()));
    let gateway = Arc::new(InMemoryAgentGateway::new());

    let coordinator = SwarmCoordinator::new(config.clone(), factory, gateway, clock)?;
    coordinator.initialize().await?;

    let mut distribution: HashMap<AgentType, usize> = HashMap::new();
    for (agent_type, count) in [
        (AgentType::Guardian, cli.guardians),
        (AgentType::Analyst, cli.analysts),
        (AgentType::Enforcer, cli.enforcers),
        (AgentType::Advisor, cli.advisors),
    ] {
        if count > 0 {
            distribution.insert(agent_type, count);
        }
    }
    let registered = coordinator.register_authz_agents(&distribution).await?;

    if !cli.quiet {
        println!();
        println!("+============================================================+");
        println!("|           Warden Swarm - Authorization Fabric              |");
        println!("+============================================================+");
        println!();
        println!("Started:  {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
        println!("Strategy: {}", coordinator.balancer_strategy().await);
        println!("Topology: {}", config.topology.topology);
        println!("Agents:   {} registered", registered.len());
        println!();
    }

    let mut allowed = 0usize;
    let mut denied = 0usize;
    for i in 0..cli.requests {
        let mut request = AuthzRequest::new(
            format!("req-{}", i + 1),
            format!("user-{}", i % 3 + 1),
            "document:read",
            format!("doc-{}", i + 1),
        )
        .with_session_id(format!("session-{}", i % 3 + 1));
        // Every fourth request carries a suspicious context so the demo
        // exercises the deny path
        if i % 4 == 3 {
            request = request.with_context(serde_json::json!({ "suspicious": true }));
        }
        if cli.consensus {
            request = request.with_consensus();
        }

        let result = coordinator.coordinate_authz_pipeline(request).await?;
        match result.decision {
            AuthzDecision::Allow => allowed += 1,
            _ => denied += 1,
        }

        if cli.json {
            println!("{}", serde_json::to_string(&result)?);
        } else if !cli.quiet {
            println!(
                "  {:<8} {:<6} confidence {:.2}  stages {}  {} ms",
                result.request_id,
                result.decision,
                result.confidence,
                result.agent_decisions.len(),
                result.processing_time_ms
            );
        }
    }

    // Closing consensus round over the whole fleet
    let proposal = AuthzRequest::new("proposal-1", "system", "policy:update", "ruleset-7");
    let round = coordinator.run_consensus_round("proposal-1", &proposal).await?;

    coordinator.run_maintenance().await;
    let pool_metrics = coordinator.pool().metrics().await;
    let topology_metrics = coordinator.topology_metrics().await;

    if !cli.quiet {
        println!();
        println!("+------------------------------------------------------------+");
        println!("| Summary                                                    |");
        println!("+------------------------------------------------------------+");
        println!("Requests:   {} allowed, {} denied", allowed, denied);
        println!(
            "Consensus:  reached={} decision={} ({}/{} approvals)",
            round.reached, round.decision, round.approvals, round.total_votes
        );
        println!(
            "Pool:       {} agents, {} available, avg load {:.2}",
            pool_metrics.agents, pool_metrics.available, pool_metrics.avg_load
        );
        println!(
            "Topology:   {} connections, health {:.2}",
            topology_metrics.total_connections, topology_metrics.health_score
        );
        println!();
    }

    coordinator.shutdown().await;
    Ok(())
}
