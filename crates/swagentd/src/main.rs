//! swagentd - rack switch configuration agent daemon.
//!
//! Loads the switch configuration, selects the hardware backend, runs the
//! vendor bootstrap when applicable and registers the switch for the
//! command layer.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use swagentd::{build_agent, AgentConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "swagentd", about = "Rack switch configuration agent", version)]
struct Args {
    /// Path to the agent configuration file.
    #[arg(short, long, default_value = "/etc/swagent/swagentd.yaml")]
    config: PathBuf,

    /// Use the simulated vendor SDK instead of real hardware.
    #[arg(long)]
    simulate: bool,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = AgentConfig::load(&args.config)?;
    let _agent = build_agent(&config, args.simulate)?;

    info!("agent ready");
    Ok(())
}
