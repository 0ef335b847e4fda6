//! Library surface of the switch-configuration agent daemon: configuration
//! loading and agent construction, kept separate from `main` so tests can
//! drive them.

pub mod config;

pub use config::{AgentConfig, BackendKind};

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use swagent_core::{Agent, Backend, KernelBackend, VendorBackend};
use swagent_hal::SimSwitchSdk;
use tracing::info;

/// Builds the agent from its configuration.
///
/// The vendor backend needs the SDK runtime; without hardware attached the
/// simulated SDK stands in when `simulate` is set. The kernel backend talks
/// to the OS directly and ignores `simulate`.
pub fn build_agent(config: &AgentConfig, simulate: bool) -> Result<Agent> {
    let mut agent = Agent::new();

    let backend = match config.backend {
        BackendKind::Vendor => {
            let boot = config
                .switch
                .as_ref()
                .context("vendor backend requires a [switch] bootstrap section")?;
            if !simulate {
                // the FFI SDK binding is generated when the vendor headers
                // are available at build time
                bail!("vendor sdk not linked into this build; run with --simulate");
            }
            let sdk = Arc::new(SimSwitchSdk::new(config.port_count));
            let backend = VendorBackend::bootstrap(sdk, boot)
                .context("switch bootstrap failed, switch stays disabled")?;
            Backend::Vendor(backend)
        }
        BackendKind::Kernel => {
            let port_types: HashMap<_, _> = config
                .switch
                .as_ref()
                .map(|boot| {
                    boot.ports
                        .iter()
                        .map(|port| (port.index, port.port_type))
                        .collect()
                })
                .unwrap_or_default();
            Backend::Kernel(KernelBackend::new(config.switch_id(), port_types))
        }
    };

    info!(
        switch = backend.switch_id(),
        uuid = %config.switch_uuid,
        backend = ?config.backend,
        "switch registered"
    );
    agent.register_switch(config.switch_uuid, backend);
    Ok(agent)
}
