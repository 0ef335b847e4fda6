//! Daemon configuration file.
//!
//! YAML, one switch per agent process:
//!
//! ```yaml
//! backend: vendor
//! switch_uuid: 6b8b4567-327b-23c6-643c-986966334873
//! port_count: 48
//! switch:
//!   switch_id: 0
//!   ports:
//!     - index: 1
//!       port_type: host
//!       interface_mode: sgmii
//!       link_state: Up
//!   vlans: [1, 100]
//!   vlan_ports:
//!     - { vlan_id: 100, port: 1, tagged: false }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use swagent_core::SwitchBootConfig;
use uuid::Uuid;

/// Which hardware generation this agent drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Register-level vendor SDK.
    Vendor,
    /// Kernel route-netlink.
    Kernel,
}

/// Top-level daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub backend: BackendKind,
    /// External identity of the switch, used by the orchestration layer.
    pub switch_uuid: Uuid,
    /// Front-panel port count (simulated runs size the model with it).
    #[serde(default = "default_port_count")]
    pub port_count: u16,
    /// Static bootstrap configuration; required for the vendor backend.
    #[serde(default)]
    pub switch: Option<SwitchBootConfig>,
}

fn default_port_count() -> u16 {
    48
}

impl AgentConfig {
    /// Loads and parses the configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("cannot parse config file {}", path.display()))
    }

    /// The switch id this agent manages (0 when no bootstrap section names
    /// one).
    pub fn switch_id(&self) -> u16 {
        self.switch.as_ref().map(|boot| boot.switch_id).unwrap_or(0)
    }
}
