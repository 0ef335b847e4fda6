//! Vendor-backend switch bootstrap.
//!
//! Applies the static port/VLAN/spanning-tree configuration at switch
//! initialization. Every step fails fast except the administrative
//! link-state application, which continues per port.

use crate::error::AgentResult;
use crate::vendor::{base_page_for, VendorBackend};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use swagent_hal::sdk::{
    autoneg_mode, eth_mode, lane_sel, mac_sel, port_attr, port_mode, stp_mode, stp_state,
    switch_attr, vlan_attr,
};
use swagent_hal::{Hal, SwitchSdk};
use swagent_types::{LinkState, PortType, VlanId};
use tracing::{debug, info, warn};

/// How long to wait for the hardware-present signal.
const SWITCH_READY_TIMEOUT: Duration = Duration::from_secs(3);

/// Configured electrical interface mode of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceMode {
    Disabled,
    Sgmii,
    #[serde(rename = "10gbase-cr")]
    BaseCr10g,
}

impl InterfaceMode {
    fn register_value(self) -> u64 {
        match self {
            InterfaceMode::Disabled => eth_mode::DISABLED,
            InterfaceMode::Sgmii => eth_mode::SGMII,
            InterfaceMode::BaseCr10g => eth_mode::BASE_CR_10G,
        }
    }
}

/// Configured autonegotiation mode of a port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutonegMode {
    #[default]
    None,
    Clause37,
    Clause73,
}

impl AutonegMode {
    fn register_value(self) -> u64 {
        match self {
            AutonegMode::None => autoneg_mode::NONE,
            AutonegMode::Clause37 => autoneg_mode::CLAUSE_37,
            AutonegMode::Clause73 => autoneg_mode::CLAUSE_73,
        }
    }
}

/// Static configuration of one port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortConfig {
    pub index: u16,
    #[serde(default)]
    pub port_type: PortType,
    #[serde(default)]
    pub interface_mode: Option<InterfaceMode>,
    #[serde(default)]
    pub autoneg: AutonegMode,
    #[serde(default)]
    pub link_state: LinkState,
}

/// Static port-to-VLAN mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VlanPortConfig {
    pub vlan_id: u16,
    pub port: u16,
    #[serde(default)]
    pub tagged: bool,
}

/// Static switch configuration applied at initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchBootConfig {
    pub switch_id: u16,
    #[serde(default)]
    pub ports: Vec<PortConfig>,
    #[serde(default)]
    pub vlans: Vec<u16>,
    #[serde(default)]
    pub vlan_ports: Vec<VlanPortConfig>,
}

impl VendorBackend {
    /// Initializes the switch hardware and applies the static
    /// configuration. An error in any step (other than the per-port
    /// link-state application) aborts the sequence and leaves the switch
    /// uninitialized.
    pub fn bootstrap(sdk: Arc<dyn SwitchSdk>, config: &SwitchBootConfig) -> AgentResult<Self> {
        let hal = Hal::new(sdk);
        let switch = config.switch_id;

        info!(switch, "initializing switch");
        hal.initialize()?;
        hal.wait_switch_ready(SWITCH_READY_TIMEOUT)?;
        hal.set_switch_state(switch, true)?;

        // per-port electrical and autonegotiation modes
        for port in &config.ports {
            if let Some(mode) = port.interface_mode {
                hal.set_port_attribute_v2(
                    switch,
                    port.index,
                    mac_sel::ACTIVE,
                    lane_sel::ALL,
                    port_attr::ETH_IFACE_MODE,
                    mode.register_value(),
                )?;
                debug!(switch, port = port.index, ?mode, "interface mode set");
            }
            if port.autoneg != AutonegMode::None {
                let autoneg = port.autoneg.register_value();
                hal.set_port_attribute_v2(
                    switch,
                    port.index,
                    mac_sel::ACTIVE,
                    lane_sel::ALL,
                    port_attr::AUTONEG,
                    autoneg,
                )?;
                hal.set_port_attribute_v2(
                    switch,
                    port.index,
                    mac_sel::ACTIVE,
                    lane_sel::ALL,
                    port_attr::AUTONEG_BASEPAGE,
                    base_page_for(autoneg),
                )?;
                debug!(switch, port = port.index, mode = ?port.autoneg, "autonegotiation set");
            }
        }

        // static VLANs, idempotent; memberships fail fast with no rollback
        // wrapper here, process start owns the failure handling
        for vlan in &config.vlans {
            let vlan = VlanId::new(*vlan)?;
            let created = hal.create_vlan(switch, vlan.as_u16())?;
            if created {
                hal.set_vlan_attribute(switch, vlan.as_u16(), vlan_attr::MTU, 0)?;
            }
            debug!(switch, %vlan, created, "static vlan ready");
        }
        for mapping in &config.vlan_ports {
            let vlan = VlanId::new(mapping.vlan_id)?;
            hal.add_vlan_port(switch, vlan.as_u16(), mapping.port, mapping.tagged)?;
            if !mapping.tagged {
                hal.set_port_attribute(
                    switch,
                    mapping.port,
                    port_attr::DEF_VLAN,
                    u64::from(vlan.as_u16()),
                )?;
            }
            hal.set_vlan_port_state(switch, vlan.as_u16(), mapping.port, stp_state::FORWARDING)?;
            debug!(
                switch,
                %vlan,
                port = mapping.port,
                tagged = mapping.tagged,
                "static membership applied"
            );
        }

        // spanning tree: multiple-instance mode, every port forwarding
        hal.set_switch_attribute(switch, switch_attr::SPANNING_TREE_MODE, stp_mode::MULTIPLE)?;
        for port in &config.ports {
            hal.set_spanning_tree_port_state(switch, 0, port.index, stp_state::FORWARDING)?;
        }

        // administrative link state; a failed port is logged and the
        // sequence continues with the next one
        for port in &config.ports {
            let mode = match port.link_state {
                LinkState::Up => port_mode::UP,
                _ => port_mode::ADMIN_DOWN,
            };
            if let Err(err) = hal.set_port_state(switch, port.index, mac_sel::ACTIVE, mode) {
                warn!(switch, port = port.index, %err, "cannot apply administrative state");
            }
        }

        let hw = hal.switch_info(switch)?;
        info!(
            switch,
            ports = hw.port_count,
            max_vlans = hw.max_vlans,
            model = hw.model,
            "switch initialized"
        );

        let port_types: HashMap<u16, PortType> = config
            .ports
            .iter()
            .map(|port| (port.index, port.port_type))
            .collect();
        Ok(VendorBackend::new(switch, hal, port_types, hw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swagent_hal::{FailRule, SdkStatus, SimSwitchSdk, SwitchSdk as _};

    fn config() -> SwitchBootConfig {
        SwitchBootConfig {
            switch_id: 0,
            ports: vec![
                PortConfig {
                    index: 1,
                    port_type: PortType::Host,
                    interface_mode: Some(InterfaceMode::Sgmii),
                    autoneg: AutonegMode::None,
                    link_state: LinkState::Up,
                },
                PortConfig {
                    index: 2,
                    port_type: PortType::Network,
                    interface_mode: Some(InterfaceMode::BaseCr10g),
                    autoneg: AutonegMode::Clause37,
                    link_state: LinkState::Down,
                },
            ],
            vlans: vec![1, 100],
            vlan_ports: vec![
                VlanPortConfig {
                    vlan_id: 100,
                    port: 1,
                    tagged: false,
                },
                VlanPortConfig {
                    vlan_id: 100,
                    port: 2,
                    tagged: true,
                },
            ],
        }
    }

    #[test]
    fn test_bootstrap_applies_static_config() {
        let sim = Arc::new(SimSwitchSdk::new(8));
        let backend = VendorBackend::bootstrap(sim.clone(), &config()).unwrap();

        assert_eq!(backend.info().port_count, 8);
        assert!(sim.vlan_exists(100));
        assert_eq!(sim.members(100), vec![1, 2]);
        // untagged member's default VLAN moved to the mapping
        assert_eq!(sim.raw_port_attribute(1, port_attr::DEF_VLAN), Some(100));
        // autoneg written with its base page
        assert_eq!(
            sim.raw_port_attribute(2, port_attr::AUTONEG),
            Some(autoneg_mode::CLAUSE_37)
        );
        assert_eq!(
            sim.raw_port_attribute(2, port_attr::AUTONEG_BASEPAGE),
            Some(base_page_for(autoneg_mode::CLAUSE_37))
        );
    }

    #[test]
    fn test_bootstrap_membership_failure_is_fatal() {
        let sim = Arc::new(SimSwitchSdk::new(8));
        sim.inject_failure(FailRule {
            call: "add_vlan_port",
            port: Some(2),
            attr: None,
            status: SdkStatus::Failure,
        });
        assert!(VendorBackend::bootstrap(sim, &config()).is_err());
    }

    #[test]
    fn test_bootstrap_continues_past_port_state_failure() {
        let sim = Arc::new(SimSwitchSdk::new(8));
        sim.inject_failure(FailRule {
            call: "set_port_state",
            port: Some(1),
            attr: None,
            status: SdkStatus::Failure,
        });
        // port 1's admin state fails, the sequence still completes
        let backend = VendorBackend::bootstrap(sim, &config()).unwrap();
        assert_eq!(backend.switch_id(), 0);
    }

    #[test]
    fn test_bootstrap_idempotent_vlans() {
        let sim = Arc::new(SimSwitchSdk::new(8));
        assert_eq!(sim.create_vlan(0, 100), SdkStatus::Ok);
        // VLAN 100 pre-exists; bootstrap must not fail on it
        assert!(VendorBackend::bootstrap(sim, &config()).is_ok());
    }
}
