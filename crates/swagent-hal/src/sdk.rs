//! The vendor SDK register-access trait and its constants.
//!
//! Method names and shapes track the SDK entry points one to one; the only
//! departure is that the SDK's first/next iteration pairs are surfaced as
//! list-returning methods, keeping the cursor handling inside the binding.

use crate::error::{check, HalError, HalResult};
use crate::status::SdkStatus;
use std::sync::Arc;
use std::time::Duration;

/// Selector for the port MAC the call operates on.
pub mod mac_sel {
    /// The currently active MAC of the port.
    pub const ACTIVE: i32 = 0;
}

/// Selector for the port lane the call operates on.
pub mod lane_sel {
    /// Apply to every lane of the port.
    pub const ALL: i32 = -1;
}

/// Per-port register attribute ids.
pub mod port_attr {
    /// Link speed in Gb/s.
    pub const SPEED: i32 = 1;
    /// Default VLAN for untagged ingress traffic (PVID).
    pub const DEF_VLAN: i32 = 2;
    /// Drop untagged frames on ingress (boolean register).
    pub const DROP_UNTAGGED: i32 = 3;
    /// Maximum frame size in bytes.
    pub const MAX_FRAME_SIZE: i32 = 4;
    /// Autonegotiation mode (see [`autoneg_mode`](super::autoneg_mode)).
    pub const AUTONEG: i32 = 5;
    /// Autonegotiation base page advertised to the peer.
    pub const AUTONEG_BASEPAGE: i32 = 6;
    /// Electrical interface mode (see [`eth_mode`](super::eth_mode)).
    pub const ETH_IFACE_MODE: i32 = 7;
}

/// Per-VLAN register attribute ids.
pub mod vlan_attr {
    /// VLAN MTU; 0 selects the SDK default.
    pub const MTU: i32 = 1;
}

/// Switch-global register attribute ids.
pub mod switch_attr {
    /// Spanning tree mode (see [`stp_mode`](super::stp_mode)).
    pub const SPANNING_TREE_MODE: i32 = 1;
}

/// Electrical interface mode register values.
pub mod eth_mode {
    pub const DISABLED: u64 = 0;
    pub const SGMII: u64 = 1;
    pub const BASE_CR_10G: u64 = 4;
}

/// Administrative port mode register values.
pub mod port_mode {
    pub const UP: i32 = 0;
    pub const ADMIN_DOWN: i32 = 1;
    pub const ADMIN_PWRDOWN: i32 = 2;
}

/// Operational port state register values.
pub mod port_state {
    pub const UP: i32 = 0;
    pub const DOWN: i32 = 1;
    pub const ADMIN_DOWN: i32 = 2;
    pub const ADMIN_PWRDOWN: i32 = 3;
}

/// Autonegotiation mode register values.
pub mod autoneg_mode {
    pub const NONE: u64 = 0;
    pub const CLAUSE_37: u64 = 1;
    pub const CLAUSE_73: u64 = 2;
}

/// Spanning tree modes.
pub mod stp_mode {
    pub const MULTIPLE: u64 = 1;
}

/// Spanning tree port states.
pub mod stp_state {
    pub const FORWARDING: i32 = 3;
}

/// Boolean register encoding.
pub mod flag {
    pub const DISABLED: u64 = 0;
    pub const ENABLED: u64 = 1;
}

/// Port speed capability bitmask bits.
pub mod speed_cap {
    pub const GBPS_1: u32 = 1 << 2;
    pub const GBPS_10: u32 = 1 << 5;
    pub const GBPS_20: u32 = 1 << 6;
    pub const GBPS_40: u32 = 1 << 7;
}

/// Hardware capability information read back after bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchInfo {
    /// Number of front-panel ports, excluding the reserved management
    /// port 0.
    pub port_count: u16,
    /// Maximum number of VLANs the hardware supports.
    pub max_vlans: u16,
    /// Vendor switch model number.
    pub model: u32,
}

/// Register-level access to one vendor switch generation.
///
/// Implementations must be callable from any thread, but provide no internal
/// serialization: read-then-write register sequences are not atomic and
/// callers must not issue concurrent operations against the same switch.
pub trait SwitchSdk: Send + Sync {
    /// Initializes the SDK runtime.
    fn initialize(&self) -> SdkStatus;

    /// Blocks until the hardware-present signal arrives or the timeout
    /// elapses.
    fn wait_switch_ready(&self, timeout: Duration) -> SdkStatus;

    /// Brings the switch administratively up or down.
    fn set_switch_state(&self, switch: u16, up: bool) -> SdkStatus;

    /// Reads hardware capability information.
    fn switch_info(&self, switch: u16) -> Result<SwitchInfo, SdkStatus>;

    /// Writes a switch-global attribute register.
    fn set_switch_attribute(&self, switch: u16, attr: i32, value: u64) -> SdkStatus;

    /// Creates a VLAN. Returns `VlanAlreadyExists` if it is present.
    fn create_vlan(&self, switch: u16, vlan: u16) -> SdkStatus;

    /// Deletes a VLAN.
    fn delete_vlan(&self, switch: u16, vlan: u16) -> SdkStatus;

    /// Lists the VLANs currently present on the switch.
    fn vlan_list(&self, switch: u16) -> Result<Vec<u16>, SdkStatus>;

    /// Adds a port to a VLAN with the given tagging.
    fn add_vlan_port(&self, switch: u16, vlan: u16, port: u16, tagged: bool) -> SdkStatus;

    /// Removes a port from a VLAN.
    fn delete_vlan_port(&self, switch: u16, vlan: u16, port: u16) -> SdkStatus;

    /// Lists the member ports of a VLAN.
    fn vlan_ports(&self, switch: u16, vlan: u16) -> Result<Vec<u16>, SdkStatus>;

    /// Reads the tagging flag of a VLAN membership. Returns `InvalidPort`
    /// when the port is not a member.
    fn vlan_port_tag(&self, switch: u16, vlan: u16, port: u16) -> Result<bool, SdkStatus>;

    /// Writes a per-VLAN attribute register.
    fn set_vlan_attribute(&self, switch: u16, vlan: u16, attr: i32, value: u64) -> SdkStatus;

    /// Sets the spanning-tree state of a port within a VLAN.
    fn set_vlan_port_state(&self, switch: u16, vlan: u16, port: u16, state: i32) -> SdkStatus;

    /// Reads a per-port attribute register.
    fn port_attribute(&self, switch: u16, port: u16, attr: i32) -> Result<u64, SdkStatus>;

    /// Writes a per-port attribute register.
    fn set_port_attribute(&self, switch: u16, port: u16, attr: i32, value: u64) -> SdkStatus;

    /// Writes a per-port attribute register on a specific MAC and lane.
    fn set_port_attribute_v2(
        &self,
        switch: u16,
        port: u16,
        mac: i32,
        lane: i32,
        attr: i32,
        value: u64,
    ) -> SdkStatus;

    /// Reads the administrative mode and operational state of a port.
    fn port_state(&self, switch: u16, port: u16, mac: i32) -> Result<(i32, i32), SdkStatus>;

    /// Sets the administrative mode of a port.
    fn set_port_state(&self, switch: u16, port: u16, mac: i32, mode: i32) -> SdkStatus;

    /// Reads the speed capability bitmask of a port.
    fn port_capabilities(&self, switch: u16, port: u16) -> Result<u32, SdkStatus>;

    /// Sets the spanning-tree state of a port in an STP instance.
    fn set_spanning_tree_port_state(
        &self,
        switch: u16,
        stp_instance: i32,
        port: u16,
        state: i32,
    ) -> SdkStatus;
}

/// Typed wrapper over a [`SwitchSdk`] that converts status codes into
/// [`HalError`]s carrying call context.
#[derive(Clone)]
pub struct Hal {
    sdk: Arc<dyn SwitchSdk>,
}

impl Hal {
    /// Wraps an SDK implementation.
    pub fn new(sdk: Arc<dyn SwitchSdk>) -> Self {
        Self { sdk }
    }

    /// Returns the underlying SDK handle.
    pub fn sdk(&self) -> &Arc<dyn SwitchSdk> {
        &self.sdk
    }

    pub fn initialize(&self) -> HalResult<()> {
        check(self.sdk.initialize(), "initialize", || String::new())
    }

    /// Waits for the hardware-present signal, bounded by `timeout`.
    pub fn wait_switch_ready(&self, timeout: Duration) -> HalResult<()> {
        let status = self.sdk.wait_switch_ready(timeout);
        if status.is_ok() {
            Ok(())
        } else {
            Err(HalError::InsertionTimeout { status })
        }
    }

    pub fn set_switch_state(&self, switch: u16, up: bool) -> HalResult<()> {
        check(self.sdk.set_switch_state(switch, up), "set_switch_state", || {
            format!("switch={} up={}", switch, up)
        })
    }

    pub fn switch_info(&self, switch: u16) -> HalResult<SwitchInfo> {
        self.sdk
            .switch_info(switch)
            .map_err(|status| HalError::call("switch_info", format!("switch={}", switch), status))
    }

    pub fn set_switch_attribute(&self, switch: u16, attr: i32, value: u64) -> HalResult<()> {
        check(
            self.sdk.set_switch_attribute(switch, attr, value),
            "set_switch_attribute",
            || format!("switch={} attr={} value={}", switch, attr, value),
        )
    }

    /// Creates a VLAN if it does not exist. Returns true when this call
    /// created it, false when it was already present.
    pub fn create_vlan(&self, switch: u16, vlan: u16) -> HalResult<bool> {
        match self.sdk.create_vlan(switch, vlan) {
            SdkStatus::Ok => Ok(true),
            SdkStatus::VlanAlreadyExists => Ok(false),
            status => Err(HalError::call(
                "create_vlan",
                format!("switch={} vlan={}", switch, vlan),
                status,
            )),
        }
    }

    pub fn delete_vlan(&self, switch: u16, vlan: u16) -> HalResult<()> {
        check(self.sdk.delete_vlan(switch, vlan), "delete_vlan", || {
            format!("switch={} vlan={}", switch, vlan)
        })
    }

    pub fn vlan_list(&self, switch: u16) -> HalResult<Vec<u16>> {
        self.sdk
            .vlan_list(switch)
            .map_err(|status| HalError::call("vlan_list", format!("switch={}", switch), status))
    }

    pub fn add_vlan_port(&self, switch: u16, vlan: u16, port: u16, tagged: bool) -> HalResult<()> {
        check(
            self.sdk.add_vlan_port(switch, vlan, port, tagged),
            "add_vlan_port",
            || format!("switch={} vlan={} port={} tag={}", switch, vlan, port, tagged),
        )
    }

    pub fn delete_vlan_port(&self, switch: u16, vlan: u16, port: u16) -> HalResult<()> {
        check(
            self.sdk.delete_vlan_port(switch, vlan, port),
            "delete_vlan_port",
            || format!("switch={} vlan={} port={}", switch, vlan, port),
        )
    }

    pub fn vlan_ports(&self, switch: u16, vlan: u16) -> HalResult<Vec<u16>> {
        self.sdk.vlan_ports(switch, vlan).map_err(|status| {
            HalError::call("vlan_ports", format!("switch={} vlan={}", switch, vlan), status)
        })
    }

    /// Reads the tagging flag of a membership. `Ok(None)` means the port is
    /// not a member of the VLAN.
    pub fn vlan_port_tag(&self, switch: u16, vlan: u16, port: u16) -> HalResult<Option<bool>> {
        match self.sdk.vlan_port_tag(switch, vlan, port) {
            Ok(tagged) => Ok(Some(tagged)),
            Err(SdkStatus::InvalidPort) => Ok(None),
            Err(status) => Err(HalError::call(
                "vlan_port_tag",
                format!("switch={} vlan={} port={}", switch, vlan, port),
                status,
            )),
        }
    }

    pub fn set_vlan_attribute(&self, switch: u16, vlan: u16, attr: i32, value: u64) -> HalResult<()> {
        check(
            self.sdk.set_vlan_attribute(switch, vlan, attr, value),
            "set_vlan_attribute",
            || format!("switch={} vlan={} attr={} value={}", switch, vlan, attr, value),
        )
    }

    pub fn set_vlan_port_state(&self, switch: u16, vlan: u16, port: u16, state: i32) -> HalResult<()> {
        check(
            self.sdk.set_vlan_port_state(switch, vlan, port, state),
            "set_vlan_port_state",
            || format!("switch={} vlan={} port={} state={}", switch, vlan, port, state),
        )
    }

    pub fn port_attribute(&self, switch: u16, port: u16, attr: i32) -> HalResult<u64> {
        self.sdk.port_attribute(switch, port, attr).map_err(|status| {
            HalError::call(
                "port_attribute",
                format!("switch={} port={} attr={}", switch, port, attr),
                status,
            )
        })
    }

    pub fn set_port_attribute(&self, switch: u16, port: u16, attr: i32, value: u64) -> HalResult<()> {
        check(
            self.sdk.set_port_attribute(switch, port, attr, value),
            "set_port_attribute",
            || format!("switch={} port={} attr={} value={}", switch, port, attr, value),
        )
    }

    pub fn set_port_attribute_v2(
        &self,
        switch: u16,
        port: u16,
        mac: i32,
        lane: i32,
        attr: i32,
        value: u64,
    ) -> HalResult<()> {
        check(
            self.sdk.set_port_attribute_v2(switch, port, mac, lane, attr, value),
            "set_port_attribute_v2",
            || {
                format!(
                    "switch={} port={} mac={} lane={} attr={} value={}",
                    switch, port, mac, lane, attr, value
                )
            },
        )
    }

    pub fn port_state(&self, switch: u16, port: u16, mac: i32) -> HalResult<(i32, i32)> {
        self.sdk.port_state(switch, port, mac).map_err(|status| {
            HalError::call(
                "port_state",
                format!("switch={} port={} mac={}", switch, port, mac),
                status,
            )
        })
    }

    pub fn set_port_state(&self, switch: u16, port: u16, mac: i32, mode: i32) -> HalResult<()> {
        check(
            self.sdk.set_port_state(switch, port, mac, mode),
            "set_port_state",
            || format!("switch={} port={} mac={} mode={}", switch, port, mac, mode),
        )
    }

    pub fn port_capabilities(&self, switch: u16, port: u16) -> HalResult<u32> {
        self.sdk.port_capabilities(switch, port).map_err(|status| {
            HalError::call(
                "port_capabilities",
                format!("switch={} port={}", switch, port),
                status,
            )
        })
    }

    pub fn set_spanning_tree_port_state(
        &self,
        switch: u16,
        stp_instance: i32,
        port: u16,
        state: i32,
    ) -> HalResult<()> {
        check(
            self.sdk
                .set_spanning_tree_port_state(switch, stp_instance, port, state),
            "set_spanning_tree_port_state",
            || format!("switch={} stp={} port={} state={}", switch, stp_instance, port, state),
        )
    }
}

impl std::fmt::Debug for Hal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hal").finish_non_exhaustive()
    }
}
