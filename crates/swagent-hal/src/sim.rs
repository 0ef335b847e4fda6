//! In-memory switch model implementing [`SwitchSdk`].
//!
//! Used by the test suite and by daemon runs without hardware attached
//! (`swagentd --simulate`). The model tracks VLAN membership, per-port and
//! per-VLAN attribute registers and administrative port modes, and supports
//! injecting failures for specific calls so partial-failure paths can be
//! exercised.

use crate::sdk::{flag, port_attr, port_mode, port_state, speed_cap, SwitchInfo, SwitchSdk};
use crate::status::SdkStatus;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// A failure rule: the named call fails with `status` whenever the optional
/// port/attribute filters match.
#[derive(Debug, Clone)]
pub struct FailRule {
    pub call: &'static str,
    pub port: Option<u16>,
    pub attr: Option<i32>,
    pub status: SdkStatus,
}

#[derive(Debug, Default)]
struct SimState {
    initialized: bool,
    switch_up: bool,
    /// vlan -> member port -> tagged
    vlans: BTreeMap<u16, BTreeMap<u16, bool>>,
    vlan_attrs: HashMap<(u16, i32), u64>,
    port_attrs: HashMap<(u16, i32), u64>,
    port_modes: HashMap<u16, i32>,
    switch_attrs: HashMap<i32, u64>,
    stp_states: HashMap<u16, i32>,
    capabilities: HashMap<u16, u32>,
    fail_rules: Vec<FailRule>,
}

/// In-memory single-switch model. The `switch` argument of the SDK calls is
/// accepted and ignored; one instance models one switch.
#[derive(Debug)]
pub struct SimSwitchSdk {
    port_count: u16,
    state: Mutex<SimState>,
}

const DEFAULT_CAPABILITIES: u32 = speed_cap::GBPS_1 | speed_cap::GBPS_10 | speed_cap::GBPS_40;

impl SimSwitchSdk {
    /// Creates a model with `port_count` front-panel ports (indexes
    /// `1..=port_count`; port 0 is the reserved management port).
    pub fn new(port_count: u16) -> Self {
        Self {
            port_count,
            state: Mutex::new(SimState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        // A panic while holding the lock can only come from a failed test;
        // the state itself is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a failure rule.
    pub fn inject_failure(&self, rule: FailRule) {
        self.state().fail_rules.push(rule);
    }

    /// Shorthand: fail every invocation of `call`.
    pub fn fail_call(&self, call: &'static str, status: SdkStatus) {
        self.inject_failure(FailRule {
            call,
            port: None,
            attr: None,
            status,
        });
    }

    /// Removes all failure rules.
    pub fn clear_failures(&self) {
        self.state().fail_rules.clear();
    }

    /// Overrides the speed capability bitmask of a port.
    pub fn set_capabilities(&self, port: u16, mask: u32) {
        self.state().capabilities.insert(port, mask);
    }

    /// Test hook: does the VLAN currently exist in the model?
    pub fn vlan_exists(&self, vlan: u16) -> bool {
        self.state().vlans.contains_key(&vlan)
    }

    /// Test hook: current members of a VLAN.
    pub fn members(&self, vlan: u16) -> Vec<u16> {
        self.state()
            .vlans
            .get(&vlan)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Test hook: raw value of a port attribute register, if ever written.
    pub fn raw_port_attribute(&self, port: u16, attr: i32) -> Option<u64> {
        self.state().port_attrs.get(&(port, attr)).copied()
    }

    fn fail_for(
        state: &SimState,
        call: &'static str,
        port: Option<u16>,
        attr: Option<i32>,
    ) -> Option<SdkStatus> {
        state
            .fail_rules
            .iter()
            .find(|rule| {
                rule.call == call
                    && rule.port.map_or(true, |p| Some(p) == port)
                    && rule.attr.map_or(true, |a| Some(a) == attr)
            })
            .map(|rule| rule.status)
    }

    fn check_port(&self, port: u16) -> SdkStatus {
        if port == 0 || port > self.port_count {
            SdkStatus::InvalidPort
        } else {
            SdkStatus::Ok
        }
    }

    fn default_port_attr(attr: i32) -> u64 {
        match attr {
            port_attr::SPEED => 10,
            port_attr::DEF_VLAN => 1,
            port_attr::DROP_UNTAGGED => flag::DISABLED,
            port_attr::MAX_FRAME_SIZE => 9000,
            port_attr::AUTONEG => 0,
            port_attr::ETH_IFACE_MODE => crate::sdk::eth_mode::SGMII,
            _ => 0,
        }
    }
}

impl SwitchSdk for SimSwitchSdk {
    fn initialize(&self) -> SdkStatus {
        let mut state = self.state();
        if let Some(status) = Self::fail_for(&state, "initialize", None, None) {
            return status;
        }
        state.initialized = true;
        SdkStatus::Ok
    }

    fn wait_switch_ready(&self, _timeout: Duration) -> SdkStatus {
        let state = self.state();
        if let Some(status) = Self::fail_for(&state, "wait_switch_ready", None, None) {
            return status;
        }
        if state.initialized {
            SdkStatus::Ok
        } else {
            SdkStatus::Uninitialized
        }
    }

    fn set_switch_state(&self, _switch: u16, up: bool) -> SdkStatus {
        let mut state = self.state();
        if let Some(status) = Self::fail_for(&state, "set_switch_state", None, None) {
            return status;
        }
        state.switch_up = up;
        SdkStatus::Ok
    }

    fn switch_info(&self, _switch: u16) -> Result<SwitchInfo, SdkStatus> {
        let state = self.state();
        if let Some(status) = Self::fail_for(&state, "switch_info", None, None) {
            return Err(status);
        }
        Ok(SwitchInfo {
            port_count: self.port_count,
            max_vlans: 4094,
            model: 0x6000,
        })
    }

    fn set_switch_attribute(&self, _switch: u16, attr: i32, value: u64) -> SdkStatus {
        let mut state = self.state();
        if let Some(status) = Self::fail_for(&state, "set_switch_attribute", None, Some(attr)) {
            return status;
        }
        state.switch_attrs.insert(attr, value);
        SdkStatus::Ok
    }

    fn create_vlan(&self, _switch: u16, vlan: u16) -> SdkStatus {
        let mut state = self.state();
        if let Some(status) = Self::fail_for(&state, "create_vlan", None, None) {
            return status;
        }
        if state.vlans.contains_key(&vlan) {
            return SdkStatus::VlanAlreadyExists;
        }
        state.vlans.insert(vlan, BTreeMap::new());
        SdkStatus::Ok
    }

    fn delete_vlan(&self, _switch: u16, vlan: u16) -> SdkStatus {
        let mut state = self.state();
        if let Some(status) = Self::fail_for(&state, "delete_vlan", None, None) {
            return status;
        }
        if state.vlans.remove(&vlan).is_none() {
            return SdkStatus::InvalidVlan;
        }
        SdkStatus::Ok
    }

    fn vlan_list(&self, _switch: u16) -> Result<Vec<u16>, SdkStatus> {
        let state = self.state();
        if let Some(status) = Self::fail_for(&state, "vlan_list", None, None) {
            return Err(status);
        }
        Ok(state.vlans.keys().copied().collect())
    }

    fn add_vlan_port(&self, _switch: u16, vlan: u16, port: u16, tagged: bool) -> SdkStatus {
        let mut state = self.state();
        if let Some(status) = Self::fail_for(&state, "add_vlan_port", Some(port), None) {
            return status;
        }
        let port_check = self.check_port(port);
        if !port_check.is_ok() {
            return port_check;
        }
        match state.vlans.get_mut(&vlan) {
            Some(members) => {
                members.insert(port, tagged);
                SdkStatus::Ok
            }
            None => SdkStatus::InvalidVlan,
        }
    }

    fn delete_vlan_port(&self, _switch: u16, vlan: u16, port: u16) -> SdkStatus {
        let mut state = self.state();
        if let Some(status) = Self::fail_for(&state, "delete_vlan_port", Some(port), None) {
            return status;
        }
        match state.vlans.get_mut(&vlan) {
            Some(members) => {
                if members.remove(&port).is_none() {
                    SdkStatus::InvalidPort
                } else {
                    SdkStatus::Ok
                }
            }
            None => SdkStatus::InvalidVlan,
        }
    }

    fn vlan_ports(&self, _switch: u16, vlan: u16) -> Result<Vec<u16>, SdkStatus> {
        let state = self.state();
        if let Some(status) = Self::fail_for(&state, "vlan_ports", None, None) {
            return Err(status);
        }
        match state.vlans.get(&vlan) {
            Some(members) => Ok(members.keys().copied().collect()),
            None => Err(SdkStatus::InvalidVlan),
        }
    }

    fn vlan_port_tag(&self, _switch: u16, vlan: u16, port: u16) -> Result<bool, SdkStatus> {
        let state = self.state();
        if let Some(status) = Self::fail_for(&state, "vlan_port_tag", Some(port), None) {
            return Err(status);
        }
        match state.vlans.get(&vlan) {
            Some(members) => members.get(&port).copied().ok_or(SdkStatus::InvalidPort),
            None => Err(SdkStatus::InvalidVlan),
        }
    }

    fn set_vlan_attribute(&self, _switch: u16, vlan: u16, attr: i32, value: u64) -> SdkStatus {
        let mut state = self.state();
        if let Some(status) = Self::fail_for(&state, "set_vlan_attribute", None, Some(attr)) {
            return status;
        }
        if !state.vlans.contains_key(&vlan) {
            return SdkStatus::InvalidVlan;
        }
        state.vlan_attrs.insert((vlan, attr), value);
        SdkStatus::Ok
    }

    fn set_vlan_port_state(&self, _switch: u16, vlan: u16, port: u16, state_val: i32) -> SdkStatus {
        let mut state = self.state();
        if let Some(status) = Self::fail_for(&state, "set_vlan_port_state", Some(port), None) {
            return status;
        }
        if !state.vlans.contains_key(&vlan) {
            return SdkStatus::InvalidVlan;
        }
        state.stp_states.insert(port, state_val);
        SdkStatus::Ok
    }

    fn port_attribute(&self, _switch: u16, port: u16, attr: i32) -> Result<u64, SdkStatus> {
        let state = self.state();
        if let Some(status) = Self::fail_for(&state, "port_attribute", Some(port), Some(attr)) {
            return Err(status);
        }
        let port_check = self.check_port(port);
        if !port_check.is_ok() {
            return Err(port_check);
        }
        Ok(state
            .port_attrs
            .get(&(port, attr))
            .copied()
            .unwrap_or_else(|| Self::default_port_attr(attr)))
    }

    fn set_port_attribute(&self, _switch: u16, port: u16, attr: i32, value: u64) -> SdkStatus {
        let mut state = self.state();
        if let Some(status) = Self::fail_for(&state, "set_port_attribute", Some(port), Some(attr)) {
            return status;
        }
        let port_check = self.check_port(port);
        if !port_check.is_ok() {
            return port_check;
        }
        state.port_attrs.insert((port, attr), value);
        SdkStatus::Ok
    }

    fn set_port_attribute_v2(
        &self,
        switch: u16,
        port: u16,
        _mac: i32,
        _lane: i32,
        attr: i32,
        value: u64,
    ) -> SdkStatus {
        let status = {
            let state = self.state();
            Self::fail_for(&state, "set_port_attribute_v2", Some(port), Some(attr))
        };
        if let Some(status) = status {
            return status;
        }
        self.set_port_attribute(switch, port, attr, value)
    }

    fn port_state(&self, _switch: u16, port: u16, _mac: i32) -> Result<(i32, i32), SdkStatus> {
        let state = self.state();
        if let Some(status) = Self::fail_for(&state, "port_state", Some(port), None) {
            return Err(status);
        }
        let port_check = self.check_port(port);
        if !port_check.is_ok() {
            return Err(port_check);
        }
        let mode = state.port_modes.get(&port).copied().unwrap_or(port_mode::ADMIN_DOWN);
        let oper = if mode == port_mode::UP {
            port_state::UP
        } else {
            port_state::ADMIN_DOWN
        };
        Ok((mode, oper))
    }

    fn set_port_state(&self, _switch: u16, port: u16, _mac: i32, mode: i32) -> SdkStatus {
        let mut state = self.state();
        if let Some(status) = Self::fail_for(&state, "set_port_state", Some(port), None) {
            return status;
        }
        let port_check = self.check_port(port);
        if !port_check.is_ok() {
            return port_check;
        }
        state.port_modes.insert(port, mode);
        SdkStatus::Ok
    }

    fn port_capabilities(&self, _switch: u16, port: u16) -> Result<u32, SdkStatus> {
        let state = self.state();
        if let Some(status) = Self::fail_for(&state, "port_capabilities", Some(port), None) {
            return Err(status);
        }
        let port_check = self.check_port(port);
        if !port_check.is_ok() {
            return Err(port_check);
        }
        Ok(state
            .capabilities
            .get(&port)
            .copied()
            .unwrap_or(DEFAULT_CAPABILITIES))
    }

    fn set_spanning_tree_port_state(
        &self,
        _switch: u16,
        _stp_instance: i32,
        port: u16,
        state_val: i32,
    ) -> SdkStatus {
        let mut state = self.state();
        if let Some(status) = Self::fail_for(&state, "set_spanning_tree_port_state", Some(port), None)
        {
            return status;
        }
        let port_check = self.check_port(port);
        if !port_check.is_ok() {
            return port_check;
        }
        state.stp_states.insert(port, state_val);
        SdkStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::Hal;
    use std::sync::Arc;

    #[test]
    fn test_vlan_lifecycle() {
        let sim = SimSwitchSdk::new(48);
        assert_eq!(sim.create_vlan(0, 100), SdkStatus::Ok);
        assert_eq!(sim.create_vlan(0, 100), SdkStatus::VlanAlreadyExists);
        assert_eq!(sim.add_vlan_port(0, 100, 3, true), SdkStatus::Ok);
        assert_eq!(sim.vlan_port_tag(0, 100, 3), Ok(true));
        assert_eq!(sim.vlan_port_tag(0, 100, 4), Err(SdkStatus::InvalidPort));
        assert_eq!(sim.delete_vlan_port(0, 100, 3), SdkStatus::Ok);
        assert_eq!(sim.delete_vlan(0, 100), SdkStatus::Ok);
        assert!(!sim.vlan_exists(100));
    }

    #[test]
    fn test_port_range_checks() {
        let sim = SimSwitchSdk::new(4);
        assert_eq!(sim.set_port_state(0, 0, 0, port_mode::UP), SdkStatus::InvalidPort);
        assert_eq!(sim.set_port_state(0, 5, 0, port_mode::UP), SdkStatus::InvalidPort);
        assert_eq!(sim.set_port_state(0, 4, 0, port_mode::UP), SdkStatus::Ok);
    }

    #[test]
    fn test_failure_injection() {
        let sim = SimSwitchSdk::new(8);
        sim.create_vlan(0, 10);
        sim.inject_failure(FailRule {
            call: "add_vlan_port",
            port: Some(2),
            attr: None,
            status: SdkStatus::Failure,
        });
        assert_eq!(sim.add_vlan_port(0, 10, 2, false), SdkStatus::Failure);
        assert_eq!(sim.add_vlan_port(0, 10, 3, false), SdkStatus::Ok);
        sim.clear_failures();
        assert_eq!(sim.add_vlan_port(0, 10, 2, false), SdkStatus::Ok);
    }

    #[test]
    fn test_hal_wrapper_context() {
        let sim = Arc::new(SimSwitchSdk::new(8));
        let hal = Hal::new(sim.clone());

        assert!(hal.create_vlan(1, 20).unwrap());
        assert!(!hal.create_vlan(1, 20).unwrap());

        sim.fail_call("delete_vlan", SdkStatus::Failure);
        let err = hal.delete_vlan(1, 20).unwrap_err();
        assert!(err.to_string().contains("delete_vlan"));
        assert!(err.to_string().contains("vlan=20"));
    }

    #[test]
    fn test_default_registers() {
        let sim = SimSwitchSdk::new(8);
        assert_eq!(sim.port_attribute(0, 1, port_attr::DEF_VLAN), Ok(1));
        assert_eq!(sim.port_attribute(0, 1, port_attr::DROP_UNTAGGED), Ok(flag::DISABLED));
    }
}
