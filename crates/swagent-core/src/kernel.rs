//! The kernel-protocol switch backend.
//!
//! The switch driver exposes every front-panel port as a kernel interface
//! named after its identifier, so configuration is route-netlink plus the
//! standard host-side interface property paths. Each operation opens its own
//! socket and owns it for the call's duration.

use crate::error::{AgentResult, StateError};
use crate::ethtool::Ethtool;
use crate::sysfs::SysFs;
use crate::vlan::VlanPortStatus;
use std::collections::HashMap;
use std::sync::Arc;
use swagent_netlink::link::build_link_message;
use swagent_netlink::neighbor::{build_neighbor_query_for_port, parse_neighbor_record};
use swagent_netlink::vlan::{
    build_vlan_dump_request, build_vlan_membership_for_port, build_vlan_pvid_message,
    resolve_port_ifindex, VlanDump,
};
use swagent_netlink::{IfaceResolver, NetlinkError, RouteSocket, SysResolver};
use swagent_types::{LinkState, MacAddress, PortIdentifier, PortType, VlanId};

/// Switch backend driven through route-netlink and the host-side interface
/// property paths.
#[derive(Clone)]
pub struct KernelBackend {
    switch_id: u16,
    port_types: HashMap<u16, PortType>,
    resolver: Arc<dyn IfaceResolver>,
}

impl KernelBackend {
    /// Creates a backend resolving interfaces through the OS.
    pub fn new(switch_id: u16, port_types: HashMap<u16, PortType>) -> Self {
        Self::with_resolver(switch_id, port_types, Arc::new(SysResolver))
    }

    /// Creates a backend with an explicit resolver (simulated runs, tests).
    pub fn with_resolver(
        switch_id: u16,
        port_types: HashMap<u16, PortType>,
        resolver: Arc<dyn IfaceResolver>,
    ) -> Self {
        Self {
            switch_id,
            port_types,
            resolver,
        }
    }

    pub fn switch_id(&self) -> u16 {
        self.switch_id
    }

    pub(crate) fn port_type(&self, port_index: u16) -> PortType {
        self.port_types
            .get(&port_index)
            .copied()
            .unwrap_or_default()
    }

    /// Index 0 is the reserved management port and never exposed.
    pub(crate) fn check_port_present(&self, port: &PortIdentifier) -> AgentResult<()> {
        if port.port_index() == 0 {
            return Err(StateError::PortNotPresent {
                switch: self.switch_id,
                port: 0,
            }
            .into());
        }
        Ok(())
    }

    /// Runs the broadcast bridge VLAN dump and collects the per-port tables.
    fn dump(&self) -> AgentResult<VlanDump> {
        let socket = RouteSocket::connect()?;
        let request = build_vlan_dump_request()?;
        let mut dump = VlanDump::new();
        let resolver = &*self.resolver;
        socket.send_and_drain(&request, |header, payload| {
            dump.ingest(header, payload, resolver)
                .map_err(NetlinkError::Protocol)
        })?;
        Ok(dump)
    }

    // ---- port attribute operations ----

    pub(crate) fn speed(&self, port: &PortIdentifier) -> AgentResult<u64> {
        let ethtool = Ethtool::open(&port.to_string())?;
        // ethtool reports Mb/s
        Ok(u64::from(ethtool.speed_mbps()? / 1000))
    }

    pub(crate) fn set_speed(&self, port: &PortIdentifier, gbps: u64) -> AgentResult<()> {
        let ethtool = Ethtool::open(&port.to_string())?;
        ethtool.set_speed_mbps((gbps as u32) * 1000)?;
        Ok(())
    }

    pub(crate) fn link_states(&self, port: &PortIdentifier) -> AgentResult<(LinkState, LinkState)> {
        let socket = RouteSocket::connect()?;
        socket.send(&build_link_message(port, None)?)?;
        Ok(socket.receive_link_state()?)
    }

    pub(crate) fn set_link_state(&self, port: &PortIdentifier, state: LinkState) -> AgentResult<()> {
        if state == LinkState::Unknown {
            return Err(StateError::InvalidLinkState(state).into());
        }
        let socket = RouteSocket::connect()?;
        socket.send(&build_link_message(port, Some(state))?)?;
        Ok(())
    }

    pub(crate) fn frame_size(&self, port: &PortIdentifier) -> AgentResult<u64> {
        Ok(u64::from(SysFs::new(&port.to_string()).max_frame_size()?))
    }

    pub(crate) fn set_frame_size(&self, port: &PortIdentifier, size: u64) -> AgentResult<()> {
        self.set_swport_attr(port, swagent_netlink::consts::SWPORT_ATTR_MAX_FRAME_SIZE, size)
    }

    pub(crate) fn autoneg(&self, port: &PortIdentifier) -> AgentResult<bool> {
        Ok(SysFs::new(&port.to_string()).autoneg()?)
    }

    pub(crate) fn set_autoneg(&self, port: &PortIdentifier, enable: bool) -> AgentResult<()> {
        self.set_swport_attr(
            port,
            swagent_netlink::consts::SWPORT_ATTR_AUTONEG,
            u64::from(enable),
        )
    }

    /// Writes one driver-private attribute through the switch-port attribute
    /// channel.
    fn set_swport_attr(&self, port: &PortIdentifier, attr_id: u16, value: u64) -> AgentResult<()> {
        let socket = RouteSocket::connect()?;
        socket.send(&swagent_netlink::link::build_port_attr_message(
            port, attr_id, value,
        )?)?;
        Ok(())
    }

    /// Learned MAC address of the attached node, from the bridge neighbor
    /// table.
    pub(crate) fn mac_address(&self, port: &PortIdentifier) -> AgentResult<String> {
        let (request, ifindex) = build_neighbor_query_for_port(&*self.resolver, port)?;
        let socket = RouteSocket::connect()?;
        let mut found: Option<MacAddress> = None;
        socket.send_and_drain(&request, |header, payload| {
            if found.is_none() {
                if let Some(mac) = parse_neighbor_record(header, payload, ifindex)? {
                    found = Some(mac);
                }
            }
            Ok(())
        })?;
        Ok(found.map(|mac| mac.to_string()).unwrap_or_default())
    }

    pub(crate) fn vlan_list(&self, port: &PortIdentifier) -> AgentResult<Vec<String>> {
        let dump = self.dump()?;
        Ok(dump
            .entries(port)
            .unwrap_or_default()
            .iter()
            .map(|entry| entry.vlan_id.to_string())
            .collect())
    }

    // ---- VLAN membership primitives ----
    //
    // Membership is the only kernel-side VLAN state: a VLAN "exists" while
    // some interface lists it, so creating and deleting the VLAN object
    // itself have no kernel operation.

    pub(crate) fn vlan_exists(&self, vlan: VlanId) -> AgentResult<bool> {
        Ok(self.dump()?.vlan_seen(vlan))
    }

    pub(crate) fn ensure_vlan(&self, vlan: VlanId) -> AgentResult<bool> {
        Ok(!self.vlan_exists(vlan)?)
    }

    pub(crate) fn delete_vlan(&self, _vlan: VlanId) -> AgentResult<()> {
        Ok(())
    }

    pub(crate) fn vlan_port_status(
        &self,
        vlan: VlanId,
        port: &PortIdentifier,
    ) -> AgentResult<VlanPortStatus> {
        let dump = self.dump()?;
        let status = dump
            .entries(port)
            .unwrap_or_default()
            .iter()
            .find(|entry| entry.vlan_id == vlan.as_u16())
            .map(|entry| VlanPortStatus {
                member: true,
                tagged: entry.tagged,
                pvid: entry.pvid,
            })
            .unwrap_or_default();
        Ok(status)
    }

    pub(crate) fn add_membership(
        &self,
        vlan: VlanId,
        port: &PortIdentifier,
        tagged: bool,
    ) -> AgentResult<()> {
        let request =
            build_vlan_membership_for_port(&*self.resolver, port, vlan, tagged, true)?;
        let socket = RouteSocket::connect()?;
        socket.send_ack(&request)?;
        Ok(())
    }

    pub(crate) fn delete_membership(&self, vlan: VlanId, port: &PortIdentifier) -> AgentResult<()> {
        let request =
            build_vlan_membership_for_port(&*self.resolver, port, vlan, true, false)?;
        let socket = RouteSocket::connect()?;
        socket.send(&request)?;
        Ok(())
    }

    pub(crate) fn default_vlan_of(&self, port: &PortIdentifier) -> AgentResult<u16> {
        let dump = self.dump()?;
        Ok(dump
            .entries(port)
            .unwrap_or_default()
            .iter()
            .find(|entry| entry.pvid)
            .map(|entry| entry.vlan_id)
            .unwrap_or(VlanId::DEFAULT.as_u16()))
    }

    /// Re-adds the membership with the PVID flag, moving the port's default
    /// VLAN in one bridge operation.
    pub(crate) fn set_default_vlan(
        &self,
        port: &PortIdentifier,
        vlan: VlanId,
        tagged: bool,
    ) -> AgentResult<()> {
        let ifindex = resolve_port_ifindex(&*self.resolver, port)?;
        let request = build_vlan_pvid_message(ifindex, vlan, tagged)?;
        let socket = RouteSocket::connect()?;
        socket.send_ack(&request)?;
        Ok(())
    }

    /// Untagged ingress acceptance follows the PVID flag on this generation;
    /// there is no separate register.
    pub(crate) fn allow_untagged_ingress(&self, _port: &PortIdentifier) -> AgentResult<()> {
        Ok(())
    }

    /// Makes VLAN 1 the PVID again (untagged), the kernel expression of
    /// reverting the port's default VLAN.
    pub(crate) fn reset_default_vlan(&self, port: &PortIdentifier) -> AgentResult<()> {
        let ifindex = resolve_port_ifindex(&*self.resolver, port)?;
        let request = build_vlan_pvid_message(ifindex, VlanId::DEFAULT, false)?;
        let socket = RouteSocket::connect()?;
        socket.send_ack(&request)?;
        Ok(())
    }

    /// See [`KernelBackend::allow_untagged_ingress`].
    pub(crate) fn drop_untagged_ingress(&self, _port: &PortIdentifier) -> AgentResult<()> {
        Ok(())
    }

    pub(crate) fn member_count(&self, vlan: VlanId) -> AgentResult<usize> {
        Ok(self.dump()?.member_count(vlan))
    }

    pub(crate) fn membership_tagging(
        &self,
        vlan: VlanId,
        port: &PortIdentifier,
    ) -> AgentResult<Option<bool>> {
        Ok(self.dump()?.tagging(port, vlan))
    }
}

impl std::fmt::Debug for KernelBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelBackend")
            .field("switch_id", &self.switch_id)
            .finish_non_exhaustive()
    }
}
