//! Inbound command operations.
//!
//! The orchestration layer addresses switches by UUID and ports/VLANs by
//! their textual identifiers; this module parses, validates and dispatches.
//! Malformed identifiers fail with a parse error, never a generic one.

use crate::attrs::PortAttribute;
use crate::backend::Backend;
use crate::error::{AgentError, AgentResult, StateError};
use crate::registry::SwitchRegistry;
use std::collections::HashMap;
use swagent_types::{AttributeValue, ParseError, PortIdentifier, VlanId};
use tracing::instrument;
use uuid::Uuid;

/// Presence status of a queried membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VlanStatus {
    /// The membership exists and is active.
    Enabled,
    /// The VLAN or the membership does not exist.
    Absent,
}

/// Reply of [`Agent::get_port_vlan_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortVlanInfoResponse {
    pub vlan_id: u16,
    pub tagged: bool,
    pub status: VlanStatus,
}

/// The switch-configuration agent: registered switches plus their backends.
#[derive(Debug, Default)]
pub struct Agent {
    registry: SwitchRegistry,
    backends: HashMap<u16, Backend>,
}

impl Agent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a discovered switch under its external UUID.
    pub fn register_switch(&mut self, uuid: Uuid, backend: Backend) {
        self.registry.register(uuid, backend.switch_id());
        self.backends.insert(backend.switch_id(), backend);
    }

    fn backend_for(&self, switch_uuid: &str) -> AgentResult<(&Backend, u16)> {
        let uuid = Uuid::parse_str(switch_uuid)
            .map_err(|_| ParseError::InvalidSwitchUuid(switch_uuid.to_string()))?;
        let switch_id = self
            .registry
            .switch_id(&uuid)
            .ok_or(StateError::UnknownSwitch(uuid))?;
        let backend = self
            .backends
            .get(&switch_id)
            .ok_or(StateError::UnknownSwitch(uuid))?;
        Ok((backend, switch_id))
    }

    fn parse_port(switch_id: u16, port_identifier: &str) -> AgentResult<PortIdentifier> {
        let port: PortIdentifier = port_identifier.parse()?;
        if port.switch_id() != switch_id {
            return Err(StateError::WrongSwitch {
                port: port_identifier.to_string(),
                switch: switch_id,
            }
            .into());
        }
        Ok(port)
    }

    /// Adds a port to a VLAN, creating the VLAN on demand. Returns the VLAN
    /// identifier the membership is addressed by from now on.
    #[instrument(skip(self))]
    pub fn add_port_vlan(
        &self,
        switch_uuid: &str,
        port_identifier: &str,
        vlan_id: &str,
        tagged: bool,
    ) -> AgentResult<String> {
        let (backend, switch_id) = self.backend_for(switch_uuid)?;
        let port = Self::parse_port(switch_id, port_identifier)?;
        let vlan: VlanId = vlan_id.parse()?;
        backend.add_vlan_port(vlan, &port, tagged)?;
        Ok(vlan.to_string())
    }

    /// Removes a port from a VLAN.
    #[instrument(skip(self))]
    pub fn delete_port_vlan(
        &self,
        switch_uuid: &str,
        port_identifier: &str,
        vlan_identifier: &str,
    ) -> AgentResult<()> {
        let (backend, switch_id) = self.backend_for(switch_uuid)?;
        let port = Self::parse_port(switch_id, port_identifier)?;
        let vlan: VlanId = vlan_identifier.parse()?;
        backend.remove_vlan_port(vlan, &port)
    }

    /// Queries one membership. A missing VLAN or membership is reported as
    /// an absent status, not an error.
    #[instrument(skip(self))]
    pub fn get_port_vlan_info(
        &self,
        switch_uuid: &str,
        port_identifier: &str,
        vlan_identifier: &str,
    ) -> AgentResult<PortVlanInfoResponse> {
        let (backend, switch_id) = self.backend_for(switch_uuid)?;
        let port = Self::parse_port(switch_id, port_identifier)?;
        let vlan: VlanId = vlan_identifier.parse()?;

        if !backend.vlan_exists(vlan)? {
            return Ok(PortVlanInfoResponse {
                vlan_id: vlan.as_u16(),
                tagged: false,
                status: VlanStatus::Absent,
            });
        }
        match backend.vlan_port_info(vlan, &port) {
            Ok(info) => Ok(PortVlanInfoResponse {
                vlan_id: vlan.as_u16(),
                tagged: info.tagged,
                status: VlanStatus::Enabled,
            }),
            Err(AgentError::State(StateError::PortNotOnVlan { .. })) => Ok(PortVlanInfoResponse {
                vlan_id: vlan.as_u16(),
                tagged: false,
                status: VlanStatus::Absent,
            }),
            Err(err) => Err(err),
        }
    }

    /// Reads a named port attribute.
    #[instrument(skip(self))]
    pub fn get_port_attribute(
        &self,
        switch_uuid: &str,
        port_identifier: &str,
        attribute: &str,
    ) -> AgentResult<AttributeValue> {
        let (backend, switch_id) = self.backend_for(switch_uuid)?;
        let port = Self::parse_port(switch_id, port_identifier)?;
        let attr: PortAttribute = attribute.parse().map_err(AgentError::Capability)?;
        backend.port_attribute(&port, attr)
    }

    /// Writes a named port attribute.
    #[instrument(skip(self, value))]
    pub fn set_port_attribute(
        &self,
        switch_uuid: &str,
        port_identifier: &str,
        attribute: &str,
        value: &AttributeValue,
    ) -> AgentResult<()> {
        let (backend, switch_id) = self.backend_for(switch_uuid)?;
        let port = Self::parse_port(switch_id, port_identifier)?;
        let attr: PortAttribute = attribute.parse().map_err(AgentError::Capability)?;
        backend.set_port_attribute(&port, attr, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendor::VendorBackend;
    use std::sync::Arc;
    use swagent_hal::{Hal, SimSwitchSdk, SwitchInfo};
    use swagent_types::PortType;

    fn test_agent() -> (Agent, Uuid) {
        let sim = Arc::new(SimSwitchSdk::new(8));
        let info = SwitchInfo {
            port_count: 8,
            max_vlans: 4094,
            model: 0x6000,
        };
        let mut port_types = HashMap::new();
        port_types.insert(1u16, PortType::Host);
        let backend = Backend::Vendor(VendorBackend::new(2, Hal::new(sim), port_types, info));

        let uuid = Uuid::new_v4();
        let mut agent = Agent::new();
        agent.register_switch(uuid, backend);
        (agent, uuid)
    }

    #[test]
    fn test_malformed_identifiers_are_parse_errors() {
        let (agent, uuid) = test_agent();
        let uuid_str = uuid.to_string();

        let err = agent
            .add_port_vlan("not-a-uuid", "sw2p1", "100", true)
            .unwrap_err();
        assert!(matches!(err, AgentError::Identifier(_)));

        let err = agent
            .add_port_vlan(&uuid_str, "port7", "100", true)
            .unwrap_err();
        assert!(matches!(err, AgentError::Identifier(_)));

        let err = agent
            .add_port_vlan(&uuid_str, "sw2p1", "vlan100", true)
            .unwrap_err();
        assert!(matches!(err, AgentError::Identifier(_)));
    }

    #[test]
    fn test_unknown_switch() {
        let (agent, _) = test_agent();
        let other = Uuid::new_v4().to_string();
        let err = agent.add_port_vlan(&other, "sw2p1", "100", true).unwrap_err();
        assert!(matches!(
            err,
            AgentError::State(StateError::UnknownSwitch(_))
        ));
    }

    #[test]
    fn test_port_must_belong_to_switch() {
        let (agent, uuid) = test_agent();
        let err = agent
            .add_port_vlan(&uuid.to_string(), "sw3p1", "100", true)
            .unwrap_err();
        assert!(matches!(err, AgentError::State(StateError::WrongSwitch { .. })));
    }

    #[test]
    fn test_add_get_delete_flow() {
        let (agent, uuid) = test_agent();
        let uuid_str = uuid.to_string();

        let vlan_ident = agent.add_port_vlan(&uuid_str, "sw2p5", "100", true).unwrap();
        assert_eq!(vlan_ident, "100");

        let info = agent
            .get_port_vlan_info(&uuid_str, "sw2p5", &vlan_ident)
            .unwrap();
        assert_eq!(info.status, VlanStatus::Enabled);
        assert!(info.tagged);
        assert_eq!(info.vlan_id, 100);

        agent.delete_port_vlan(&uuid_str, "sw2p5", &vlan_ident).unwrap();

        let info = agent
            .get_port_vlan_info(&uuid_str, "sw2p5", &vlan_ident)
            .unwrap();
        assert_eq!(info.status, VlanStatus::Absent);
    }

    #[test]
    fn test_absent_membership_is_status_not_error() {
        let (agent, uuid) = test_agent();
        let uuid_str = uuid.to_string();

        // VLAN 300 exists but port 5 is not a member
        agent.add_port_vlan(&uuid_str, "sw2p3", "300", false).unwrap();
        let info = agent.get_port_vlan_info(&uuid_str, "sw2p5", "300").unwrap();
        assert_eq!(info.status, VlanStatus::Absent);
        assert!(!info.tagged);
    }

    #[test]
    fn test_attribute_round_trip() {
        let (agent, uuid) = test_agent();
        let uuid_str = uuid.to_string();

        let ident = agent
            .get_port_attribute(&uuid_str, "sw2p5", "PortIdentifier")
            .unwrap();
        assert_eq!(ident.as_text(), Some("sw2p5"));

        agent
            .set_port_attribute(&uuid_str, "sw2p5", "FrameSize", &AttributeValue::Number(9000))
            .unwrap();
        let size = agent
            .get_port_attribute(&uuid_str, "sw2p5", "FrameSize")
            .unwrap();
        assert_eq!(size.as_number(), Some(9000));
    }

    #[test]
    fn test_unknown_attribute_name() {
        let (agent, uuid) = test_agent();
        let err = agent
            .get_port_attribute(&uuid.to_string(), "sw2p5", "Bogus")
            .unwrap_err();
        assert!(matches!(
            err,
            AgentError::Capability(crate::error::CapabilityError::Unknown(_))
        ));
    }
}
