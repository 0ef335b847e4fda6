//! Agent-level error taxonomy.
//!
//! Six kinds, matching what the command layer needs to map to wire
//! responses: identifier parse, transport, protocol, capability, hardware
//! call and state errors. Everything propagates to the immediate caller; the
//! only non-propagating branches are the documented rollback/cleanup paths
//! of the VLAN state machine and the per-port bootstrap continuation.

use crate::attrs::PortAttribute;
use swagent_hal::HalError;
use swagent_netlink::{NetlinkError, ProtocolError, TransportError};
use swagent_types::{LinkState, ParseError};
use thiserror::Error;
use uuid::Uuid;

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// An attribute exists in the recognized set but cannot serve the request,
/// or is not in the set at all. The three cases stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("unsupported port attribute: {0}")]
    Unsupported(PortAttribute),

    #[error("read-only port attribute: {0}")]
    ReadOnly(PortAttribute),

    #[error("unknown port attribute: {0}")]
    Unknown(String),
}

/// The operation violates a membership/PVID invariant or asks for a
/// transition the port cannot make.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("cannot add port to vlan: switch={switch} vlan={vlan} port={port}")]
    CannotAddPort { switch: u16, vlan: u16, port: u16 },

    #[error("port not found on vlan: switch={switch} vlan={vlan} port={port}")]
    PortNotOnVlan { switch: u16, vlan: u16, port: u16 },

    #[error("cannot delete port from vlan: switch={switch} vlan={vlan} port={port}")]
    CannotDeletePort { switch: u16, vlan: u16, port: u16 },

    #[error("port {port} is not present on switch {switch}")]
    PortNotPresent { switch: u16, port: u16 },

    #[error("link state '{0}' cannot be applied")]
    InvalidLinkState(LinkState),

    #[error("max frame size {0} out of range 0..={}", crate::attrs::MAX_FRAME_SIZE)]
    FrameSizeOutOfRange(u64),

    #[error("speed {speed} Gb/s not in port capability set {mask:#x}")]
    SpeedNotSupported { speed: u64, mask: u32 },

    #[error("speed cannot be set while the port signaling mode is {mode} (SGMII required)")]
    WrongSignalingMode { mode: u64 },

    #[error("attribute {attr} expects a {expected} value, got {got}")]
    InvalidValue {
        attr: PortAttribute,
        expected: &'static str,
        got: &'static str,
    },

    #[error("unknown switch {0}")]
    UnknownSwitch(Uuid),

    #[error("port identifier '{port}' does not belong to switch {switch}")]
    WrongSwitch { port: String, switch: u16 },
}

/// Umbrella error of the agent core.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Identifier(#[from] ParseError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    Hardware(#[from] HalError),

    #[error(transparent)]
    State(#[from] StateError),
}

impl From<NetlinkError> for AgentError {
    fn from(err: NetlinkError) -> Self {
        match err {
            NetlinkError::Transport(err) => AgentError::Transport(err),
            NetlinkError::Protocol(err) => AgentError::Protocol(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_error_messages() {
        let err = StateError::CannotAddPort {
            switch: 1,
            vlan: 100,
            port: 5,
        };
        assert_eq!(err.to_string(), "cannot add port to vlan: switch=1 vlan=100 port=5");

        let err = StateError::FrameSizeOutOfRange(20000);
        assert!(err.to_string().contains("15864"));
    }

    #[test]
    fn test_capability_kinds_distinct() {
        let unsupported = CapabilityError::Unsupported(PortAttribute::Status);
        let unknown = CapabilityError::Unknown("Status2".to_string());
        assert_ne!(unsupported.to_string(), unknown.to_string());
    }

    #[test]
    fn test_netlink_error_mapping() {
        let err: AgentError = NetlinkError::Protocol(ProtocolError::Truncated).into();
        assert!(matches!(err, AgentError::Protocol(ProtocolError::Truncated)));
    }
}
