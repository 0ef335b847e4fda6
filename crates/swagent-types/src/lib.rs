//! Common strong types for the rack switch configuration agent.
//!
//! This crate provides type-safe representations of the primitives shared by
//! the codec, the transport and the hardware backends:
//!
//! - [`PortIdentifier`]: the `sw<switch>p<port>` textual port address
//! - [`VlanId`]: IEEE 802.1Q VLAN identifiers (1-4094)
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses
//! - [`LinkState`]: administrative/operational link state
//! - [`PortType`]: network-facing vs. host-facing ports
//! - [`AttributeValue`]: the payload union for generic port attribute access

mod attr;
mod mac;
mod port;
mod vlan;

pub use attr::AttributeValue;
pub use mac::MacAddress;
pub use port::{LinkState, PortIdentifier, PortType};
pub use vlan::VlanId;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid port identifier: '{0}' (expected sw<switch>p<port>)")]
    InvalidPortIdentifier(String),

    #[error("invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(String),

    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid link state: {0}")]
    InvalidLinkState(String),

    #[error("invalid switch UUID: {0}")]
    InvalidSwitchUuid(String),
}
