//! The closed set of switch backends and the uniform port attribute
//! dispatch.

use crate::attrs::{PortAttribute, MAX_FRAME_SIZE};
use crate::error::{AgentResult, CapabilityError, StateError};
use crate::kernel::KernelBackend;
use crate::vendor::VendorBackend;
use swagent_types::{AttributeValue, LinkState, PortIdentifier, PortType};
use tracing::debug;

/// One of the two supported switch hardware generations, selected once at
/// process start. Every operation dispatches on the variant; the choice is
/// static for the life of the process.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Register-level vendor SDK generation.
    Vendor(VendorBackend),
    /// Kernel route-netlink generation.
    Kernel(KernelBackend),
}

fn require_number(attr: PortAttribute, value: &AttributeValue) -> AgentResult<u64> {
    value.as_number().ok_or_else(|| {
        StateError::InvalidValue {
            attr,
            expected: "number",
            got: value.kind(),
        }
        .into()
    })
}

fn require_flag(attr: PortAttribute, value: &AttributeValue) -> AgentResult<bool> {
    value.as_flag().ok_or_else(|| {
        StateError::InvalidValue {
            attr,
            expected: "flag",
            got: value.kind(),
        }
        .into()
    })
}

fn require_link_state(attr: PortAttribute, value: &AttributeValue) -> AgentResult<LinkState> {
    let text = value.as_text().ok_or(StateError::InvalidValue {
        attr,
        expected: "text",
        got: value.kind(),
    })?;
    Ok(text.parse::<LinkState>()?)
}

impl Backend {
    pub fn switch_id(&self) -> u16 {
        match self {
            Backend::Vendor(backend) => backend.switch_id(),
            Backend::Kernel(backend) => backend.switch_id(),
        }
    }

    pub fn port_type(&self, port_index: u16) -> PortType {
        match self {
            Backend::Vendor(backend) => backend.port_type(port_index),
            Backend::Kernel(backend) => backend.port_type(port_index),
        }
    }

    fn check_port_present(&self, port: &PortIdentifier) -> AgentResult<()> {
        match self {
            Backend::Vendor(backend) => backend.check_port_present(port),
            Backend::Kernel(backend) => backend.check_port_present(port),
        }
    }

    /// Reads one named port attribute.
    pub fn port_attribute(
        &self,
        port: &PortIdentifier,
        attr: PortAttribute,
    ) -> AgentResult<AttributeValue> {
        self.check_port_present(port)?;
        let host_facing = self.port_type(port.port_index()).is_host_facing();

        match attr {
            PortAttribute::LinkSpeedGbps => {
                let gbps = match self {
                    Backend::Vendor(backend) => backend.speed(port)?,
                    Backend::Kernel(backend) => backend.speed(port)?,
                };
                Ok(AttributeValue::Number(gbps))
            }
            PortAttribute::LinkState => {
                let (link, _) = self.link_states(port)?;
                Ok(AttributeValue::Text(link.as_str().to_string()))
            }
            PortAttribute::OperationalState => {
                let (_, oper) = self.link_states(port)?;
                Ok(AttributeValue::Text(oper.as_str().to_string()))
            }
            PortAttribute::PortIdentifier => Ok(AttributeValue::Text(port.to_string())),
            PortAttribute::FrameSize => {
                let size = match self {
                    Backend::Vendor(backend) => backend.frame_size(port)?,
                    Backend::Kernel(backend) => backend.frame_size(port)?,
                };
                Ok(AttributeValue::Number(size))
            }
            PortAttribute::Autosense => {
                // host-facing ports never autonegotiate
                if host_facing {
                    return Ok(AttributeValue::Flag(false));
                }
                let enabled = match self {
                    Backend::Vendor(backend) => backend.autoneg(port)?,
                    Backend::Kernel(backend) => backend.autoneg(port)?,
                };
                Ok(AttributeValue::Flag(enabled))
            }
            PortAttribute::VlanList => {
                let list = match self {
                    Backend::Vendor(backend) => backend.vlan_list(port)?,
                    Backend::Kernel(backend) => backend.vlan_list(port)?,
                };
                Ok(AttributeValue::List(list))
            }
            PortAttribute::MacAddress => {
                // learned addresses exist only behind host-facing ports
                if !host_facing {
                    return Ok(AttributeValue::Text(String::new()));
                }
                let mac = match self {
                    // no neighbor-table path on this generation
                    Backend::Vendor(_) => String::new(),
                    Backend::Kernel(backend) => backend.mac_address(port)?,
                };
                Ok(AttributeValue::Text(mac))
            }
            PortAttribute::Status
            | PortAttribute::PortType
            | PortAttribute::LinkTechnology
            | PortAttribute::MaxSpeedGbps
            | PortAttribute::PortWidth
            | PortAttribute::IsManagementPort
            | PortAttribute::LastErrorCode
            | PortAttribute::ErrorCleared
            | PortAttribute::LastStateChangeTime
            | PortAttribute::Ipv4Address
            | PortAttribute::Ipv6Address
            | PortAttribute::NeighborInfo
            | PortAttribute::VlanEnable => Err(CapabilityError::Unsupported(attr).into()),
        }
    }

    /// Writes one named port attribute.
    pub fn set_port_attribute(
        &self,
        port: &PortIdentifier,
        attr: PortAttribute,
        value: &AttributeValue,
    ) -> AgentResult<()> {
        self.check_port_present(port)?;
        let host_facing = self.port_type(port.port_index()).is_host_facing();

        match attr {
            PortAttribute::LinkSpeedGbps => {
                let gbps = require_number(attr, value)?;
                if host_facing {
                    // speed is fixed by the host link; silently keep it
                    debug!(%port, "skipping speed set on host-facing port");
                    return Ok(());
                }
                match self {
                    Backend::Vendor(backend) => backend.set_speed(port, gbps),
                    Backend::Kernel(backend) => backend.set_speed(port, gbps),
                }
            }
            PortAttribute::LinkState => {
                let state = require_link_state(attr, value)?;
                if state == LinkState::Unknown {
                    return Err(StateError::InvalidLinkState(state).into());
                }
                match self {
                    Backend::Vendor(backend) => backend.set_link_state(port, state),
                    Backend::Kernel(backend) => backend.set_link_state(port, state),
                }
            }
            PortAttribute::FrameSize => {
                let size = require_number(attr, value)?;
                if size > MAX_FRAME_SIZE {
                    return Err(StateError::FrameSizeOutOfRange(size).into());
                }
                match self {
                    Backend::Vendor(backend) => backend.set_frame_size(port, size),
                    Backend::Kernel(backend) => backend.set_frame_size(port, size),
                }
            }
            PortAttribute::Autosense => {
                let enable = require_flag(attr, value)?;
                match self {
                    Backend::Vendor(backend) => backend.set_autoneg(port, enable),
                    Backend::Kernel(backend) => backend.set_autoneg(port, enable),
                }
            }
            PortAttribute::OperationalState | PortAttribute::PortIdentifier => {
                Err(CapabilityError::ReadOnly(attr).into())
            }
            PortAttribute::VlanList
            | PortAttribute::MacAddress
            | PortAttribute::Status
            | PortAttribute::PortType
            | PortAttribute::LinkTechnology
            | PortAttribute::MaxSpeedGbps
            | PortAttribute::PortWidth
            | PortAttribute::IsManagementPort
            | PortAttribute::LastErrorCode
            | PortAttribute::ErrorCleared
            | PortAttribute::LastStateChangeTime
            | PortAttribute::Ipv4Address
            | PortAttribute::Ipv6Address
            | PortAttribute::NeighborInfo
            | PortAttribute::VlanEnable => Err(CapabilityError::Unsupported(attr).into()),
        }
    }

    fn link_states(&self, port: &PortIdentifier) -> AgentResult<(LinkState, LinkState)> {
        match self {
            Backend::Vendor(backend) => backend.link_states(port),
            Backend::Kernel(backend) => backend.link_states(port),
        }
    }
}
