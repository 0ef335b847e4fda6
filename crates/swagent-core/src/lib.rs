//! Core of the rack switch configuration agent.
//!
//! Two switch hardware generations hide behind one interface here:
//!
//! - the vendor generation, configured through register-level SDK calls
//!   ([`VendorBackend`] over [`swagent_hal`])
//! - the kernel generation, configured through route-netlink messages to the
//!   switch driver ([`KernelBackend`] over [`swagent_netlink`])
//!
//! [`Backend`] is the closed set of the two, selected once at process start.
//! On top of it sit the uniform port attribute operations ([`PortAttribute`]),
//! the VLAN membership state machine with its rollback logic, the
//! vendor-backend bootstrap sequence and the inbound command operations of
//! the orchestration layer ([`Agent`]).
//!
//! Everything is synchronous: each operation blocks on its own socket or SDK
//! call, and callers serialize operations against the same switch.

mod agent;
mod attrs;
mod backend;
mod bootstrap;
mod error;
mod ethtool;
mod kernel;
mod registry;
mod sysfs;
mod vendor;
mod vlan;

pub use agent::{Agent, PortVlanInfoResponse, VlanStatus};
pub use attrs::{PortAttribute, MAX_FRAME_SIZE};
pub use backend::Backend;
pub use bootstrap::{AutonegMode, InterfaceMode, PortConfig, SwitchBootConfig, VlanPortConfig};
pub use error::{AgentError, AgentResult, CapabilityError, StateError};
pub use kernel::KernelBackend;
pub use registry::SwitchRegistry;
pub use vendor::VendorBackend;
pub use vlan::{VlanPortInfo, VlanPortStatus};
