//! Route-netlink codec and transport for switch port/VLAN configuration.
//!
//! The newer switch hardware generation is driven through the kernel: the
//! switch driver exposes one interface per front-panel port (named
//! `sw<switch>p<port>`) and port/VLAN configuration is plain rtnetlink.
//! This crate owns the byte layout of the fixed message set the agent uses
//! and the blocking route socket that carries it:
//!
//! - [`message`]: netlink framing (header, fixed payload structs,
//!   attribute encoding/iteration)
//! - [`link`]: link state query/set and the driver-private port attribute
//!   channel
//! - [`vlan`]: bridge VLAN membership add/delete and the bridge VLAN dump
//! - [`neighbor`]: bridge neighbor-table queries for host-facing ports
//! - [`socket`]: the [`RouteSocket`] transport
//! - [`resolver`]: interface name/index resolution seam
//!
//! Builders produce complete datagrams; parsers work on framed records, so
//! both sides are testable without a live socket.

pub mod consts;
pub mod link;
pub mod message;
pub mod neighbor;
pub mod resolver;
pub mod socket;
pub mod vlan;

mod error;

pub use error::{NetlinkError, ProtocolError, TransportError};
pub use message::{AttrIter, IfInfoMsg, MessageBuilder, MessageIter, NdMsg, NetlinkHeader};
pub use resolver::{IfaceResolver, StaticResolver, SysResolver};
pub use socket::RouteSocket;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, NetlinkError>;
