//! Route-netlink protocol constants used by this agent.
//!
//! Only the subset this agent speaks is defined here. The `SWPORT_*` ids are
//! driver-private attributes exported by the switch driver of the NOS kernel
//! image; they are not part of the mainline uapi headers.

/// Message types.
pub const RTM_NEWLINK: u16 = 16;
pub const RTM_DELLINK: u16 = 17;
pub const RTM_GETLINK: u16 = 18;
pub const RTM_SETLINK: u16 = 19;
pub const RTM_NEWNEIGH: u16 = 28;
pub const RTM_GETNEIGH: u16 = 30;

/// Control message types.
pub const NLMSG_NOOP: u16 = 1;
pub const NLMSG_ERROR: u16 = 2;
pub const NLMSG_DONE: u16 = 3;

/// Message flags.
pub const NLM_F_REQUEST: u16 = 0x01;
pub const NLM_F_ACK: u16 = 0x04;
pub const NLM_F_REPLACE: u16 = 0x100;
/// `NLM_F_ROOT | NLM_F_MATCH`.
pub const NLM_F_DUMP: u16 = 0x300;
pub const NLM_F_DUMP_INTR: u16 = 0x10;

/// Address families.
pub const AF_UNSPEC: u8 = 0;
pub const AF_BRIDGE: u8 = 7;

/// Hardware type for Ethernet interfaces.
pub const ARPHRD_ETHER: u16 = 1;

/// Interface flags.
pub const IFF_UP: u32 = 0x1;
pub const IFF_RUNNING: u32 = 0x40;

/// Link attributes.
pub const IFLA_IFNAME: u16 = 3;
pub const IFLA_AF_SPEC: u16 = 26;
pub const IFLA_EXT_MASK: u16 = 29;
/// Driver-private switch-port attribute nest.
pub const IFLA_SWPORT_ATTRS: u16 = 38;

/// Attributes nested inside `IFLA_AF_SPEC` for the bridge family.
pub const IFLA_BRIDGE_FLAGS: u16 = 0;
pub const IFLA_BRIDGE_VLAN_INFO: u16 = 2;

/// Apply the bridge operation to the port itself, not its master.
pub const BRIDGE_FLAGS_SELF: u16 = 2;

/// `bridge_vlan_info` flags.
pub const BRIDGE_VLAN_INFO_PVID: u16 = 2;
pub const BRIDGE_VLAN_INFO_UNTAGGED: u16 = 4;

/// Extended dump filter: include the bridge VLAN table.
pub const RTEXT_FILTER_BRVLAN: u32 = 2;

/// Neighbor attributes.
pub const NDA_LLADDR: u16 = 2;

/// Attribute type flag bits masked off when iterating.
pub const NLA_F_NESTED: u16 = 0x8000;
pub const NLA_F_NET_BYTEORDER: u16 = 0x4000;

/// Driver-private switch-port attribute ids inside `IFLA_SWPORT_ATTRS`.
pub const SWPORT_ATTR_AUTONEG: u16 = 24;
pub const SWPORT_ATTR_MAX_FRAME_SIZE: u16 = 52;
