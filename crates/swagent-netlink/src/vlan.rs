//! Bridge VLAN membership messages and the bridge VLAN dump.

use crate::consts::{
    AF_BRIDGE, BRIDGE_FLAGS_SELF, BRIDGE_VLAN_INFO_PVID, BRIDGE_VLAN_INFO_UNTAGGED, IFLA_AF_SPEC,
    IFLA_BRIDGE_FLAGS, IFLA_BRIDGE_VLAN_INFO, IFLA_EXT_MASK, NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST,
    RTEXT_FILTER_BRVLAN, RTM_DELLINK, RTM_GETLINK, RTM_NEWLINK, RTM_SETLINK,
};
use crate::error::ProtocolError;
use crate::message::{AttrIter, IfInfoMsg, MessageBuilder, NetlinkHeader};
use crate::resolver::IfaceResolver;
use byteorder::{ByteOrder, NativeEndian};
use std::collections::HashMap;
use swagent_types::{PortIdentifier, VlanId};

/// One VLAN of a port, as reported by the bridge VLAN dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortVlanEntry {
    pub vlan_id: u16,
    pub tagged: bool,
    pub pvid: bool,
}

fn build_membership(
    kind: u16,
    msg_flags: u16,
    ifindex: u32,
    vlan: VlanId,
    vlan_flags: u16,
) -> Result<Vec<u8>, ProtocolError> {
    let ifi = IfInfoMsg {
        family: AF_BRIDGE,
        index: ifindex as i32,
        ..IfInfoMsg::default()
    };

    let mut builder = MessageBuilder::new(kind, msg_flags);
    builder.append(&ifi.to_bytes());

    let nest = builder.nest_start(IFLA_AF_SPEC);
    builder.append_attr_u16(IFLA_BRIDGE_FLAGS, BRIDGE_FLAGS_SELF)?;
    // struct bridge_vlan_info { u16 flags; u16 vid; }
    let mut info = [0u8; 4];
    NativeEndian::write_u16(&mut info[0..2], vlan_flags);
    NativeEndian::write_u16(&mut info[2..4], vlan.as_u16());
    builder.append_attr(IFLA_BRIDGE_VLAN_INFO, &info)?;
    builder.nest_end(nest)?;

    Ok(builder.finish())
}

/// Builds a bridge VLAN membership add (`add = true`) or delete message for
/// the interface at `ifindex`. Untagged membership sets the untagged flag;
/// everything else is identical between the two forms except the message
/// type.
pub fn build_vlan_membership_message(
    ifindex: u32,
    vlan: VlanId,
    tagged: bool,
    add: bool,
) -> Result<Vec<u8>, ProtocolError> {
    let vlan_flags = if tagged { 0 } else { BRIDGE_VLAN_INFO_UNTAGGED };
    if add {
        build_membership(RTM_SETLINK, NLM_F_REQUEST | NLM_F_ACK, ifindex, vlan, vlan_flags)
    } else {
        build_membership(RTM_DELLINK, 0, ifindex, vlan, vlan_flags)
    }
}

/// Builds a membership add that also marks the VLAN as the port's PVID,
/// moving the port's default VLAN in the same operation.
pub fn build_vlan_pvid_message(
    ifindex: u32,
    vlan: VlanId,
    tagged: bool,
) -> Result<Vec<u8>, ProtocolError> {
    let mut vlan_flags = BRIDGE_VLAN_INFO_PVID;
    if !tagged {
        vlan_flags |= BRIDGE_VLAN_INFO_UNTAGGED;
    }
    build_membership(RTM_SETLINK, NLM_F_REQUEST | NLM_F_ACK, ifindex, vlan, vlan_flags)
}

/// Resolves the port's interface and builds the membership message for it.
pub fn build_vlan_membership_for_port(
    resolver: &dyn IfaceResolver,
    port: &PortIdentifier,
    vlan: VlanId,
    tagged: bool,
    add: bool,
) -> Result<Vec<u8>, ProtocolError> {
    let ifindex = resolve_port_ifindex(resolver, port)?;
    build_vlan_membership_message(ifindex, vlan, tagged, add)
}

/// Resolves a port identifier to its kernel interface index.
pub fn resolve_port_ifindex(
    resolver: &dyn IfaceResolver,
    port: &PortIdentifier,
) -> Result<u32, ProtocolError> {
    let name = port.to_string();
    resolver
        .index_of(&name)
        .ok_or(ProtocolError::UnresolvableName { name })
}

/// Builds the broadcast bridge VLAN dump request: one query-all-links
/// message asking for the extended bridge VLAN table, no target interface.
pub fn build_vlan_dump_request() -> Result<Vec<u8>, ProtocolError> {
    let ifi = IfInfoMsg {
        family: AF_BRIDGE,
        ..IfInfoMsg::default()
    };
    let mut builder = MessageBuilder::new(RTM_GETLINK, NLM_F_REQUEST | NLM_F_DUMP);
    builder.append(&ifi.to_bytes());
    builder.append_attr_u32(IFLA_EXT_MASK, RTEXT_FILTER_BRVLAN)?;
    Ok(builder.finish())
}

/// Parses one record of the bridge VLAN dump reply.
///
/// Only new-link records of bridge family carrying a VLAN table produce an
/// entry list; everything else yields `None`. The record's interface index
/// must resolve back to a name: an index the kernel just reported becoming
/// unresolvable is a protocol failure, not a skippable record.
pub fn parse_vlan_dump_record(
    header: &NetlinkHeader,
    payload: &[u8],
    resolver: &dyn IfaceResolver,
) -> Result<Option<(String, Vec<PortVlanEntry>)>, ProtocolError> {
    if header.kind != RTM_NEWLINK {
        return Ok(None);
    }
    let ifi = IfInfoMsg::from_bytes(payload)?;
    if ifi.family != AF_BRIDGE {
        return Ok(None);
    }

    let af_spec = AttrIter::new(&payload[IfInfoMsg::SIZE..])
        .find(|(kind, _)| *kind == IFLA_AF_SPEC)
        .map(|(_, payload)| payload);
    let af_spec = match af_spec {
        // no AF_SPEC: the interface carries no VLAN table
        None => return Ok(None),
        Some(payload) => payload,
    };

    let index = ifi.index as u32;
    let name = resolver
        .name_of(index)
        .ok_or(ProtocolError::UnresolvableIndex { index })?;

    let mut entries = Vec::new();
    for (kind, info) in AttrIter::new(af_spec) {
        if kind != IFLA_BRIDGE_VLAN_INFO || info.len() < 4 {
            continue;
        }
        let flags = NativeEndian::read_u16(&info[0..2]);
        let vid = NativeEndian::read_u16(&info[2..4]);
        entries.push(PortVlanEntry {
            vlan_id: vid,
            tagged: flags & BRIDGE_VLAN_INFO_UNTAGGED == 0,
            pvid: flags & BRIDGE_VLAN_INFO_PVID != 0,
        });
    }
    Ok(Some((name, entries)))
}

/// Accumulated result of a bridge VLAN dump: per-interface VLAN tables.
#[derive(Debug, Default)]
pub struct VlanDump {
    by_port: HashMap<String, Vec<PortVlanEntry>>,
}

impl VlanDump {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one dump record into the table.
    pub fn ingest(
        &mut self,
        header: &NetlinkHeader,
        payload: &[u8],
        resolver: &dyn IfaceResolver,
    ) -> Result<(), ProtocolError> {
        if let Some((name, entries)) = parse_vlan_dump_record(header, payload, resolver)? {
            self.by_port.insert(name, entries);
        }
        Ok(())
    }

    /// VLAN entries of one port, if the dump saw it.
    pub fn entries(&self, port: &PortIdentifier) -> Option<&[PortVlanEntry]> {
        self.by_port.get(&port.to_string()).map(Vec::as_slice)
    }

    /// Looks up the tagging flag of one (port, VLAN) membership.
    pub fn tagging(&self, port: &PortIdentifier, vlan: VlanId) -> Option<bool> {
        self.entries(port)?
            .iter()
            .find(|entry| entry.vlan_id == vlan.as_u16())
            .map(|entry| entry.tagged)
    }

    /// True if any interface lists the VLAN.
    pub fn vlan_seen(&self, vlan: VlanId) -> bool {
        self.by_port
            .values()
            .any(|entries| entries.iter().any(|e| e.vlan_id == vlan.as_u16()))
    }

    /// Number of interfaces that list the VLAN.
    pub fn member_count(&self, vlan: VlanId) -> usize {
        self.by_port
            .values()
            .filter(|entries| entries.iter().any(|e| e.vlan_id == vlan.as_u16()))
            .count()
    }
}
