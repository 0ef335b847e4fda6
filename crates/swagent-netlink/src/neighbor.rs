//! Bridge neighbor-table queries.
//!
//! Host-facing ports learn the attached node's MAC address into the bridge
//! neighbor table; this is the only way the agent can report it.

use crate::consts::{AF_BRIDGE, NDA_LLADDR, NLM_F_DUMP, NLM_F_REQUEST, RTM_GETNEIGH, RTM_NEWNEIGH};
use crate::error::ProtocolError;
use crate::message::{AttrIter, NdMsg, MessageBuilder, NetlinkHeader};
use crate::resolver::IfaceResolver;
use swagent_types::{MacAddress, PortIdentifier};

/// Builds a neighbor-table dump filtered to the interface at `ifindex`.
pub fn build_neighbor_query(ifindex: u32) -> Result<Vec<u8>, ProtocolError> {
    let ndm = NdMsg {
        family: AF_BRIDGE,
        ifindex: ifindex as i32,
        ..NdMsg::default()
    };
    let mut builder = MessageBuilder::new(RTM_GETNEIGH, NLM_F_DUMP | NLM_F_REQUEST);
    builder.append(&ndm.to_bytes());
    Ok(builder.finish())
}

/// Resolves the port's interface and builds the neighbor query for it.
/// Returns the message and the index replies must match.
pub fn build_neighbor_query_for_port(
    resolver: &dyn IfaceResolver,
    port: &PortIdentifier,
) -> Result<(Vec<u8>, u32), ProtocolError> {
    let name = port.to_string();
    let ifindex = resolver
        .index_of(&name)
        .ok_or(ProtocolError::UnresolvableName { name })?;
    Ok((build_neighbor_query(ifindex)?, ifindex))
}

/// Extracts the link-layer address from one neighbor dump record.
///
/// Records that are not new-neighbor, not bridge family, or belong to a
/// different interface yield `None` and the stream continues.
pub fn parse_neighbor_record(
    header: &NetlinkHeader,
    payload: &[u8],
    expected_ifindex: u32,
) -> Result<Option<MacAddress>, ProtocolError> {
    if header.kind != RTM_NEWNEIGH {
        return Ok(None);
    }
    let ndm = NdMsg::from_bytes(payload)?;
    if ndm.family != AF_BRIDGE || ndm.ifindex != expected_ifindex as i32 {
        return Ok(None);
    }

    for (kind, attr) in AttrIter::new(&payload[NdMsg::SIZE..]) {
        if kind == NDA_LLADDR && attr.len() >= 6 {
            let mut bytes = [0u8; 6];
            bytes.copy_from_slice(&attr[..6]);
            return Ok(Some(MacAddress::new(bytes)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::NLMSG_HDRLEN;
    use crate::resolver::StaticResolver;
    use pretty_assertions::assert_eq;

    fn neighbor_record(kind: u16, family: u8, ifindex: i32, lladdr: Option<[u8; 6]>) -> Vec<u8> {
        let ndm = NdMsg {
            family,
            ifindex,
            ..NdMsg::default()
        };
        let mut builder = MessageBuilder::new(kind, 0);
        builder.append(&ndm.to_bytes());
        if let Some(addr) = lladdr {
            builder.append_attr(NDA_LLADDR, &addr).unwrap();
        }
        builder.finish()
    }

    fn split(bytes: &[u8]) -> (NetlinkHeader, &[u8]) {
        let header = NetlinkHeader::from_bytes(bytes).unwrap();
        (header, &bytes[NLMSG_HDRLEN..])
    }

    #[test]
    fn test_query_layout() {
        let bytes = build_neighbor_query(5).unwrap();
        let header = NetlinkHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header.kind, RTM_GETNEIGH);
        assert_eq!(header.flags, NLM_F_DUMP | NLM_F_REQUEST);

        let ndm = NdMsg::from_bytes(&bytes[NLMSG_HDRLEN..]).unwrap();
        assert_eq!(ndm.family, AF_BRIDGE);
        assert_eq!(ndm.ifindex, 5);
    }

    #[test]
    fn test_query_requires_resolvable_port() {
        let resolver = StaticResolver::new();
        let err = build_neighbor_query_for_port(&resolver, &PortIdentifier::new(1, 2)).unwrap_err();
        assert!(matches!(err, ProtocolError::UnresolvableName { .. }));
    }

    #[test]
    fn test_parse_extracts_address() {
        let record = neighbor_record(
            RTM_NEWNEIGH,
            AF_BRIDGE,
            5,
            Some([0xaa, 0xbb, 0xcc, 0x01, 0x02, 0x03]),
        );
        let (header, payload) = split(&record);
        let mac = parse_neighbor_record(&header, payload, 5).unwrap().unwrap();
        assert_eq!(mac.to_string(), "AA:BB:CC:01:02:03");
    }

    #[test]
    fn test_parse_skips_other_interface() {
        let record = neighbor_record(RTM_NEWNEIGH, AF_BRIDGE, 6, Some([0; 6]));
        let (header, payload) = split(&record);
        assert_eq!(parse_neighbor_record(&header, payload, 5).unwrap(), None);
    }

    #[test]
    fn test_parse_skips_other_family() {
        let record = neighbor_record(RTM_NEWNEIGH, 2 /* AF_INET */, 5, Some([0; 6]));
        let (header, payload) = split(&record);
        assert_eq!(parse_neighbor_record(&header, payload, 5).unwrap(), None);
    }

    #[test]
    fn test_parse_skips_other_message_types() {
        let record = neighbor_record(RTM_GETNEIGH, AF_BRIDGE, 5, Some([0; 6]));
        let (header, payload) = split(&record);
        assert_eq!(parse_neighbor_record(&header, payload, 5).unwrap(), None);
    }

    #[test]
    fn test_parse_no_lladdr() {
        let record = neighbor_record(RTM_NEWNEIGH, AF_BRIDGE, 5, None);
        let (header, payload) = split(&record);
        assert_eq!(parse_neighbor_record(&header, payload, 5).unwrap(), None);
    }
}
