//! Link state messages and the driver-private port attribute channel.

use crate::consts::{
    AF_UNSPEC, ARPHRD_ETHER, IFF_RUNNING, IFF_UP, IFLA_IFNAME, IFLA_SWPORT_ATTRS, NLM_F_ACK,
    NLM_F_REPLACE, NLM_F_REQUEST, RTM_GETLINK, RTM_SETLINK,
};
use crate::error::ProtocolError;
use crate::message::{IfInfoMsg, MessageBuilder};
use byteorder::{ByteOrder, NativeEndian};
use swagent_types::{LinkState, PortIdentifier};

/// Builds a link query (`desired` absent) or a link set message.
///
/// The set form marks only the administrative-up bit as changing; the up
/// state also raises the running bit so the driver starts the MAC.
pub fn build_link_message(
    port: &PortIdentifier,
    desired: Option<LinkState>,
) -> Result<Vec<u8>, ProtocolError> {
    let (kind, flags) = match desired {
        None => (RTM_GETLINK, NLM_F_REQUEST),
        Some(_) => (RTM_SETLINK, NLM_F_REPLACE | NLM_F_REQUEST | NLM_F_ACK),
    };

    let mut ifi = IfInfoMsg {
        family: AF_UNSPEC,
        ..IfInfoMsg::default()
    };
    if let Some(state) = desired {
        ifi.link_type = ARPHRD_ETHER;
        ifi.change = IFF_UP;
        if state == LinkState::Up {
            ifi.flags = IFF_UP | IFF_RUNNING;
        }
    }

    let mut builder = MessageBuilder::new(kind, flags);
    builder.append(&ifi.to_bytes());
    builder.append_attr_str(IFLA_IFNAME, &port.to_string())?;
    Ok(builder.finish())
}

/// Decodes a link reply payload into `(link_state, operational_state)`.
pub fn parse_link_reply(payload: &[u8]) -> Result<(LinkState, LinkState), ProtocolError> {
    let ifi = IfInfoMsg::from_bytes(payload)?;
    let link = if ifi.flags & IFF_UP != 0 {
        LinkState::Up
    } else {
        LinkState::Down
    };
    let oper = if ifi.flags & IFF_RUNNING != 0 {
        LinkState::Up
    } else {
        LinkState::Down
    };
    Ok((link, oper))
}

/// Builds a set-link message carrying one driver-private port attribute
/// (`IFLA_SWPORT_ATTRS` nest). The attribute payload pairs the 64-bit value
/// with an attribute index of -1 (whole-port scope).
pub fn build_port_attr_message(
    port: &PortIdentifier,
    attr_id: u16,
    value: u64,
) -> Result<Vec<u8>, ProtocolError> {
    let mut builder = MessageBuilder::new(RTM_SETLINK, NLM_F_REPLACE | NLM_F_REQUEST | NLM_F_ACK);
    builder.append(&IfInfoMsg::default().to_bytes());
    builder.append_attr_str(IFLA_IFNAME, &port.to_string())?;

    let nest = builder.nest_start(IFLA_SWPORT_ATTRS);
    let mut payload = [0u8; 16];
    NativeEndian::write_u64(&mut payload[0..8], value);
    NativeEndian::write_i64(&mut payload[8..16], -1);
    builder.append_attr(attr_id, &payload)?;
    builder.nest_end(nest)?;

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SWPORT_ATTR_MAX_FRAME_SIZE;
    use crate::message::{AttrIter, NetlinkHeader, NLMSG_HDRLEN};
    use pretty_assertions::assert_eq;

    fn attrs_of(bytes: &[u8]) -> Vec<(u16, Vec<u8>)> {
        AttrIter::new(&bytes[NLMSG_HDRLEN + IfInfoMsg::SIZE..])
            .map(|(kind, payload)| (kind, payload.to_vec()))
            .collect()
    }

    #[test]
    fn test_query_message_layout() {
        let port = PortIdentifier::new(0, 1);
        let bytes = build_link_message(&port, None).unwrap();

        let header = NetlinkHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header.kind, RTM_GETLINK);
        assert_eq!(header.flags, NLM_F_REQUEST);

        let ifi = IfInfoMsg::from_bytes(&bytes[NLMSG_HDRLEN..]).unwrap();
        assert_eq!(ifi.flags, 0);
        assert_eq!(ifi.change, 0);

        let attrs = attrs_of(&bytes);
        assert_eq!(attrs, vec![(IFLA_IFNAME, b"sw0p1\0".to_vec())]);
    }

    #[test]
    fn test_set_up_message_layout() {
        let port = PortIdentifier::new(3, 12);
        let bytes = build_link_message(&port, Some(LinkState::Up)).unwrap();

        let header = NetlinkHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header.kind, RTM_SETLINK);
        assert_eq!(header.flags, NLM_F_REPLACE | NLM_F_REQUEST | NLM_F_ACK);

        let ifi = IfInfoMsg::from_bytes(&bytes[NLMSG_HDRLEN..]).unwrap();
        assert_eq!(ifi.link_type, ARPHRD_ETHER);
        assert_eq!(ifi.flags, IFF_UP | IFF_RUNNING);
        assert_eq!(ifi.change, IFF_UP);

        let attrs = attrs_of(&bytes);
        assert_eq!(attrs, vec![(IFLA_IFNAME, b"sw3p12\0".to_vec())]);
    }

    #[test]
    fn test_set_down_clears_up_bit() {
        let port = PortIdentifier::new(0, 1);
        let bytes = build_link_message(&port, Some(LinkState::Down)).unwrap();
        let ifi = IfInfoMsg::from_bytes(&bytes[NLMSG_HDRLEN..]).unwrap();
        assert_eq!(ifi.flags, 0);
        assert_eq!(ifi.change, IFF_UP);
    }

    #[test]
    fn test_link_state_encode_decode() {
        // synthetic reply with both up and running set
        let reply = IfInfoMsg {
            flags: IFF_UP | IFF_RUNNING,
            ..IfInfoMsg::default()
        };
        assert_eq!(
            parse_link_reply(&reply.to_bytes()).unwrap(),
            (LinkState::Up, LinkState::Up)
        );

        // running cleared: administratively up, operationally down
        let reply = IfInfoMsg {
            flags: IFF_UP,
            ..IfInfoMsg::default()
        };
        assert_eq!(
            parse_link_reply(&reply.to_bytes()).unwrap(),
            (LinkState::Up, LinkState::Down)
        );
    }

    #[test]
    fn test_parse_link_reply_truncated() {
        assert!(matches!(
            parse_link_reply(&[0u8; 4]),
            Err(ProtocolError::Truncated)
        ));
    }

    #[test]
    fn test_port_attr_message_layout() {
        let port = PortIdentifier::new(0, 2);
        let bytes = build_port_attr_message(&port, SWPORT_ATTR_MAX_FRAME_SIZE, 9000).unwrap();

        let attrs = attrs_of(&bytes);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0], (IFLA_IFNAME, b"sw0p2\0".to_vec()));

        let (nest_kind, nest_payload) = (&attrs[1].0, &attrs[1].1);
        assert_eq!(*nest_kind, IFLA_SWPORT_ATTRS);
        let (attr_kind, attr_payload) = AttrIter::new(nest_payload).next().unwrap();
        assert_eq!(attr_kind, SWPORT_ATTR_MAX_FRAME_SIZE);
        assert_eq!(attr_payload.len(), 16);
        assert_eq!(NativeEndian::read_u64(&attr_payload[0..8]), 9000);
        assert_eq!(NativeEndian::read_i64(&attr_payload[8..16]), -1);
    }
}
