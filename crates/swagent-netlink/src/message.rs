//! Netlink message framing: header, fixed payload structs and attributes.
//!
//! All fields are native-endian, 4-byte aligned, per the rtnetlink wire
//! format. [`MessageBuilder`] produces complete datagrams; [`MessageIter`]
//! and [`AttrIter`] walk received buffers without copying.

use crate::consts::{NLA_F_NESTED, NLA_F_NET_BYTEORDER};
use crate::error::ProtocolError;
use byteorder::{ByteOrder, NativeEndian};

/// Netlink alignment for headers, payloads and attributes.
const ALIGNTO: usize = 4;

/// Size of `struct nlmsghdr`.
pub const NLMSG_HDRLEN: usize = 16;

/// Size of the attribute header (`struct nlattr`).
const NLA_HDRLEN: usize = 4;

fn align(len: usize) -> usize {
    (len + ALIGNTO - 1) & !(ALIGNTO - 1)
}

/// Parsed `struct nlmsghdr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetlinkHeader {
    pub len: u32,
    pub kind: u16,
    pub flags: u16,
    pub seq: u32,
    pub pid: u32,
}

impl NetlinkHeader {
    /// Reads a header from the front of `buf`.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < NLMSG_HDRLEN {
            return Err(ProtocolError::Truncated);
        }
        Ok(Self {
            len: NativeEndian::read_u32(&buf[0..4]),
            kind: NativeEndian::read_u16(&buf[4..6]),
            flags: NativeEndian::read_u16(&buf[6..8]),
            seq: NativeEndian::read_u32(&buf[8..12]),
            pid: NativeEndian::read_u32(&buf[12..16]),
        })
    }
}

/// `struct ifinfomsg`: the fixed payload of link messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IfInfoMsg {
    pub family: u8,
    pub link_type: u16,
    pub index: i32,
    pub flags: u32,
    pub change: u32,
}

impl IfInfoMsg {
    /// Wire size of the struct.
    pub const SIZE: usize = 16;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = self.family;
        // buf[1] is padding
        NativeEndian::write_u16(&mut buf[2..4], self.link_type);
        NativeEndian::write_i32(&mut buf[4..8], self.index);
        NativeEndian::write_u32(&mut buf[8..12], self.flags);
        NativeEndian::write_u32(&mut buf[12..16], self.change);
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < Self::SIZE {
            return Err(ProtocolError::Truncated);
        }
        Ok(Self {
            family: buf[0],
            link_type: NativeEndian::read_u16(&buf[2..4]),
            index: NativeEndian::read_i32(&buf[4..8]),
            flags: NativeEndian::read_u32(&buf[8..12]),
            change: NativeEndian::read_u32(&buf[12..16]),
        })
    }
}

/// `struct ndmsg`: the fixed payload of neighbor messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NdMsg {
    pub family: u8,
    pub ifindex: i32,
    pub state: u16,
    pub flags: u8,
    pub kind: u8,
}

impl NdMsg {
    /// Wire size of the struct.
    pub const SIZE: usize = 12;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = self.family;
        // bytes 1..4 are padding
        NativeEndian::write_i32(&mut buf[4..8], self.ifindex);
        NativeEndian::write_u16(&mut buf[8..10], self.state);
        buf[10] = self.flags;
        buf[11] = self.kind;
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < Self::SIZE {
            return Err(ProtocolError::Truncated);
        }
        Ok(Self {
            family: buf[0],
            ifindex: NativeEndian::read_i32(&buf[4..8]),
            state: NativeEndian::read_u16(&buf[8..10]),
            flags: buf[10],
            kind: buf[11],
        })
    }
}

/// Incrementally builds one netlink datagram: header, one fixed payload
/// struct, then attributes (optionally nested). The total length is patched
/// in by [`MessageBuilder::finish`].
#[derive(Debug)]
pub struct MessageBuilder {
    buf: Vec<u8>,
}

impl MessageBuilder {
    /// Starts a message of the given type and flags.
    pub fn new(kind: u16, flags: u16) -> Self {
        let mut buf = vec![0u8; NLMSG_HDRLEN];
        NativeEndian::write_u16(&mut buf[4..6], kind);
        NativeEndian::write_u16(&mut buf[6..8], flags);
        Self { buf }
    }

    /// Appends a fixed payload struct, aligning to the attribute boundary.
    pub fn append(&mut self, payload: &[u8]) {
        self.buf.extend_from_slice(payload);
        self.pad();
    }

    /// Appends one attribute with an arbitrary payload.
    pub fn append_attr(&mut self, kind: u16, payload: &[u8]) -> Result<(), ProtocolError> {
        let len = NLA_HDRLEN + payload.len();
        if len > u16::MAX as usize {
            return Err(ProtocolError::AttributeOverflow { len: payload.len() });
        }
        let mut hdr = [0u8; NLA_HDRLEN];
        NativeEndian::write_u16(&mut hdr[0..2], len as u16);
        NativeEndian::write_u16(&mut hdr[2..4], kind);
        self.buf.extend_from_slice(&hdr);
        self.buf.extend_from_slice(payload);
        self.pad();
        Ok(())
    }

    /// Appends a u16 attribute.
    pub fn append_attr_u16(&mut self, kind: u16, value: u16) -> Result<(), ProtocolError> {
        let mut payload = [0u8; 2];
        NativeEndian::write_u16(&mut payload, value);
        self.append_attr(kind, &payload)
    }

    /// Appends a u32 attribute.
    pub fn append_attr_u32(&mut self, kind: u16, value: u32) -> Result<(), ProtocolError> {
        let mut payload = [0u8; 4];
        NativeEndian::write_u32(&mut payload, value);
        self.append_attr(kind, &payload)
    }

    /// Appends a NUL-terminated string attribute.
    pub fn append_attr_str(&mut self, kind: u16, value: &str) -> Result<(), ProtocolError> {
        let mut payload = Vec::with_capacity(value.len() + 1);
        payload.extend_from_slice(value.as_bytes());
        payload.push(0);
        self.append_attr(kind, &payload)
    }

    /// Opens a nested attribute; returns the position to pass to
    /// [`MessageBuilder::nest_end`].
    pub fn nest_start(&mut self, kind: u16) -> usize {
        let start = self.buf.len();
        let mut hdr = [0u8; NLA_HDRLEN];
        NativeEndian::write_u16(&mut hdr[2..4], kind);
        self.buf.extend_from_slice(&hdr);
        start
    }

    /// Closes a nested attribute opened at `start`, patching its length.
    pub fn nest_end(&mut self, start: usize) -> Result<(), ProtocolError> {
        let len = self.buf.len() - start;
        if len > u16::MAX as usize {
            return Err(ProtocolError::AttributeOverflow {
                len: len - NLA_HDRLEN,
            });
        }
        NativeEndian::write_u16(&mut self.buf[start..start + 2], len as u16);
        Ok(())
    }

    /// Patches the total length and returns the finished datagram.
    pub fn finish(mut self) -> Vec<u8> {
        let len = self.buf.len() as u32;
        NativeEndian::write_u32(&mut self.buf[0..4], len);
        self.buf
    }

    fn pad(&mut self) {
        let padded = align(self.buf.len());
        self.buf.resize(padded, 0);
    }
}

/// Walks a received buffer as a sequence of framed netlink records,
/// yielding `(header, payload)` pairs. A record whose declared length is
/// inconsistent with the remaining buffer yields one `Err` and ends the
/// iteration.
#[derive(Debug)]
pub struct MessageIter<'a> {
    buf: &'a [u8],
    failed: bool,
}

impl<'a> MessageIter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, failed: false }
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = Result<(NetlinkHeader, &'a [u8]), ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.buf.len() < NLMSG_HDRLEN {
            return None;
        }
        let header = match NetlinkHeader::from_bytes(self.buf) {
            Ok(header) => header,
            Err(err) => {
                self.failed = true;
                return Some(Err(err));
            }
        };
        let msg_len = header.len as usize;
        if msg_len < NLMSG_HDRLEN || msg_len > self.buf.len() {
            self.failed = true;
            return Some(Err(ProtocolError::Truncated));
        }
        let payload = &self.buf[NLMSG_HDRLEN..msg_len];
        self.buf = &self.buf[align(msg_len).min(self.buf.len())..];
        Some(Ok((header, payload)))
    }
}

/// Walks a buffer of netlink attributes, yielding `(type, payload)` pairs
/// with the nested/byte-order flag bits masked off. Malformed attributes end
/// the iteration.
#[derive(Debug)]
pub struct AttrIter<'a> {
    buf: &'a [u8],
}

impl<'a> AttrIter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.len() < NLA_HDRLEN {
            return None;
        }
        let len = NativeEndian::read_u16(&self.buf[0..2]) as usize;
        let kind = NativeEndian::read_u16(&self.buf[2..4]) & !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);
        if len < NLA_HDRLEN || len > self.buf.len() {
            return None;
        }
        let payload = &self.buf[NLA_HDRLEN..len];
        self.buf = &self.buf[align(len).min(self.buf.len())..];
        Some((kind, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{NLM_F_REQUEST, RTM_GETLINK};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_header_round_trip() {
        let mut builder = MessageBuilder::new(RTM_GETLINK, NLM_F_REQUEST);
        builder.append(&IfInfoMsg::default().to_bytes());
        let bytes = builder.finish();

        let header = NetlinkHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header.len as usize, bytes.len());
        assert_eq!(header.kind, RTM_GETLINK);
        assert_eq!(header.flags, NLM_F_REQUEST);
    }

    #[test]
    fn test_ifinfomsg_round_trip() {
        let ifi = IfInfoMsg {
            family: 7,
            link_type: 1,
            index: 42,
            flags: 0x41,
            change: 0x1,
        };
        assert_eq!(IfInfoMsg::from_bytes(&ifi.to_bytes()).unwrap(), ifi);
    }

    #[test]
    fn test_ndmsg_round_trip() {
        let ndm = NdMsg {
            family: 7,
            ifindex: 9,
            state: 2,
            flags: 0,
            kind: 0,
        };
        assert_eq!(NdMsg::from_bytes(&ndm.to_bytes()).unwrap(), ndm);
    }

    #[test]
    fn test_attr_alignment_and_iteration() {
        let mut builder = MessageBuilder::new(RTM_GETLINK, 0);
        builder.append(&IfInfoMsg::default().to_bytes());
        builder.append_attr_str(3, "sw0p1").unwrap();
        builder.append_attr_u32(29, 2).unwrap();
        let bytes = builder.finish();

        let attrs: Vec<(u16, Vec<u8>)> = AttrIter::new(&bytes[NLMSG_HDRLEN + IfInfoMsg::SIZE..])
            .map(|(kind, payload)| (kind, payload.to_vec()))
            .collect();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].0, 3);
        assert_eq!(attrs[0].1, b"sw0p1\0");
        assert_eq!(attrs[1].0, 29);
        assert_eq!(NativeEndian::read_u32(&attrs[1].1), 2);
    }

    #[test]
    fn test_nested_attr() {
        let mut builder = MessageBuilder::new(RTM_GETLINK, 0);
        builder.append(&IfInfoMsg::default().to_bytes());
        let nest = builder.nest_start(26);
        builder.append_attr_u16(0, 2).unwrap();
        builder.nest_end(nest).unwrap();
        let bytes = builder.finish();

        let (kind, payload) = AttrIter::new(&bytes[NLMSG_HDRLEN + IfInfoMsg::SIZE..])
            .next()
            .unwrap();
        assert_eq!(kind, 26);
        let (inner_kind, inner_payload) = AttrIter::new(payload).next().unwrap();
        assert_eq!(inner_kind, 0);
        assert_eq!(NativeEndian::read_u16(inner_payload), 2);
    }

    #[test]
    fn test_attr_overflow() {
        let mut builder = MessageBuilder::new(RTM_GETLINK, 0);
        let oversized = vec![0u8; u16::MAX as usize];
        let err = builder.append_attr(1, &oversized).unwrap_err();
        assert!(matches!(err, ProtocolError::AttributeOverflow { .. }));
    }

    #[test]
    fn test_message_iter_multiple_records() {
        let mut first = MessageBuilder::new(16, 0);
        first.append(&IfInfoMsg::default().to_bytes());
        let mut second = MessageBuilder::new(3, 0);
        second.append(&[0u8; 4]);

        let mut stream = first.finish();
        stream.extend_from_slice(&second.finish());

        let records: Vec<_> = MessageIter::new(&stream).collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0.kind, 16);
        assert_eq!(records[1].0.kind, 3);
    }

    #[test]
    fn test_message_iter_rejects_bad_length() {
        let mut stream = MessageBuilder::new(16, 0).finish();
        // corrupt the declared length beyond the buffer
        NativeEndian::write_u32(&mut stream[0..4], 1024);
        let mut iter = MessageIter::new(&stream);
        assert!(matches!(iter.next(), Some(Err(ProtocolError::Truncated))));
        assert!(iter.next().is_none());
    }
}
