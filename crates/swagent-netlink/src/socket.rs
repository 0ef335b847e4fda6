//! Blocking route-netlink socket transport.
//!
//! One [`RouteSocket`] is opened per operation and owned for the call's
//! duration. The raw descriptor is released by `Drop`, so every exit path,
//! including errors and caller timeouts, gives the handle back. A caller
//! that abandons a call must discard the socket rather than retry on it.

use crate::consts::{NLMSG_DONE, NLMSG_ERROR, NLMSG_NOOP, NLM_F_DUMP_INTR};
use crate::error::{NetlinkError, ProtocolError, TransportError};
use crate::link::parse_link_reply;
use crate::message::{MessageIter, NetlinkHeader};
use byteorder::{ByteOrder, NativeEndian};
use nix::errno::Errno;
use nix::sys::socket::{
    bind, connect, recv, send, setsockopt, socket, sockopt, AddressFamily, MsgFlags, NetlinkAddr,
    SockFlag, SockProtocol, SockType,
};
use nix::sys::time::TimeVal;
use std::os::unix::io::RawFd;
use std::time::Duration;
use swagent_types::LinkState;
use tracing::{debug, warn};

/// Buffer for single-reply reads.
const REPLY_BUFFER_SIZE: usize = 4096;

/// Buffer for multi-record dump reads.
const DUMP_BUFFER_SIZE: usize = 32768;

/// An open, connected `NETLINK_ROUTE` socket.
#[derive(Debug)]
pub struct RouteSocket {
    fd: RawFd,
}

impl RouteSocket {
    /// Opens, binds and connects a route-netlink socket.
    pub fn connect() -> Result<Self, TransportError> {
        let fd = socket(
            AddressFamily::Netlink,
            SockType::Raw,
            SockFlag::empty(),
            Some(SockProtocol::NetlinkRoute),
        )
        .map_err(TransportError::Allocate)?;

        // Owned from here on: Drop closes the descriptor on error returns.
        let sock = Self { fd };

        let local = NetlinkAddr::new(0, 0);
        bind(sock.fd, &local).map_err(TransportError::Bind)?;
        let kernel = NetlinkAddr::new(0, 0);
        connect(sock.fd, &kernel).map_err(TransportError::Connect)?;
        Ok(sock)
    }

    /// Applies a receive timeout to the blocking reads.
    pub fn set_receive_timeout(&self, timeout: Duration) -> Result<(), TransportError> {
        let tv = TimeVal::new(
            timeout.as_secs() as libc::time_t,
            timeout.subsec_micros() as libc::suseconds_t,
        );
        setsockopt(self.fd, sockopt::ReceiveTimeout, &tv).map_err(TransportError::Receive)
    }

    /// Writes one complete datagram.
    pub fn send(&self, msg: &[u8]) -> Result<(), TransportError> {
        let written = send(self.fd, msg, MsgFlags::empty()).map_err(TransportError::Send)?;
        if written != msg.len() {
            return Err(TransportError::Send(Errno::EMSGSIZE));
        }
        Ok(())
    }

    /// Blocks for one link reply and decodes its interface flags.
    ///
    /// Reads datagrams until one carries a well-framed record; an
    /// error-typed or malformed record is fatal for this call.
    pub fn receive_link_state(&self) -> Result<(LinkState, LinkState), NetlinkError> {
        let mut buf = vec![0u8; REPLY_BUFFER_SIZE];
        loop {
            let received = match recv(self.fd, &mut buf, MsgFlags::empty()) {
                Ok(0) => return Err(ProtocolError::UnexpectedEof.into()),
                Ok(received) => received,
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(TransportError::Receive(errno).into()),
            };

            for record in MessageIter::new(&buf[..received]) {
                let (header, payload) = record.map_err(NetlinkError::Protocol)?;
                match header.kind {
                    NLMSG_ERROR => return Err(decode_error_record(payload).into()),
                    NLMSG_DONE | NLMSG_NOOP => continue,
                    _ => return Ok(parse_link_reply(payload)?),
                }
            }
        }
    }

    /// Drains a multi-record reply, handing every data record to
    /// `on_record`, until the stream terminator.
    ///
    /// Interrupted reads retry transparently; a zero-length read is an
    /// end-of-stream error because this protocol terminates streams
    /// explicitly; a truncated datagram is logged and skipped.
    pub fn receive_stream<F>(&self, mut on_record: F) -> Result<(), NetlinkError>
    where
        F: FnMut(&NetlinkHeader, &[u8]) -> Result<(), NetlinkError>,
    {
        let mut buf = vec![0u8; DUMP_BUFFER_SIZE];
        loop {
            let received = match recv(self.fd, &mut buf, MsgFlags::MSG_TRUNC) {
                Ok(0) => return Err(ProtocolError::UnexpectedEof.into()),
                Ok(received) => received,
                Err(Errno::EINTR) | Err(Errno::EAGAIN) => continue,
                Err(errno) => return Err(TransportError::Receive(errno).into()),
            };
            if received > buf.len() {
                warn!(
                    received,
                    capacity = buf.len(),
                    "truncated netlink datagram, skipping"
                );
                continue;
            }

            for record in MessageIter::new(&buf[..received]) {
                let (header, payload) = record.map_err(NetlinkError::Protocol)?;
                if header.flags & NLM_F_DUMP_INTR != 0 {
                    debug!("netlink dump was interrupted and may be inconsistent");
                }
                match header.kind {
                    NLMSG_DONE => return Ok(()),
                    NLMSG_ERROR => return Err(decode_error_record(payload).into()),
                    NLMSG_NOOP => continue,
                    _ => on_record(&header, payload)?,
                }
            }
        }
    }

    /// Sends a request and drains its multi-record reply through
    /// `on_record` until the reply reports itself complete.
    pub fn send_and_drain<F>(&self, msg: &[u8], on_record: F) -> Result<(), NetlinkError>
    where
        F: FnMut(&NetlinkHeader, &[u8]) -> Result<(), NetlinkError>,
    {
        self.send(msg)?;
        self.receive_stream(on_record)
    }

    /// Sends an acknowledged request and blocks for its status record.
    /// An error record with code zero is the kernel's acknowledgement.
    pub fn send_ack(&self, msg: &[u8]) -> Result<(), NetlinkError> {
        self.send(msg)?;
        let mut buf = vec![0u8; REPLY_BUFFER_SIZE];
        loop {
            let received = match recv(self.fd, &mut buf, MsgFlags::empty()) {
                Ok(0) => return Err(ProtocolError::UnexpectedEof.into()),
                Ok(received) => received,
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(TransportError::Receive(errno).into()),
            };
            for record in MessageIter::new(&buf[..received]) {
                let (header, payload) = record.map_err(NetlinkError::Protocol)?;
                if header.kind != NLMSG_ERROR {
                    continue;
                }
                if payload.len() < 4 {
                    return Err(ProtocolError::Truncated.into());
                }
                let code = NativeEndian::read_i32(&payload[0..4]);
                return if code == 0 {
                    Ok(())
                } else {
                    Err(ProtocolError::from_error_code(code).into())
                };
            }
        }
    }
}

impl Drop for RouteSocket {
    fn drop(&mut self) {
        let _ = nix::unistd::close(self.fd);
    }
}

/// Decodes an `NLMSG_ERROR` record payload (`struct nlmsgerr`), translating
/// the raw error number into its description.
fn decode_error_record(payload: &[u8]) -> ProtocolError {
    if payload.len() < 4 {
        return ProtocolError::Truncated;
    }
    ProtocolError::from_error_code(NativeEndian::read_i32(&payload[0..4]))
}
