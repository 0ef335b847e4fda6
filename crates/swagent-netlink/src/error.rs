//! Transport and protocol error types.

use nix::errno::Errno;
use thiserror::Error;

/// Socket-level failures. Each variant carries the OS errno, whose display
/// includes the decoded description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("cannot allocate netlink socket: {0}")]
    Allocate(Errno),

    #[error("cannot bind netlink socket: {0}")]
    Bind(Errno),

    #[error("cannot connect netlink socket: {0}")]
    Connect(Errno),

    #[error("cannot send netlink message: {0}")]
    Send(Errno),

    #[error("cannot receive netlink message: {0}")]
    Receive(Errno),

    /// The host-side interface properties ioctl was rejected.
    #[error("interface properties ioctl failed: {0}")]
    Ioctl(Errno),

    /// A host-side interface properties sysfs node could not be read.
    #[error("cannot read '{path}': {errno}")]
    Sysfs { path: String, errno: Errno },
}

/// Malformed, truncated or error-bearing protocol exchanges, and interface
/// name/index resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// An attribute payload does not fit the 16-bit attribute length field.
    #[error("netlink attribute overflow: {len} byte payload does not fit an attribute")]
    AttributeOverflow { len: usize },

    /// A reply was shorter than its fixed header requires.
    #[error("truncated netlink message")]
    Truncated,

    /// The kernel answered with an explicit error record.
    #[error("netlink error reply: {description} ({code})")]
    ErrorReply { code: i32, description: String },

    /// The socket reported end of stream before the protocol terminator.
    #[error("end of stream on netlink socket before terminator")]
    UnexpectedEof,

    /// The interface name has no kernel interface index (the port does not
    /// exist at the OS level).
    #[error("cannot resolve interface '{name}' to an index")]
    UnresolvableName { name: String },

    /// A previously-valid interface index became unresolvable.
    #[error("cannot resolve interface index {index} to a name")]
    UnresolvableIndex { index: u32 },

    /// A record of a type this parser cannot accept.
    #[error("unexpected netlink message type {kind}")]
    UnexpectedMessage { kind: u16 },
}

impl ProtocolError {
    /// Builds an [`ProtocolError::ErrorReply`] from the raw (negative) error
    /// code of an `NLMSG_ERROR` record, decoding it to its description.
    pub fn from_error_code(raw: i32) -> Self {
        let code = raw.abs();
        ProtocolError::ErrorReply {
            code,
            description: Errno::from_i32(code).desc().to_string(),
        }
    }
}

/// Umbrella error for codec and transport operations.
#[derive(Debug, Error)]
pub enum NetlinkError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_reply_decodes_errno() {
        let err = ProtocolError::from_error_code(-19); // ENODEV
        match &err {
            ProtocolError::ErrorReply { code, description } => {
                assert_eq!(*code, 19);
                assert!(!description.is_empty());
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("(19)"));
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Send(Errno::EPERM);
        assert!(err.to_string().contains("cannot send"));
    }
}
