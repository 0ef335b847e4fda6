//! Vendor SDK status codes.
//!
//! Every SDK entry point returns an integer status where zero means success.
//! The named values below cover the codes this agent dispatches on; anything
//! else is folded into `Failure`.

use std::fmt;

/// Status code returned by vendor SDK calls.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdkStatus {
    Ok = 0,
    Failure = -1,
    InvalidArgument = -2,
    InvalidSwitch = -3,
    InvalidPort = -4,
    InvalidVlan = -5,
    VlanAlreadyExists = -6,
    NotFound = -7,
    Unsupported = -8,
    Timeout = -9,
    NoMemory = -10,
    Uninitialized = -11,
}

impl SdkStatus {
    /// Creates a status from the raw integer the SDK returned.
    pub fn from_raw(status: i32) -> Self {
        match status {
            0 => SdkStatus::Ok,
            -1 => SdkStatus::Failure,
            -2 => SdkStatus::InvalidArgument,
            -3 => SdkStatus::InvalidSwitch,
            -4 => SdkStatus::InvalidPort,
            -5 => SdkStatus::InvalidVlan,
            -6 => SdkStatus::VlanAlreadyExists,
            -7 => SdkStatus::NotFound,
            -8 => SdkStatus::Unsupported,
            -9 => SdkStatus::Timeout,
            -10 => SdkStatus::NoMemory,
            -11 => SdkStatus::Uninitialized,
            _ => SdkStatus::Failure,
        }
    }

    /// Returns true if the status indicates success.
    pub fn is_ok(&self) -> bool {
        *self == SdkStatus::Ok
    }

    /// Returns the raw integer value.
    pub fn as_raw(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for SdkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SdkStatus::Ok => "SDK_STATUS_OK",
            SdkStatus::Failure => "SDK_STATUS_FAILURE",
            SdkStatus::InvalidArgument => "SDK_STATUS_INVALID_ARGUMENT",
            SdkStatus::InvalidSwitch => "SDK_STATUS_INVALID_SWITCH",
            SdkStatus::InvalidPort => "SDK_STATUS_INVALID_PORT",
            SdkStatus::InvalidVlan => "SDK_STATUS_INVALID_VLAN",
            SdkStatus::VlanAlreadyExists => "SDK_STATUS_VLAN_ALREADY_EXISTS",
            SdkStatus::NotFound => "SDK_STATUS_NOT_FOUND",
            SdkStatus::Unsupported => "SDK_STATUS_UNSUPPORTED",
            SdkStatus::Timeout => "SDK_STATUS_TIMEOUT",
            SdkStatus::NoMemory => "SDK_STATUS_NO_MEMORY",
            SdkStatus::Uninitialized => "SDK_STATUS_UNINITIALIZED",
        };
        write!(f, "{} ({})", s, self.as_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw() {
        assert_eq!(SdkStatus::from_raw(0), SdkStatus::Ok);
        assert_eq!(SdkStatus::from_raw(-6), SdkStatus::VlanAlreadyExists);
        assert_eq!(SdkStatus::from_raw(-999), SdkStatus::Failure);
    }

    #[test]
    fn test_is_ok() {
        assert!(SdkStatus::Ok.is_ok());
        assert!(!SdkStatus::Failure.is_ok());
    }

    #[test]
    fn test_display_includes_raw_value() {
        assert_eq!(SdkStatus::InvalidPort.to_string(), "SDK_STATUS_INVALID_PORT (-4)");
    }
}
