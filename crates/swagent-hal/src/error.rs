//! Error type for vendor SDK calls.

use crate::status::SdkStatus;
use thiserror::Error;

/// Result type for vendor SDK operations.
pub type HalResult<T> = Result<T, HalError>;

/// A failed vendor SDK call.
///
/// The `Call` variant carries enough context (switch, port, attribute and
/// value where applicable) to reconstruct the failed register access from
/// the log line alone.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// An SDK entry point returned a non-success status.
    #[error("cannot execute {call}: {context} status={status}")]
    Call {
        /// SDK entry point name.
        call: &'static str,
        /// Formatted switch/port/attribute/value context.
        context: String,
        /// Status the SDK returned.
        status: SdkStatus,
    },

    /// The SDK runtime has not been initialized.
    #[error("switch sdk not initialized")]
    Uninitialized,

    /// The hardware-present signal did not arrive within the bootstrap wait.
    #[error("timed out waiting for switch insertion: {status}")]
    InsertionTimeout { status: SdkStatus },
}

impl HalError {
    /// Creates a `Call` error for a failed SDK entry point.
    pub fn call(call: &'static str, context: impl Into<String>, status: SdkStatus) -> Self {
        HalError::Call {
            call,
            context: context.into(),
            status,
        }
    }

    /// Returns the SDK status behind this error, if any.
    pub fn status(&self) -> Option<SdkStatus> {
        match self {
            HalError::Call { status, .. } => Some(*status),
            HalError::InsertionTimeout { status } => Some(*status),
            HalError::Uninitialized => None,
        }
    }
}

/// Converts a raw status into a `HalResult`, attaching call context on error.
pub(crate) fn check(
    status: SdkStatus,
    call: &'static str,
    context: impl FnOnce() -> String,
) -> HalResult<()> {
    if status.is_ok() {
        Ok(())
    } else {
        Err(HalError::call(call, context(), status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_error_message() {
        let err = HalError::call(
            "set_port_attribute",
            "switch=1 port=3 attr=12 value=100",
            SdkStatus::InvalidPort,
        );
        let msg = err.to_string();
        assert!(msg.contains("set_port_attribute"));
        assert!(msg.contains("switch=1 port=3 attr=12 value=100"));
        assert!(msg.contains("SDK_STATUS_INVALID_PORT"));
    }

    #[test]
    fn test_check() {
        assert!(check(SdkStatus::Ok, "create_vlan", || unreachable!()).is_ok());
        let err = check(SdkStatus::Failure, "create_vlan", || "vlan=100".into()).unwrap_err();
        assert_eq!(err.status(), Some(SdkStatus::Failure));
    }
}
