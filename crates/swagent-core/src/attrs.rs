//! The recognized port attribute set.

use crate::error::CapabilityError;
use std::fmt;
use std::str::FromStr;

/// Largest accepted max-frame-size value, in bytes.
pub const MAX_FRAME_SIZE: u64 = 15864;

/// Every port attribute the command layer can name.
///
/// The set is closed: a name outside it fails to parse. Not every member is
/// supported by the backends; the unsupported ones are still enumerated
/// explicitly so that "recognized but unsupported" and "unknown" stay
/// distinct error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortAttribute {
    LinkSpeedGbps,
    LinkState,
    OperationalState,
    PortIdentifier,
    FrameSize,
    Autosense,
    VlanList,
    MacAddress,
    Status,
    PortType,
    LinkTechnology,
    MaxSpeedGbps,
    PortWidth,
    IsManagementPort,
    LastErrorCode,
    ErrorCleared,
    LastStateChangeTime,
    Ipv4Address,
    Ipv6Address,
    NeighborInfo,
    VlanEnable,
}

impl PortAttribute {
    /// Canonical attribute name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PortAttribute::LinkSpeedGbps => "LinkSpeedGbps",
            PortAttribute::LinkState => "LinkState",
            PortAttribute::OperationalState => "OperationalState",
            PortAttribute::PortIdentifier => "PortIdentifier",
            PortAttribute::FrameSize => "FrameSize",
            PortAttribute::Autosense => "Autosense",
            PortAttribute::VlanList => "VlanList",
            PortAttribute::MacAddress => "MacAddress",
            PortAttribute::Status => "Status",
            PortAttribute::PortType => "PortType",
            PortAttribute::LinkTechnology => "LinkTechnology",
            PortAttribute::MaxSpeedGbps => "MaxSpeedGbps",
            PortAttribute::PortWidth => "PortWidth",
            PortAttribute::IsManagementPort => "IsManagementPort",
            PortAttribute::LastErrorCode => "LastErrorCode",
            PortAttribute::ErrorCleared => "ErrorCleared",
            PortAttribute::LastStateChangeTime => "LastStateChangeTime",
            PortAttribute::Ipv4Address => "Ipv4Address",
            PortAttribute::Ipv6Address => "Ipv6Address",
            PortAttribute::NeighborInfo => "NeighborInfo",
            PortAttribute::VlanEnable => "VlanEnable",
        }
    }

    /// The recognized-but-unsupported members, for both get and set.
    pub const UNSUPPORTED: [PortAttribute; 13] = [
        PortAttribute::Status,
        PortAttribute::PortType,
        PortAttribute::LinkTechnology,
        PortAttribute::MaxSpeedGbps,
        PortAttribute::PortWidth,
        PortAttribute::IsManagementPort,
        PortAttribute::LastErrorCode,
        PortAttribute::ErrorCleared,
        PortAttribute::LastStateChangeTime,
        PortAttribute::Ipv4Address,
        PortAttribute::Ipv6Address,
        PortAttribute::NeighborInfo,
        PortAttribute::VlanEnable,
    ];
}

impl fmt::Display for PortAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortAttribute {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let attr = match s {
            "LinkSpeedGbps" => PortAttribute::LinkSpeedGbps,
            "LinkState" => PortAttribute::LinkState,
            "OperationalState" => PortAttribute::OperationalState,
            "PortIdentifier" => PortAttribute::PortIdentifier,
            "FrameSize" => PortAttribute::FrameSize,
            "Autosense" => PortAttribute::Autosense,
            "VlanList" => PortAttribute::VlanList,
            "MacAddress" => PortAttribute::MacAddress,
            "Status" => PortAttribute::Status,
            "PortType" => PortAttribute::PortType,
            "LinkTechnology" => PortAttribute::LinkTechnology,
            "MaxSpeedGbps" => PortAttribute::MaxSpeedGbps,
            "PortWidth" => PortAttribute::PortWidth,
            "IsManagementPort" => PortAttribute::IsManagementPort,
            "LastErrorCode" => PortAttribute::LastErrorCode,
            "ErrorCleared" => PortAttribute::ErrorCleared,
            "LastStateChangeTime" => PortAttribute::LastStateChangeTime,
            "Ipv4Address" => PortAttribute::Ipv4Address,
            "Ipv6Address" => PortAttribute::Ipv6Address,
            "NeighborInfo" => PortAttribute::NeighborInfo,
            "VlanEnable" => PortAttribute::VlanEnable,
            other => return Err(CapabilityError::Unknown(other.to_string())),
        };
        Ok(attr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for attr in [
            PortAttribute::LinkSpeedGbps,
            PortAttribute::LinkState,
            PortAttribute::FrameSize,
            PortAttribute::VlanEnable,
        ] {
            assert_eq!(attr.as_str().parse::<PortAttribute>().unwrap(), attr);
        }
    }

    #[test]
    fn test_unknown_name() {
        let err = "NoSuchAttribute".parse::<PortAttribute>().unwrap_err();
        assert!(matches!(err, CapabilityError::Unknown(name) if name == "NoSuchAttribute"));
    }
}
