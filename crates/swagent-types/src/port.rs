//! Port identifier and port state types.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Textual port address of the form `sw<switch>p<port>`.
///
/// This is the exact name the switch driver gives the port's kernel
/// interface, so formatting an identifier and resolving it as an interface
/// name are the same operation.
///
/// # Examples
///
/// ```
/// use swagent_types::PortIdentifier;
///
/// let port: PortIdentifier = "sw0p3".parse().unwrap();
/// assert_eq!(port.switch_id(), 0);
/// assert_eq!(port.port_index(), 3);
/// assert_eq!(port.to_string(), "sw0p3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortIdentifier {
    switch_id: u16,
    port_index: u16,
}

impl PortIdentifier {
    /// Creates a port identifier from a switch id and port index.
    pub const fn new(switch_id: u16, port_index: u16) -> Self {
        Self {
            switch_id,
            port_index,
        }
    }

    /// Returns the switch id.
    pub const fn switch_id(&self) -> u16 {
        self.switch_id
    }

    /// Returns the port index on the switch.
    pub const fn port_index(&self) -> u16 {
        self.port_index
    }
}

impl fmt::Display for PortIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sw{}p{}", self.switch_id, self.port_index)
    }
}

impl FromStr for PortIdentifier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseError::InvalidPortIdentifier(s.to_string());

        let rest = s.strip_prefix("sw").ok_or_else(err)?;
        let (sw_digits, port_digits) = rest.split_once('p').ok_or_else(err)?;
        if sw_digits.is_empty()
            || port_digits.is_empty()
            || !sw_digits.bytes().all(|b| b.is_ascii_digit())
            || !port_digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(err());
        }

        let switch_id = sw_digits.parse().map_err(|_| err())?;
        let port_index = port_digits.parse().map_err(|_| err())?;
        Ok(Self::new(switch_id, port_index))
    }
}

impl TryFrom<String> for PortIdentifier {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PortIdentifier> for String {
    fn from(port: PortIdentifier) -> String {
        port.to_string()
    }
}

/// Administrative or operational link state of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LinkState {
    /// Link is up.
    Up,
    /// Link is down.
    Down,
    /// State has not been determined.
    #[default]
    Unknown,
}

impl LinkState {
    /// Returns the canonical string form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            LinkState::Up => "Up",
            LinkState::Down => "Down",
            LinkState::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Up" => Ok(LinkState::Up),
            "Down" => Ok(LinkState::Down),
            "Unknown" => Ok(LinkState::Unknown),
            _ => Err(ParseError::InvalidLinkState(s.to_string())),
        }
    }
}

/// Classification of a switch port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    /// Port connected to another switch or the upstream fabric.
    #[default]
    Network,
    /// Port connected to a compute node's network interface. Autonegotiation
    /// and MAC learning are only meaningful here.
    Host,
}

impl PortType {
    /// Returns true for host-facing (compute node) ports.
    pub const fn is_host_facing(&self) -> bool {
        matches!(self, PortType::Host)
    }
}
