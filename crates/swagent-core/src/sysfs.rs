//! Host-side interface property reads from sysfs.

use nix::errno::Errno;
use std::fs;
use swagent_netlink::TransportError;

/// Sysfs nodes of one switch port interface. The `autoneg` node is exposed
/// by the switch driver, alongside the standard `mtu` node.
#[derive(Debug, Clone)]
pub struct SysFs {
    ifname: String,
}

impl SysFs {
    pub fn new(ifname: &str) -> Self {
        Self {
            ifname: ifname.to_string(),
        }
    }

    fn read_u32(&self, node: &str) -> Result<u32, TransportError> {
        let path = format!("/sys/class/net/{}/{}", self.ifname, node);
        let raw = fs::read_to_string(&path).map_err(|err| TransportError::Sysfs {
            path: path.clone(),
            errno: Errno::from_i32(err.raw_os_error().unwrap_or(libc::EIO)),
        })?;
        raw.trim().parse().map_err(|_| TransportError::Sysfs {
            path,
            errno: Errno::EINVAL,
        })
    }

    /// Maximum frame size accepted by the port.
    pub fn max_frame_size(&self) -> Result<u32, TransportError> {
        self.read_u32("mtu")
    }

    /// Autonegotiation flag of the port.
    pub fn autoneg(&self) -> Result<bool, TransportError> {
        Ok(self.read_u32("autoneg")? != 0)
    }
}
