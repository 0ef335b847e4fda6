//! Host-side link speed queries through the `ethtool` ioctl.
//!
//! Speed get/set for ports of the kernel generation goes through the
//! standard interface-properties path, not the route socket.

use nix::errno::Errno;
use nix::sys::socket::{socket, AddressFamily, SockFlag, SockType};
use std::os::unix::io::RawFd;
use swagent_netlink::TransportError;

const SIOCETHTOOL: libc::c_ulong = 0x8946;
const ETHTOOL_GSET: u32 = 0x1;
const ETHTOOL_SSET: u32 = 0x2;

/// `struct ethtool_cmd` of the legacy get/set settings ioctl.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct EthtoolCmd {
    cmd: u32,
    supported: u32,
    advertising: u32,
    speed: u16,
    duplex: u8,
    port: u8,
    phy_address: u8,
    transceiver: u8,
    autoneg: u8,
    mdio_support: u8,
    maxtxpkt: u32,
    maxrxpkt: u32,
    speed_hi: u16,
    eth_tp_mdix: u8,
    eth_tp_mdix_ctrl: u8,
    lp_advertising: u32,
    reserved: [u32; 2],
}

/// `struct ifreq` with the data-pointer member of its union.
#[repr(C)]
struct IfReq {
    name: [libc::c_char; libc::IF_NAMESIZE],
    data: *mut libc::c_void,
}

/// One interface's ethtool channel. Holds the query socket for the lifetime
/// of the call; the descriptor is released by `Drop`.
#[derive(Debug)]
pub struct Ethtool {
    fd: RawFd,
    ifname: String,
}

impl Ethtool {
    /// Opens the query socket for `ifname`.
    pub fn open(ifname: &str) -> Result<Self, TransportError> {
        let fd = socket(
            AddressFamily::Inet,
            SockType::Datagram,
            SockFlag::empty(),
            None,
        )
        .map_err(TransportError::Allocate)?;
        Ok(Self {
            fd,
            ifname: ifname.to_string(),
        })
    }

    fn ioctl(&self, cmd: &mut EthtoolCmd) -> Result<(), TransportError> {
        let mut name = [0 as libc::c_char; libc::IF_NAMESIZE];
        for (slot, byte) in name
            .iter_mut()
            .zip(self.ifname.bytes().take(libc::IF_NAMESIZE - 1))
        {
            *slot = byte as libc::c_char;
        }
        let mut ifr = IfReq {
            name,
            data: cmd as *mut EthtoolCmd as *mut libc::c_void,
        };
        let ret = unsafe { libc::ioctl(self.fd, SIOCETHTOOL, &mut ifr) };
        if ret < 0 {
            Err(TransportError::Ioctl(Errno::last()))
        } else {
            Ok(())
        }
    }

    /// Reads the link speed in Mb/s.
    pub fn speed_mbps(&self) -> Result<u32, TransportError> {
        let mut cmd = EthtoolCmd {
            cmd: ETHTOOL_GSET,
            ..EthtoolCmd::default()
        };
        self.ioctl(&mut cmd)?;
        Ok(u32::from(cmd.speed) | (u32::from(cmd.speed_hi) << 16))
    }

    /// Writes the link speed in Mb/s, read-modify-write over the current
    /// settings.
    pub fn set_speed_mbps(&self, mbps: u32) -> Result<(), TransportError> {
        let mut cmd = EthtoolCmd {
            cmd: ETHTOOL_GSET,
            ..EthtoolCmd::default()
        };
        self.ioctl(&mut cmd)?;

        cmd.cmd = ETHTOOL_SSET;
        cmd.speed = (mbps & 0xffff) as u16;
        cmd.speed_hi = (mbps >> 16) as u16;
        cmd.autoneg = 0;
        self.ioctl(&mut cmd)
    }
}

impl Drop for Ethtool {
    fn drop(&mut self) {
        let _ = nix::unistd::close(self.fd);
    }
}
