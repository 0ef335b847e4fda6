//! The vendor-SDK switch backend.
//!
//! Every operation is a register-level SDK call through [`Hal`]. Port state
//! uses the SDK's mode/state pair; VLAN membership uses the VLAN port table;
//! the PVID is the port's default-VLAN register together with the
//! drop-untagged-on-ingress register (see the VID-1 convention below).

use crate::error::{AgentResult, StateError};
use crate::vlan::VlanPortStatus;
use std::collections::HashMap;
use swagent_hal::sdk::{
    eth_mode, flag, lane_sel, mac_sel, port_attr, port_mode, port_state, speed_cap, vlan_attr,
};
use swagent_hal::{Hal, SwitchInfo};
use swagent_types::{LinkState, PortIdentifier, PortType, VlanId};
use tracing::debug;

/// Base page advertised for an autonegotiation mode register value.
/// Vendor-defined pairs; the SDK requires both registers to be written
/// together.
pub(crate) fn base_page_for(autoneg: u64) -> u64 {
    match autoneg {
        swagent_hal::sdk::autoneg_mode::CLAUSE_37 => 0x0000_0020,
        swagent_hal::sdk::autoneg_mode::CLAUSE_73 => 0x0000_1001,
        _ => 0,
    }
}

/// Switch backend driven through the vendor SDK register interface.
#[derive(Debug, Clone)]
pub struct VendorBackend {
    switch_id: u16,
    hal: Hal,
    port_types: HashMap<u16, PortType>,
    info: SwitchInfo,
}

impl VendorBackend {
    /// Assembles a backend from its parts. Production code reaches this
    /// through [`VendorBackend::bootstrap`].
    pub fn new(
        switch_id: u16,
        hal: Hal,
        port_types: HashMap<u16, PortType>,
        info: SwitchInfo,
    ) -> Self {
        Self {
            switch_id,
            hal,
            port_types,
            info,
        }
    }

    pub fn switch_id(&self) -> u16 {
        self.switch_id
    }

    /// Hardware info read back at bootstrap.
    pub fn info(&self) -> SwitchInfo {
        self.info
    }

    pub(crate) fn port_type(&self, port_index: u16) -> PortType {
        self.port_types
            .get(&port_index)
            .copied()
            .unwrap_or_default()
    }

    /// Index 0 is the reserved management port and never exposed; indexes
    /// beyond the hardware port count do not exist.
    pub(crate) fn check_port_present(&self, port: &PortIdentifier) -> AgentResult<()> {
        let index = port.port_index();
        if index == 0 || index > self.info.port_count {
            return Err(StateError::PortNotPresent {
                switch: self.switch_id,
                port: index,
            }
            .into());
        }
        Ok(())
    }

    fn mode_to_link(mode: i32) -> LinkState {
        match mode {
            port_mode::UP => LinkState::Up,
            port_mode::ADMIN_DOWN | port_mode::ADMIN_PWRDOWN => LinkState::Down,
            _ => LinkState::Unknown,
        }
    }

    fn oper_to_link(state: i32) -> LinkState {
        match state {
            port_state::UP => LinkState::Up,
            port_state::DOWN | port_state::ADMIN_DOWN | port_state::ADMIN_PWRDOWN => {
                LinkState::Down
            }
            _ => LinkState::Unknown,
        }
    }

    // ---- port attribute operations ----

    pub(crate) fn speed(&self, port: &PortIdentifier) -> AgentResult<u64> {
        Ok(self
            .hal
            .port_attribute(self.switch_id, port.port_index(), port_attr::SPEED)?)
    }

    /// Writes the port speed as an electrical interface mode. The port must
    /// already be in SGMII signaling mode, and the requested speed must be
    /// in the capability bitmask read from the hardware.
    pub(crate) fn set_speed(&self, port: &PortIdentifier, gbps: u64) -> AgentResult<()> {
        let index = port.port_index();
        let mode = self
            .hal
            .port_attribute(self.switch_id, index, port_attr::ETH_IFACE_MODE)?;
        if mode != eth_mode::SGMII {
            return Err(StateError::WrongSignalingMode { mode }.into());
        }

        let caps = self.hal.port_capabilities(self.switch_id, index)?;
        let required = match gbps {
            0 => None,
            1 => Some(speed_cap::GBPS_1),
            10 => Some(speed_cap::GBPS_10),
            20 => Some(speed_cap::GBPS_20),
            40 => Some(speed_cap::GBPS_40),
            _ => {
                return Err(StateError::SpeedNotSupported {
                    speed: gbps,
                    mask: caps,
                }
                .into())
            }
        };
        if let Some(bit) = required {
            if caps & bit == 0 {
                return Err(StateError::SpeedNotSupported {
                    speed: gbps,
                    mask: caps,
                }
                .into());
            }
        }

        let eth = match gbps {
            0 => eth_mode::DISABLED,
            1 => eth_mode::SGMII,
            10 => eth_mode::BASE_CR_10G,
            _ => {
                return Err(StateError::SpeedNotSupported {
                    speed: gbps,
                    mask: caps,
                }
                .into())
            }
        };
        self.hal.set_port_attribute_v2(
            self.switch_id,
            index,
            mac_sel::ACTIVE,
            lane_sel::ALL,
            port_attr::ETH_IFACE_MODE,
            eth,
        )?;
        Ok(())
    }

    pub(crate) fn link_states(&self, port: &PortIdentifier) -> AgentResult<(LinkState, LinkState)> {
        let (mode, state) =
            self.hal
                .port_state(self.switch_id, port.port_index(), mac_sel::ACTIVE)?;
        Ok((Self::mode_to_link(mode), Self::oper_to_link(state)))
    }

    pub(crate) fn set_link_state(&self, port: &PortIdentifier, state: LinkState) -> AgentResult<()> {
        let mode = match state {
            LinkState::Up => port_mode::UP,
            LinkState::Down => port_mode::ADMIN_DOWN,
            LinkState::Unknown => return Err(StateError::InvalidLinkState(state).into()),
        };
        self.hal
            .set_port_state(self.switch_id, port.port_index(), mac_sel::ACTIVE, mode)?;
        Ok(())
    }

    pub(crate) fn frame_size(&self, port: &PortIdentifier) -> AgentResult<u64> {
        Ok(self.hal.port_attribute(
            self.switch_id,
            port.port_index(),
            port_attr::MAX_FRAME_SIZE,
        )?)
    }

    pub(crate) fn set_frame_size(&self, port: &PortIdentifier, size: u64) -> AgentResult<()> {
        self.hal.set_port_attribute_v2(
            self.switch_id,
            port.port_index(),
            mac_sel::ACTIVE,
            lane_sel::ALL,
            port_attr::MAX_FRAME_SIZE,
            size,
        )?;
        Ok(())
    }

    pub(crate) fn autoneg(&self, port: &PortIdentifier) -> AgentResult<bool> {
        let mode = self
            .hal
            .port_attribute(self.switch_id, port.port_index(), port_attr::AUTONEG)?;
        Ok(mode != swagent_hal::sdk::autoneg_mode::NONE)
    }

    pub(crate) fn set_autoneg(&self, port: &PortIdentifier, enable: bool) -> AgentResult<()> {
        let index = port.port_index();
        let mode = if enable {
            swagent_hal::sdk::autoneg_mode::CLAUSE_37
        } else {
            swagent_hal::sdk::autoneg_mode::NONE
        };
        self.hal.set_port_attribute_v2(
            self.switch_id,
            index,
            mac_sel::ACTIVE,
            lane_sel::ALL,
            port_attr::AUTONEG,
            mode,
        )?;
        if enable {
            self.hal.set_port_attribute_v2(
                self.switch_id,
                index,
                mac_sel::ACTIVE,
                lane_sel::ALL,
                port_attr::AUTONEG_BASEPAGE,
                base_page_for(mode),
            )?;
        }
        Ok(())
    }

    pub(crate) fn vlan_list(&self, port: &PortIdentifier) -> AgentResult<Vec<String>> {
        let index = port.port_index();
        let mut list = Vec::new();
        for vlan in self.hal.vlan_list(self.switch_id)? {
            if self.hal.vlan_ports(self.switch_id, vlan)?.contains(&index) {
                list.push(vlan.to_string());
            }
        }
        Ok(list)
    }

    // ---- VLAN membership primitives ----

    pub(crate) fn vlan_exists(&self, vlan: VlanId) -> AgentResult<bool> {
        Ok(self.hal.vlan_list(self.switch_id)?.contains(&vlan.as_u16()))
    }

    /// Creates the VLAN if missing; a fresh VLAN also gets the default MTU
    /// attribute. Returns true when this call created it.
    pub(crate) fn ensure_vlan(&self, vlan: VlanId) -> AgentResult<bool> {
        let created = self.hal.create_vlan(self.switch_id, vlan.as_u16())?;
        if created {
            self.hal
                .set_vlan_attribute(self.switch_id, vlan.as_u16(), vlan_attr::MTU, 0)?;
            debug!(switch = self.switch_id, vlan = vlan.as_u16(), "created vlan");
        } else {
            debug!(switch = self.switch_id, vlan = vlan.as_u16(), "vlan already exists");
        }
        Ok(created)
    }

    pub(crate) fn delete_vlan(&self, vlan: VlanId) -> AgentResult<()> {
        self.hal.delete_vlan(self.switch_id, vlan.as_u16())?;
        Ok(())
    }

    /// Reads membership, tagging and PVID state of one (vlan, port) pair as
    /// one explicit snapshot.
    ///
    /// VID 1 is a special case: the SDK does not allow a port without a
    /// default VLAN, so "default VLAN is 1 and untagged ingress is dropped"
    /// encodes "no PVID", and VID 1 only counts as the PVID while untagged
    /// ingress is accepted.
    pub(crate) fn vlan_port_status(
        &self,
        vlan: VlanId,
        port: &PortIdentifier,
    ) -> AgentResult<VlanPortStatus> {
        let index = port.port_index();
        let tagged = match self.hal.vlan_port_tag(self.switch_id, vlan.as_u16(), index)? {
            None => return Ok(VlanPortStatus::default()),
            Some(tagged) => tagged,
        };

        let def_vlan = self
            .hal
            .port_attribute(self.switch_id, index, port_attr::DEF_VLAN)?;
        let mut pvid = def_vlan == u64::from(vlan.as_u16());
        if pvid && vlan.is_default() {
            let drop_untagged = self
                .hal
                .port_attribute(self.switch_id, index, port_attr::DROP_UNTAGGED)?;
            pvid = drop_untagged == flag::DISABLED;
        }

        Ok(VlanPortStatus {
            member: true,
            tagged,
            pvid,
        })
    }

    pub(crate) fn add_membership(
        &self,
        vlan: VlanId,
        port: &PortIdentifier,
        tagged: bool,
    ) -> AgentResult<()> {
        self.hal
            .add_vlan_port(self.switch_id, vlan.as_u16(), port.port_index(), tagged)?;
        Ok(())
    }

    pub(crate) fn delete_membership(&self, vlan: VlanId, port: &PortIdentifier) -> AgentResult<()> {
        self.hal
            .delete_vlan_port(self.switch_id, vlan.as_u16(), port.port_index())?;
        Ok(())
    }

    pub(crate) fn default_vlan_of(&self, port: &PortIdentifier) -> AgentResult<u16> {
        let def = self
            .hal
            .port_attribute(self.switch_id, port.port_index(), port_attr::DEF_VLAN)?;
        Ok(def as u16)
    }

    pub(crate) fn set_default_vlan(
        &self,
        port: &PortIdentifier,
        vlan: VlanId,
        _tagged: bool,
    ) -> AgentResult<()> {
        self.hal.set_port_attribute(
            self.switch_id,
            port.port_index(),
            port_attr::DEF_VLAN,
            u64::from(vlan.as_u16()),
        )?;
        Ok(())
    }

    /// Accept untagged frames on ingress: the companion of making a VLAN the
    /// port's PVID.
    pub(crate) fn allow_untagged_ingress(&self, port: &PortIdentifier) -> AgentResult<()> {
        self.hal.set_port_attribute(
            self.switch_id,
            port.port_index(),
            port_attr::DROP_UNTAGGED,
            flag::DISABLED,
        )?;
        Ok(())
    }

    /// Reverts the port's default VLAN to 1.
    pub(crate) fn reset_default_vlan(&self, port: &PortIdentifier) -> AgentResult<()> {
        self.hal.set_port_attribute(
            self.switch_id,
            port.port_index(),
            port_attr::DEF_VLAN,
            u64::from(VlanId::DEFAULT.as_u16()),
        )?;
        Ok(())
    }

    /// Drop untagged frames on ingress: marks the port as having no real
    /// PVID while its default VLAN register points at VID 1.
    pub(crate) fn drop_untagged_ingress(&self, port: &PortIdentifier) -> AgentResult<()> {
        self.hal.set_port_attribute(
            self.switch_id,
            port.port_index(),
            port_attr::DROP_UNTAGGED,
            flag::ENABLED,
        )?;
        Ok(())
    }

    pub(crate) fn member_count(&self, vlan: VlanId) -> AgentResult<usize> {
        Ok(self.hal.vlan_ports(self.switch_id, vlan.as_u16())?.len())
    }

    pub(crate) fn membership_tagging(
        &self,
        vlan: VlanId,
        port: &PortIdentifier,
    ) -> AgentResult<Option<bool>> {
        Ok(self
            .hal
            .vlan_port_tag(self.switch_id, vlan.as_u16(), port.port_index())?)
    }
}
