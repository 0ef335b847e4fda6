//! VLAN membership state machine.
//!
//! Per (vlan, port) the only persisted states are absent and member; the
//! intermediate steps of a transition become observable only if a later
//! step fails. `add_port` compensates for partial failure by rolling back
//! what it created; rollback itself is best-effort and never overrides the
//! original error.
//!
//! The non-propagating branches live in the rollback helper and the marked
//! steps of [`Backend::remove_vlan_port`]; every other failure propagates.

use crate::backend::Backend;
use crate::error::{AgentResult, StateError};
use swagent_types::{PortIdentifier, VlanId};
use tracing::{debug, warn};

/// Membership snapshot of one (vlan, port) pair, read in one step and acted
/// on as an explicit local value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VlanPortStatus {
    pub member: bool,
    pub tagged: bool,
    pub pvid: bool,
}

/// Info returned for one membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlanPortInfo {
    pub tagged: bool,
}

impl Backend {
    /// Creates the VLAN if it does not exist. Idempotent: returns `true`
    /// when this call created it, `false` without error when it was already
    /// there.
    pub fn ensure_vlan(&self, vlan: VlanId) -> AgentResult<bool> {
        match self {
            Backend::Vendor(backend) => backend.ensure_vlan(vlan),
            Backend::Kernel(backend) => backend.ensure_vlan(vlan),
        }
    }

    /// True if the VLAN currently exists on the switch.
    pub fn vlan_exists(&self, vlan: VlanId) -> AgentResult<bool> {
        match self {
            Backend::Vendor(backend) => backend.vlan_exists(vlan),
            Backend::Kernel(backend) => backend.vlan_exists(vlan),
        }
    }

    /// Adds `port` to `vlan`, creating the VLAN on demand and making it the
    /// port's PVID unless it already is. On partial failure every side
    /// effect of this call is rolled back before the error is raised.
    pub fn add_vlan_port(
        &self,
        vlan: VlanId,
        port: &PortIdentifier,
        tagged: bool,
    ) -> AgentResult<()> {
        let switch = self.switch_id();
        let cannot_add = || StateError::CannotAddPort {
            switch,
            vlan: vlan.as_u16(),
            port: port.port_index(),
        };

        let created = self.ensure_vlan(vlan)?;

        // A VLAN this call just created has no members; otherwise read the
        // current membership state and refuse double-adds.
        let mut current = VlanPortStatus::default();
        if !created {
            match self.vlan_port_status(vlan, port) {
                Ok(status) if !status.member => current = status,
                Ok(_) => {
                    // nothing was created, rollback is a no-op
                    warn!(switch, vlan = vlan.as_u16(), %port, "port is already a member");
                    return Err(cannot_add().into());
                }
                Err(err) => {
                    warn!(switch, vlan = vlan.as_u16(), %port, %err, "cannot read membership state");
                    return Err(cannot_add().into());
                }
            }
            debug!(
                switch,
                vlan = vlan.as_u16(),
                %port,
                pvid = current.pvid,
                tagged = current.tagged,
                "read vlan port state"
            );
        }

        let mut membership_added = false;
        if !current.member {
            if let Err(err) = self.add_membership_dispatch(vlan, port, tagged) {
                warn!(switch, vlan = vlan.as_u16(), %port, %err, "cannot add membership");
                self.rollback_add(vlan, port, membership_added, created);
                return Err(cannot_add().into());
            }
            membership_added = true;
            debug!(switch, vlan = vlan.as_u16(), %port, tagged, "added vlan port");
        }

        if !current.pvid {
            if let Err(err) = self.set_default_vlan_dispatch(port, vlan, tagged) {
                warn!(switch, vlan = vlan.as_u16(), %port, %err, "cannot set default vlan");
                self.rollback_add(vlan, port, membership_added, created);
                return Err(cannot_add().into());
            }
            // a fresh PVID must accept untagged ingress again, reversing the
            // setting applied when a port loses its PVID
            if let Err(err) = self.allow_untagged_ingress_dispatch(port) {
                warn!(switch, vlan = vlan.as_u16(), %port, %err, "cannot allow untagged ingress");
                self.rollback_add(vlan, port, membership_added, created);
                return Err(cannot_add().into());
            }
        }

        Ok(())
    }

    /// Removes `port` from `vlan`. A port losing its PVID falls back to
    /// VLAN 1; a VLAN losing its last member is deleted.
    pub fn remove_vlan_port(&self, vlan: VlanId, port: &PortIdentifier) -> AgentResult<()> {
        let switch = self.switch_id();

        let status = self.vlan_port_status(vlan, port)?;
        if !status.member {
            return Err(StateError::PortNotOnVlan {
                switch,
                vlan: vlan.as_u16(),
                port: port.port_index(),
            }
            .into());
        }

        // The PVID is leaving the port: revert its default VLAN to 1 and
        // drop untagged ingress. Failures here are logged, not fatal: the
        // membership removal still proceeds (accepted inconsistency, the
        // next add_port rewrites the default VLAN).
        match self.default_vlan_of_dispatch(port) {
            Ok(default_vlan) if default_vlan == vlan.as_u16() => {
                if let Err(err) = self.reset_default_vlan_dispatch(port) {
                    warn!(switch, vlan = vlan.as_u16(), %port, %err, "cannot revert default vlan to 1");
                }
                if let Err(err) = self.drop_untagged_ingress_dispatch(port) {
                    warn!(switch, vlan = vlan.as_u16(), %port, %err, "cannot drop untagged ingress");
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!(switch, %port, %err, "cannot read default vlan");
            }
        }

        if let Err(err) = self.delete_membership_dispatch(vlan, port) {
            warn!(switch, vlan = vlan.as_u16(), %port, %err, "cannot delete membership");
            return Err(StateError::CannotDeletePort {
                switch,
                vlan: vlan.as_u16(),
                port: port.port_index(),
            }
            .into());
        }
        debug!(switch, vlan = vlan.as_u16(), %port, "deleted vlan port");

        // Last member gone: the VLAN does not persist empty. Failures here
        // are logged, not fatal.
        match self.member_count_dispatch(vlan) {
            Ok(0) => {
                if let Err(err) = self.delete_vlan_dispatch(vlan) {
                    warn!(switch, vlan = vlan.as_u16(), %err, "cannot delete empty vlan");
                } else {
                    debug!(switch, vlan = vlan.as_u16(), "deleted empty vlan");
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!(switch, vlan = vlan.as_u16(), %err, "cannot count vlan members");
            }
        }

        Ok(())
    }

    /// Reads the tagging flag of one membership.
    pub fn vlan_port_info(&self, vlan: VlanId, port: &PortIdentifier) -> AgentResult<VlanPortInfo> {
        let tagging = match self {
            Backend::Vendor(backend) => backend.membership_tagging(vlan, port)?,
            Backend::Kernel(backend) => backend.membership_tagging(vlan, port)?,
        };
        match tagging {
            Some(tagged) => Ok(VlanPortInfo { tagged }),
            None => Err(StateError::PortNotOnVlan {
                switch: self.switch_id(),
                vlan: vlan.as_u16(),
                port: port.port_index(),
            }
            .into()),
        }
    }

    /// Membership snapshot of one (vlan, port) pair.
    pub fn vlan_port_status(
        &self,
        vlan: VlanId,
        port: &PortIdentifier,
    ) -> AgentResult<VlanPortStatus> {
        match self {
            Backend::Vendor(backend) => backend.vlan_port_status(vlan, port),
            Backend::Kernel(backend) => backend.vlan_port_status(vlan, port),
        }
    }

    /// Best-effort compensation for a failed `add_vlan_port`: deletes what
    /// this call added and the VLAN if this call created it. Failures here
    /// are logged and never propagated; the original error is the one the
    /// caller sees.
    fn rollback_add(
        &self,
        vlan: VlanId,
        port: &PortIdentifier,
        membership_added: bool,
        vlan_created: bool,
    ) {
        let switch = self.switch_id();
        if membership_added {
            if let Err(err) = self.delete_membership_dispatch(vlan, port) {
                warn!(switch, vlan = vlan.as_u16(), %port, %err, "rollback: cannot delete membership");
            }
        }
        if vlan_created {
            if let Err(err) = self.delete_vlan_dispatch(vlan) {
                warn!(switch, vlan = vlan.as_u16(), %err, "rollback: cannot delete vlan");
            }
        }
    }

    fn add_membership_dispatch(
        &self,
        vlan: VlanId,
        port: &PortIdentifier,
        tagged: bool,
    ) -> AgentResult<()> {
        match self {
            Backend::Vendor(backend) => backend.add_membership(vlan, port, tagged),
            Backend::Kernel(backend) => backend.add_membership(vlan, port, tagged),
        }
    }

    fn delete_membership_dispatch(&self, vlan: VlanId, port: &PortIdentifier) -> AgentResult<()> {
        match self {
            Backend::Vendor(backend) => backend.delete_membership(vlan, port),
            Backend::Kernel(backend) => backend.delete_membership(vlan, port),
        }
    }

    fn delete_vlan_dispatch(&self, vlan: VlanId) -> AgentResult<()> {
        match self {
            Backend::Vendor(backend) => backend.delete_vlan(vlan),
            Backend::Kernel(backend) => backend.delete_vlan(vlan),
        }
    }

    fn default_vlan_of_dispatch(&self, port: &PortIdentifier) -> AgentResult<u16> {
        match self {
            Backend::Vendor(backend) => backend.default_vlan_of(port),
            Backend::Kernel(backend) => backend.default_vlan_of(port),
        }
    }

    fn set_default_vlan_dispatch(
        &self,
        port: &PortIdentifier,
        vlan: VlanId,
        tagged: bool,
    ) -> AgentResult<()> {
        match self {
            Backend::Vendor(backend) => backend.set_default_vlan(port, vlan, tagged),
            Backend::Kernel(backend) => backend.set_default_vlan(port, vlan, tagged),
        }
    }

    fn allow_untagged_ingress_dispatch(&self, port: &PortIdentifier) -> AgentResult<()> {
        match self {
            Backend::Vendor(backend) => backend.allow_untagged_ingress(port),
            Backend::Kernel(backend) => backend.allow_untagged_ingress(port),
        }
    }

    fn reset_default_vlan_dispatch(&self, port: &PortIdentifier) -> AgentResult<()> {
        match self {
            Backend::Vendor(backend) => backend.reset_default_vlan(port),
            Backend::Kernel(backend) => backend.reset_default_vlan(port),
        }
    }

    fn drop_untagged_ingress_dispatch(&self, port: &PortIdentifier) -> AgentResult<()> {
        match self {
            Backend::Vendor(backend) => backend.drop_untagged_ingress(port),
            Backend::Kernel(backend) => backend.drop_untagged_ingress(port),
        }
    }

    fn member_count_dispatch(&self, vlan: VlanId) -> AgentResult<usize> {
        match self {
            Backend::Vendor(backend) => backend.member_count(vlan),
            Backend::Kernel(backend) => backend.member_count(vlan),
        }
    }
}
