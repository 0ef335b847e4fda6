//! End-to-end VLAN membership and attribute behavior over the vendor
//! backend, driven through the simulated SDK.

use std::collections::HashMap;
use std::sync::Arc;
use swagent_core::{
    AgentError, Backend, CapabilityError, PortAttribute, StateError, VendorBackend,
};
use swagent_hal::sdk::{eth_mode, flag, port_attr, speed_cap};
use swagent_hal::{FailRule, Hal, SdkStatus, SimSwitchSdk, SwitchInfo, SwitchSdk};
use swagent_types::{AttributeValue, PortIdentifier, PortType, VlanId};

fn vendor_backend(switch_id: u16) -> (Arc<SimSwitchSdk>, Backend) {
    let sim = Arc::new(SimSwitchSdk::new(48));
    let info = SwitchInfo {
        port_count: 48,
        max_vlans: 4094,
        model: 0x6000,
    };
    let mut port_types = HashMap::new();
    port_types.insert(7u16, PortType::Host);
    let backend = Backend::Vendor(VendorBackend::new(
        switch_id,
        Hal::new(sim.clone()),
        port_types,
        info,
    ));
    (sim, backend)
}

fn vlan(id: u16) -> VlanId {
    VlanId::new(id).unwrap()
}

#[test]
fn ensure_vlan_is_idempotent() {
    let (_, backend) = vendor_backend(1);
    assert!(backend.ensure_vlan(vlan(100)).unwrap());
    assert!(!backend.ensure_vlan(vlan(100)).unwrap());
    assert!(backend.vlan_exists(vlan(100)).unwrap());
}

#[test]
fn membership_round_trip_preserves_tagging() {
    let (_, backend) = vendor_backend(1);
    for (port_index, tagged) in [(3u16, true), (4u16, false)] {
        let port = PortIdentifier::new(1, port_index);
        backend.add_vlan_port(vlan(200), &port, tagged).unwrap();
        let info = backend.vlan_port_info(vlan(200), &port).unwrap();
        assert_eq!(info.tagged, tagged);
    }
}

#[test]
fn add_to_new_vlan_makes_it_pvid() {
    // switch 2, port 5, vlan 100 does not yet exist, tagged
    let (sim, backend) = vendor_backend(2);
    let port = PortIdentifier::new(2, 5);

    assert!(!backend.vlan_exists(vlan(100)).unwrap());
    backend.add_vlan_port(vlan(100), &port, true).unwrap();

    let status = backend.vlan_port_status(vlan(100), &port).unwrap();
    assert!(status.member);
    assert!(status.tagged);
    assert!(status.pvid);
    // default VLAN moved to 100 since the port was not already a PVID
    assert_eq!(sim.raw_port_attribute(5, port_attr::DEF_VLAN), Some(100));
    assert_eq!(
        sim.raw_port_attribute(5, port_attr::DROP_UNTAGGED),
        Some(flag::DISABLED)
    );
}

#[test]
fn double_add_is_rejected() {
    let (_, backend) = vendor_backend(1);
    let port = PortIdentifier::new(1, 3);
    backend.add_vlan_port(vlan(100), &port, true).unwrap();
    let err = backend.add_vlan_port(vlan(100), &port, true).unwrap_err();
    assert!(matches!(
        err,
        AgentError::State(StateError::CannotAddPort { vlan: 100, port: 3, .. })
    ));
    // the membership itself is untouched
    assert!(backend.vlan_port_info(vlan(100), &port).unwrap().tagged);
}

#[test]
fn auto_cleanup_deletes_empty_vlan() {
    let (_, backend) = vendor_backend(1);
    let port = PortIdentifier::new(1, 3);
    backend.add_vlan_port(vlan(300), &port, true).unwrap();
    backend.remove_vlan_port(vlan(300), &port).unwrap();
    assert!(!backend.vlan_exists(vlan(300)).unwrap());
}

#[test]
fn last_member_removal_reverts_pvid_to_one() {
    // vlan 7 on switch 1 has exactly one member: port 3, untagged, PVID
    let (sim, backend) = vendor_backend(1);
    let port = PortIdentifier::new(1, 3);
    backend.add_vlan_port(vlan(7), &port, false).unwrap();
    assert_eq!(sim.raw_port_attribute(3, port_attr::DEF_VLAN), Some(7));

    backend.remove_vlan_port(vlan(7), &port).unwrap();

    // default VLAN reverted to 1 with untagged ingress dropped again
    assert_eq!(sim.raw_port_attribute(3, port_attr::DEF_VLAN), Some(1));
    assert_eq!(
        sim.raw_port_attribute(3, port_attr::DROP_UNTAGGED),
        Some(flag::ENABLED)
    );
    // membership gone, vlan gone
    assert!(!sim.vlan_exists(7));
}

#[test]
fn remove_port_requires_membership() {
    let (_, backend) = vendor_backend(1);
    let port = PortIdentifier::new(1, 3);
    backend.ensure_vlan(vlan(100)).unwrap();
    let err = backend.remove_vlan_port(vlan(100), &port).unwrap_err();
    assert!(matches!(
        err,
        AgentError::State(StateError::PortNotOnVlan { vlan: 100, port: 3, .. })
    ));
}

#[test]
fn rollback_undoes_created_vlan_and_membership() {
    // force the default-VLAN write (step 4) to fail for a VLAN this call
    // created: afterwards neither the membership nor the VLAN may remain
    let (sim, backend) = vendor_backend(1);
    let port = PortIdentifier::new(1, 5);
    sim.inject_failure(FailRule {
        call: "set_port_attribute",
        port: Some(5),
        attr: Some(port_attr::DEF_VLAN),
        status: SdkStatus::Failure,
    });

    let err = backend.add_vlan_port(vlan(400), &port, false).unwrap_err();
    assert!(matches!(
        err,
        AgentError::State(StateError::CannotAddPort { vlan: 400, .. })
    ));

    assert!(!backend.vlan_exists(vlan(400)).unwrap());
    assert!(sim.members(400).is_empty());
}

#[test]
fn rollback_spares_preexisting_vlan() {
    let (sim, backend) = vendor_backend(1);
    let keeper = PortIdentifier::new(1, 2);
    backend.add_vlan_port(vlan(500), &keeper, true).unwrap();

    let port = PortIdentifier::new(1, 5);
    sim.inject_failure(FailRule {
        call: "add_vlan_port",
        port: Some(5),
        attr: None,
        status: SdkStatus::Failure,
    });
    assert!(backend.add_vlan_port(vlan(500), &port, true).is_err());

    // the VLAN predates the failed call and must survive it
    assert!(backend.vlan_exists(vlan(500)).unwrap());
    assert_eq!(sim.members(500), vec![2]);
}

#[test]
fn unsupported_attributes_stay_distinct_from_unknown() {
    let (_, backend) = vendor_backend(1);
    let port = PortIdentifier::new(1, 3);
    for attr in PortAttribute::UNSUPPORTED {
        let err = backend.port_attribute(&port, attr).unwrap_err();
        assert!(
            matches!(err, AgentError::Capability(CapabilityError::Unsupported(a)) if a == attr),
            "get {attr} produced {err}"
        );
        let err = backend
            .set_port_attribute(&port, attr, &AttributeValue::Number(0))
            .unwrap_err();
        assert!(
            matches!(err, AgentError::Capability(CapabilityError::Unsupported(a)) if a == attr),
            "set {attr} produced {err}"
        );
    }
}

#[test]
fn read_only_attributes_reject_set() {
    let (_, backend) = vendor_backend(1);
    let port = PortIdentifier::new(1, 3);
    for attr in [PortAttribute::OperationalState, PortAttribute::PortIdentifier] {
        let err = backend
            .set_port_attribute(&port, attr, &AttributeValue::Text("x".into()))
            .unwrap_err();
        assert!(matches!(
            err,
            AgentError::Capability(CapabilityError::ReadOnly(_))
        ));
    }
}

#[test]
fn frame_size_is_bounded() {
    let (_, backend) = vendor_backend(1);
    let port = PortIdentifier::new(1, 3);
    backend
        .set_port_attribute(&port, PortAttribute::FrameSize, &AttributeValue::Number(15864))
        .unwrap();
    let err = backend
        .set_port_attribute(&port, PortAttribute::FrameSize, &AttributeValue::Number(15865))
        .unwrap_err();
    assert!(matches!(
        err,
        AgentError::State(StateError::FrameSizeOutOfRange(15865))
    ));
}

#[test]
fn link_state_set_rejects_unknown() {
    let (_, backend) = vendor_backend(1);
    let port = PortIdentifier::new(1, 3);
    let err = backend
        .set_port_attribute(
            &port,
            PortAttribute::LinkState,
            &AttributeValue::Text("Unknown".into()),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        AgentError::State(StateError::InvalidLinkState(_))
    ));
}

#[test]
fn link_state_round_trip() {
    let (_, backend) = vendor_backend(1);
    let port = PortIdentifier::new(1, 3);
    backend
        .set_port_attribute(&port, PortAttribute::LinkState, &AttributeValue::Text("Up".into()))
        .unwrap();
    let state = backend.port_attribute(&port, PortAttribute::LinkState).unwrap();
    assert_eq!(state.as_text(), Some("Up"));
    let oper = backend
        .port_attribute(&port, PortAttribute::OperationalState)
        .unwrap();
    assert_eq!(oper.as_text(), Some("Up"));
}

#[test]
fn speed_set_validates_signaling_mode_first() {
    let (sim, backend) = vendor_backend(1);
    let port = PortIdentifier::new(1, 3);
    // move the port out of SGMII mode
    sim.set_port_attribute(0, 3, port_attr::ETH_IFACE_MODE, eth_mode::BASE_CR_10G);

    let err = backend
        .set_port_attribute(&port, PortAttribute::LinkSpeedGbps, &AttributeValue::Number(10))
        .unwrap_err();
    assert!(matches!(
        err,
        AgentError::State(StateError::WrongSignalingMode { .. })
    ));
}

#[test]
fn speed_set_validates_capability_mask() {
    let (sim, backend) = vendor_backend(1);
    let port = PortIdentifier::new(1, 3);
    sim.set_capabilities(3, speed_cap::GBPS_1); // 10G missing

    let err = backend
        .set_port_attribute(&port, PortAttribute::LinkSpeedGbps, &AttributeValue::Number(10))
        .unwrap_err();
    assert!(matches!(
        err,
        AgentError::State(StateError::SpeedNotSupported { speed: 10, .. })
    ));

    backend
        .set_port_attribute(&port, PortAttribute::LinkSpeedGbps, &AttributeValue::Number(1))
        .unwrap();
    assert_eq!(
        sim.raw_port_attribute(3, port_attr::ETH_IFACE_MODE),
        Some(eth_mode::SGMII)
    );
}

#[test]
fn host_facing_port_special_cases() {
    let (sim, backend) = vendor_backend(1);
    let host_port = PortIdentifier::new(1, 7);

    // speed set is a silent no-op
    backend
        .set_port_attribute(&host_port, PortAttribute::LinkSpeedGbps, &AttributeValue::Number(40))
        .unwrap();
    assert_eq!(sim.raw_port_attribute(7, port_attr::ETH_IFACE_MODE), None);

    // autosense always reads false
    let autoneg = backend
        .port_attribute(&host_port, PortAttribute::Autosense)
        .unwrap();
    assert_eq!(autoneg.as_flag(), Some(false));

    // no learned MAC on the vendor generation
    let mac = backend
        .port_attribute(&host_port, PortAttribute::MacAddress)
        .unwrap();
    assert_eq!(mac.as_text(), Some(""));
}

#[test]
fn vlan_list_reflects_membership() {
    let (_, backend) = vendor_backend(1);
    let port = PortIdentifier::new(1, 3);
    backend.add_vlan_port(vlan(100), &port, true).unwrap();
    backend.add_vlan_port(vlan(7), &port, true).unwrap();

    let list = backend.port_attribute(&port, PortAttribute::VlanList).unwrap();
    let mut vlans = list.as_list().unwrap().to_vec();
    vlans.sort();
    assert_eq!(vlans, vec!["100".to_string(), "7".to_string()]);
}

#[test]
fn port_zero_and_out_of_range_are_absent() {
    let (_, backend) = vendor_backend(1);
    for index in [0u16, 49] {
        let port = PortIdentifier::new(1, index);
        let err = backend
            .port_attribute(&port, PortAttribute::LinkState)
            .unwrap_err();
        assert!(matches!(
            err,
            AgentError::State(StateError::PortNotPresent { .. })
        ));
    }
}
