// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    preparing = { InstanceState::Preparing, false },
    prepare_failed = { InstanceState::PrepareFailed, false },
    starting = { InstanceState::Starting, true },
    running = { InstanceState::Running, true },
    stopped = { InstanceState::Stopped, false },
    boot_failed = { InstanceState::BootFailed, false },
    cancelled = { InstanceState::Cancelled, false },
)]
fn active_states(state: InstanceState, expected: bool) {
    assert_eq!(state.is_active(), expected);
}

#[test]
fn state_serializes_as_screaming_snake_case() {
    let json = serde_json::to_string(&InstanceState::BootFailed).unwrap();
    assert_eq!(json, "\"BOOT_FAILED\"");
    let back: InstanceState = serde_json::from_str("\"PREPARE_FAILED\"").unwrap();
    assert_eq!(back, InstanceState::PrepareFailed);
}

#[test]
fn adb_port_is_offset_by_id() {
    assert_eq!(Instance::new(1, "1", InstanceState::Preparing).adb_port(), 6520);
    assert_eq!(Instance::new(3, "3", InstanceState::Preparing).adb_port(), 6522);
}

#[test]
fn unassigned_id_does_not_underflow_adb_port() {
    assert_eq!(Instance::new(0, "x", InstanceState::Preparing).adb_port(), 6520);
}

#[test]
fn status_json_carries_identity_and_state() {
    let mut instance = Instance::new(2, "phone", InstanceState::Running);
    instance.webrtc_device_id = "cvd-phone-2".to_string();
    let json = instance.status_json();
    assert_eq!(json["id"], 2);
    assert_eq!(json["name"], "phone");
    assert_eq!(json["state"], "RUNNING");
    assert_eq!(json["webrtc_device_id"], "cvd-phone-2");
}
