// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single virtual device within an instance group.

use serde::{Deserialize, Serialize};

/// First ADB port; instance N listens on `ADB_BASE_PORT + N - 1`.
const ADB_BASE_PORT: u16 = 6520;

/// Lifecycle state of one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceState {
    Preparing,
    PrepareFailed,
    Starting,
    Running,
    Stopped,
    BootFailed,
    Cancelled,
}

crate::simple_display! {
    InstanceState {
        Preparing => "PREPARING",
        PrepareFailed => "PREPARE_FAILED",
        Starting => "STARTING",
        Running => "RUNNING",
        Stopped => "STOPPED",
        BootFailed => "BOOT_FAILED",
        Cancelled => "CANCELLED",
    }
}

impl InstanceState {
    /// An instance is active while it boots or runs.
    pub fn is_active(self) -> bool {
        matches!(self, InstanceState::Starting | InstanceState::Running)
    }
}

/// One virtual device. Owned and mutated exclusively through its group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Numeric id, unique across all instances of this user. Zero means
    /// the id has not been assigned yet.
    pub id: u32,
    /// Human name, unique within the owning group.
    pub name: String,
    pub state: InstanceState,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub webrtc_device_id: String,
}

impl Instance {
    pub fn new(id: u32, name: impl Into<String>, state: InstanceState) -> Self {
        Self { id, name: name.into(), state, webrtc_device_id: String::new() }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// The host port adb for this instance listens on.
    pub fn adb_port(&self) -> u16 {
        ADB_BASE_PORT + (self.id as u16).saturating_sub(1)
    }

    pub fn status_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "state": self.state.to_string(),
            "webrtc_device_id": self.webrtc_device_id,
            "adb_port": self.adb_port(),
        })
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
