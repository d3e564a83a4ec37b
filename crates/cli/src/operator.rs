// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pre-registration with the operator's control socket.
//!
//! One JSON request and one JSON response over a SEQPACKET socket. The
//! connection must stay open until the instances have booted and
//! registered themselves, so the caller holds on to the returned
//! connection; dropping it earlier discards the pre-registration.

use std::os::fd::{AsRawFd, OwnedFd};
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use nix::sys::socket::{connect, socket, AddressFamily, SockFlag, SockType, UnixAddr};
use serde_json::json;
use tracing::debug;

use cvd_core::InstanceGroup;

pub const DEFAULT_OPERATOR_CONTROL_SOCKET: &str = "/run/cuttlefish/operator_control";

const RESPONSE_BUF_SIZE: usize = 4096;

pub struct OperatorControlConn {
    fd: OwnedFd,
}

impl OperatorControlConn {
    pub fn connect(socket_path: &Path) -> Result<Self> {
        let fd = socket(AddressFamily::Unix, SockType::SeqPacket, SockFlag::empty(), None)
            .context("failed to create control socket")?;
        let addr = UnixAddr::new(socket_path).context("invalid control socket path")?;
        connect(fd.as_raw_fd(), &addr).with_context(|| {
            format!("failed to connect to control socket {}", socket_path.display())
        })?;
        Ok(Self { fd })
    }

    /// Wrap an already-connected socket, for tests talking over a pair.
    pub(crate) fn from_fd(fd: OwnedFd) -> Self {
        Self { fd }
    }

    /// Pre-register the group's devices so UI front-ends list them before
    /// they boot. Any rejected device fails the whole call.
    pub fn preregister(&self, group: &InstanceGroup, owner: &str) -> Result<()> {
        let devices: Vec<serde_json::Value> = group
            .instances()
            .iter()
            .map(|instance| {
                json!({
                    "id": instance.webrtc_device_id,
                    "name": instance.name,
                    "adb_port": instance.adb_port(),
                })
            })
            .collect();
        let msg = json!({
            "message_type": "pre-register",
            "group_name": group.group_name(),
            "owner": owner,
            "devices": devices,
        });
        self.send(&msg).context("failed to send pre-registration message to operator")?;
        let response = self.recv().context("error receiving pre-registration response")?;

        let entries = response.as_array().cloned().unwrap_or_default();
        let mut errors = Vec::new();
        for entry in entries {
            let status = entry["status"].as_str().unwrap_or("");
            if status != "accepted" {
                errors.push(format!(
                    "id: {}, status: {}, message: {}",
                    entry["id"].as_str().unwrap_or(""),
                    status,
                    entry["message"].as_str().unwrap_or("")
                ));
            }
        }
        if !errors.is_empty() {
            bail!("operator reported error pre-registering instances:\n{}", errors.join("\n"));
        }
        debug!(group_name = group.group_name(), "group pre-registered with operator");
        Ok(())
    }

    fn send(&self, msg: &serde_json::Value) -> Result<()> {
        use std::io::Write;
        let buf = serde_json::to_vec(msg)?;
        let mut stream = std::fs::File::from(self.fd.try_clone()?);
        stream.write_all(&buf)?;
        Ok(())
    }

    fn recv(&self) -> Result<serde_json::Value> {
        use std::io::Read;
        let mut buf = vec![0u8; RESPONSE_BUF_SIZE];
        let mut stream = std::fs::File::from(self.fd.try_clone()?);
        let read = stream.read(&mut buf)?;
        if read == 0 {
            bail!("the operator closed the connection without responding");
        }
        serde_json::from_slice(&buf[..read]).context("failed to parse operator response")
    }
}

#[cfg(test)]
#[path = "operator_tests.rs"]
mod tests;
