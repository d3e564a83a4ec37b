// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forced cleanup of stray device processes.
//!
//! When a launch fails the launcher may leave device processes running in
//! the background. They are found by scanning `/proc` for processes whose
//! environment names the instance, and their process groups are killed.
//! This never runs the stop helper, which could hang forever.

use nix::sys::signal::{killpg, Signal};
use nix::unistd::{getpgid, Pid};
use tracing::{debug, warn};

use cvd_core::env::CUTTLEFISH_INSTANCE;

/// SIGKILL every process group owning a process marked with the given
/// instance id. Best-effort: unreadable proc entries are skipped.
pub fn forcefully_stop_instance(instance_id: u32) -> Result<(), std::io::Error> {
    let marker = format!("{CUTTLEFISH_INSTANCE}={instance_id}");
    let own_pid = std::process::id() as i32;
    let mut groups = std::collections::HashSet::new();

    for entry in std::fs::read_dir("/proc")? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(pid) = name.to_str().and_then(|n| n.parse::<i32>().ok()) else {
            continue;
        };
        if pid == own_pid {
            continue;
        }
        let Ok(environ) = std::fs::read(entry.path().join("environ")) else {
            continue;
        };
        let found = environ
            .split(|b| *b == 0)
            .any(|var| var == marker.as_bytes());
        if !found {
            continue;
        }
        match getpgid(Some(Pid::from_raw(pid))) {
            Ok(pgid) => {
                groups.insert(pgid);
            }
            Err(e) => debug!(pid, error = %e, "could not resolve process group"),
        }
    }

    for pgid in groups {
        warn!(pgid = pgid.as_raw(), instance_id, "force-killing stray device process group");
        let _ = killpg(pgid, Signal::SIGKILL);
    }
    Ok(())
}
