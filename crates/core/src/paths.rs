// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Well-known directory layout for per-user cvd state.
//!
//! Everything lives under the per-user data directory, one subdirectory per
//! group keyed by creation time:
//!
//! ```text
//! <data-dir>/instance_database.binpb
//! <data-dir>/<monotonic-time>/home/            group HOME
//! <data-dir>/<monotonic-time>/artifacts/host_tools/
//! <data-dir>/<monotonic-time>/artifacts/<i>/   per-instance product out
//! ```

use std::path::{Path, PathBuf};

use crate::clock::Clock;
use crate::env::CVD_DATA_DIR;
use crate::resolver::PathError;

/// Per-user data directory. `/tmp/cvd/<uid>` unless relocated through
/// `CVD_DATA_DIR`.
pub fn per_user_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CVD_DATA_DIR) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    PathBuf::from("/tmp/cvd").join(nix::unistd::getuid().to_string())
}

pub fn instance_database_path() -> PathBuf {
    per_user_dir().join("instance_database.binpb")
}

pub fn database_lock_path() -> PathBuf {
    per_user_dir().join("instance_database.lock")
}

/// Directory holding one lock file per candidate instance id.
pub fn instance_locks_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CVD_DATA_DIR) {
        if !dir.is_empty() {
            return PathBuf::from(dir).join("instance_locks");
        }
    }
    PathBuf::from("/tmp/acloud_cvd_temp")
}

/// Fresh base directory for a group created now.
pub fn default_base_dir(clock: &impl Clock) -> PathBuf {
    per_user_dir().join(clock.epoch_nanos().to_string())
}

pub fn home_from_base(base: &Path) -> PathBuf {
    base.join("home")
}

pub fn artifacts_dir_from_base(base: &Path) -> PathBuf {
    base.join("artifacts")
}

pub fn host_artifacts_from_base(base: &Path) -> PathBuf {
    artifacts_dir_from_base(base).join("host_tools")
}

pub fn product_out_from_base(base: &Path, instance_index: usize) -> PathBuf {
    artifacts_dir_from_base(base).join(instance_index.to_string())
}

pub fn assembly_dir_from_home(home: &Path) -> PathBuf {
    home.join("cuttlefish/assembly")
}

/// Recover the group base directory from its home directory.
pub fn group_dir_from_home(home: &Path) -> Result<PathBuf, PathError> {
    // Path::file_name/parent already tolerate a trailing slash.
    if home.file_name().is_some_and(|n| n == "home") {
        if let Some(parent) = home.parent() {
            return Ok(parent.to_path_buf());
        }
    }
    Err(PathError::BadPath(format!("unexpected group home directory: {}", home.display())))
}

/// First writable parent directory for auto-generated homes, tried in order:
/// TMPDIR, TEMP, TMP, /tmp, /var/tmp, /usr/tmp, the system home, cwd.
pub fn parent_of_autogenerated_homes() -> Result<PathBuf, PathError> {
    let mut candidates: Vec<PathBuf> = ["TMPDIR", "TEMP", "TMP"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .collect();
    candidates.extend(["/tmp", "/var/tmp", "/usr/tmp"].iter().map(PathBuf::from));
    if let Some(home) = dirs::home_dir() {
        candidates.push(home);
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd);
    }
    for candidate in candidates {
        if std::fs::create_dir_all(&candidate).is_err() {
            continue;
        }
        if is_read_writable(&candidate) {
            return Ok(candidate);
        }
    }
    Err(PathError::NotFound(
        "tried all candidate directories but none was read-writable".to_string(),
    ))
}

fn is_read_writable(dir: &Path) -> bool {
    use nix::unistd::AccessFlags;
    nix::unistd::access(dir, AccessFlags::R_OK | AccessFlags::W_OK | AccessFlags::X_OK).is_ok()
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
