// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable names observed by cvd and its helper tools.

use std::collections::HashMap;

/// Snapshot of the process environment handed to handlers and helper tools.
pub type Envs = HashMap<String, String>;

/// Points to the host out directory of an Android build.
pub const ANDROID_HOST_OUT: &str = "ANDROID_HOST_OUT";
/// `ANDROID_HOST_OUT` for old branches.
pub const ANDROID_SOONG_HOST_OUT: &str = "ANDROID_SOONG_HOST_OUT";
/// Comma-separated guest image directories, one per instance.
pub const ANDROID_PRODUCT_OUT: &str = "ANDROID_PRODUCT_OUT";
/// Implicit base instance number for launcher tools.
pub const CUTTLEFISH_INSTANCE: &str = "CUTTLEFISH_INSTANCE";
/// Marks helper invocations as initiated by cvd.
pub const CVD_MARK: &str = "_STARTED_BY_CVD_SERVER_";
/// Overrides the `--acquire_file_lock` selector flag default.
pub const CVD_ACQUIRE_FILE_LOCK: &str = "CVD_ACQUIRE_FILE_LOCK";
/// Relocates the per-user data directory (database, generated homes, locks).
pub const CVD_DATA_DIR: &str = "CVD_DATA_DIR";

/// Capture the current process environment as an [`Envs`] map.
pub fn snapshot() -> Envs {
    std::env::vars().collect()
}
