// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fetch flag emission for the optional artifact download step.

use serde_json::Value;

use crate::emit::{any_instance_has, joined_flag, str_or};
use crate::LoadDirectories;

const BUILD_FIELDS: [&str; 6] = [
    "default_build",
    "otatools_build",
    "host_package_build",
    "boot_build",
    "kernel_build",
    "bootloader_build",
];

/// Flags for the fetch invocation. Empty (no fetch step) unless at least
/// one instance names a remote build.
pub(crate) fn fetch_flags(
    config: &Value,
    instances: &[Value],
    directories: &LoadDirectories,
) -> Vec<String> {
    let wants_fetch =
        BUILD_FIELDS.iter().any(|field| any_instance_has(instances, &format!("/disk/{field}")));
    if !wants_fetch {
        return Vec::new();
    }

    let mut flags =
        vec![format!("--target_directory={}", directories.target_directory.display())];
    if let Some(fetch) = config.get("fetch").and_then(Value::as_object) {
        if let Some(api_key) = fetch.get("api_key").and_then(Value::as_str) {
            flags.push(format!("--api_key={api_key}"));
        }
        if let Some(source) = fetch.get("credential_source").and_then(Value::as_str) {
            flags.push(format!("--credential_source={source}"));
        }
        if let Some(period) = fetch.get("wait_retry_period").and_then(Value::as_u64) {
            flags.push(format!("--wait_retry_period={period}"));
        }
        if let Some(keep) = fetch.get("keep_downloaded_archives").and_then(Value::as_bool) {
            flags.push(format!("--keep_downloaded_archives={keep}"));
        }
    }
    flags.push(format!(
        "--target_subdirectory={}",
        directories.target_subdirectories.join(",")
    ));
    for field in BUILD_FIELDS {
        let pointer = format!("/disk/{field}");
        if any_instance_has(instances, &pointer) {
            flags.push(joined_flag(field, instances, |i| str_or(i, &pointer, "")));
        }
    }
    if any_instance_has(instances, "/disk/download_img_zip") {
        flags.push(joined_flag("download_img_zip", instances, |i| {
            match i.pointer("/disk/download_img_zip") {
                Some(Value::Bool(b)) => b.to_string(),
                _ => String::new(),
            }
        }));
    }
    flags
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
