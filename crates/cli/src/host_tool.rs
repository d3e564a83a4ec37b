// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovery of helper binaries shipped with a host artifacts tree.
//!
//! Helper names vary between branches, so each operation carries a list
//! of alternatives tried in order. Flag support is probed through the
//! gflags `--helpxml` output.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};

use cvd_core::env::{ANDROID_HOST_OUT, ANDROID_SOONG_HOST_OUT};
use cvd_core::resolver::find_binary;
use cvd_core::Envs;
use cvd_engine::{run_managed, CommandSpec, ExitStatus};

pub struct HostToolTarget {
    artifacts_path: PathBuf,
}

impl HostToolTarget {
    pub fn new(artifacts_path: impl Into<PathBuf>) -> Self {
        Self { artifacts_path: artifacts_path.into() }
    }

    pub fn start_bin(&self) -> Result<String> {
        self.bin_name(&["cvd_internal_start", "launch_cvd"])
    }

    pub fn stop_bin(&self) -> Result<String> {
        self.bin_name(&["cvd_internal_stop", "stop_cvd"])
    }

    pub fn restart_bin(&self) -> Result<String> {
        self.bin_name(&["restart_cvd"])
    }

    pub fn powerwash_bin(&self) -> Result<String> {
        self.bin_name(&["powerwash_cvd"])
    }

    pub fn powerbtn_bin(&self) -> Result<String> {
        self.bin_name(&["powerbtn_cvd"])
    }

    pub fn bin_path(&self, bin_name: &str) -> PathBuf {
        self.artifacts_path.join("bin").join(bin_name)
    }

    fn bin_name(&self, alternatives: &[&str]) -> Result<String> {
        Ok(find_binary(&self.artifacts_path, alternatives)?)
    }

    /// Whether the tool supports a flag, decided from its `--helpxml`
    /// output. Runs the tool with captured stdio.
    pub fn supports_flag(&self, bin_name: &str, flag_name: &str) -> Result<bool> {
        let mut envs = Envs::new();
        envs.insert(
            ANDROID_HOST_OUT.to_string(),
            self.artifacts_path.to_string_lossy().into_owned(),
        );
        envs.insert(
            ANDROID_SOONG_HOST_OUT.to_string(),
            self.artifacts_path.to_string_lossy().into_owned(),
        );
        let spec = CommandSpec::new(self.bin_path(bin_name)).args(["--helpxml"]).envs(envs);
        let (xml, stderr, status) = run_managed(&spec, None)
            .with_context(|| format!("failed to probe '{bin_name}' flags"))?;
        // gflags exits with 1 after printing the helpxml document.
        if !matches!(status, ExitStatus::NormalExit(0) | ExitStatus::NormalExit(1)) {
            bail!("'{bin_name} --helpxml' failed: {}", stderr.trim());
        }
        Ok(helpxml_flag_names(&xml).iter().any(|name| name == flag_name))
    }
}

/// Extract `<name>…</name>` entries from a gflags helpxml document.
fn helpxml_flag_names(xml: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find("<name>") {
        rest = &rest[start + "<name>".len()..];
        let Some(end) = rest.find("</name>") else {
            break;
        };
        names.push(rest[..end].trim().to_string());
        rest = &rest[end..];
    }
    names
}

/// Locate the host tool directory, then the first available alternative.
pub fn bin_from_env(envs: &Envs, alternatives: &[&str]) -> Result<(PathBuf, String)> {
    let artifacts = cvd_core::resolver::android_host_path(envs)?;
    let bin = find_binary(&artifacts, alternatives)?;
    Ok((artifacts, bin))
}

/// Path helper for a tool under an arbitrary artifacts directory.
pub fn tool_path(artifacts: &Path, bin_name: &str) -> PathBuf {
    artifacts.join("bin").join(bin_name)
}

#[cfg(test)]
#[path = "host_tool_tests.rs"]
mod tests;
