// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sub-command implementations

pub mod bugreport;
pub mod create;
pub mod env;
pub mod fetch;
pub mod load;
pub mod power;
pub mod remove;
pub mod start;
pub mod stop;

use anyhow::Result;
use thiserror::Error;

use cvd_core::Envs;
use cvd_core::InstanceGroup;
use cvd_engine::{check_normal_exit, ExitStatus};

/// A forwarded helper tool finished on its own terms; the cvd process
/// exits with the helper's code instead of the generic failure status.
#[derive(Debug, Error)]
#[error("{tool} exited with code {code}")]
pub(crate) struct HelperExit {
    pub tool: &'static str,
    pub code: i32,
}

/// Map a forwarding helper's exit status: success passes through, a
/// normal non-zero exit becomes [`HelperExit`], signals stay errors.
pub(crate) fn forward_helper_exit(tool: &'static str, status: ExitStatus) -> Result<()> {
    match status {
        ExitStatus::NormalExit(0) => Ok(()),
        ExitStatus::NormalExit(code) => Err(HelperExit { tool, code }.into()),
        other => {
            check_normal_exit(tool, other, 0)?;
            Ok(())
        }
    }
}

/// Message shown when a command needs a group but none exists yet.
pub(crate) fn no_group_message(subcommand: &str) -> String {
    format!("there are no device groups to run '{subcommand}' on, create one with 'cvd create'")
}

/// Environment for a helper tool operating on an existing group.
pub(crate) fn group_env(base: &Envs, group: &InstanceGroup) -> Envs {
    use cvd_core::env::{ANDROID_HOST_OUT, ANDROID_SOONG_HOST_OUT};
    let mut envs = base.clone();
    envs.insert("HOME".to_string(), group.home_dir().to_string_lossy().into_owned());
    envs.insert(
        ANDROID_HOST_OUT.to_string(),
        group.host_artifacts_path().to_string_lossy().into_owned(),
    );
    envs.insert(
        ANDROID_SOONG_HOST_OUT.to_string(),
        group.host_artifacts_path().to_string_lossy().into_owned(),
    );
    envs
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
