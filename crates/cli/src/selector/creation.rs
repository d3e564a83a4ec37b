// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composing group creation parameters from parsed options and the
//! environment.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tracing::warn;

use cvd_core::env::ANDROID_PRODUCT_OUT;
use cvd_core::resolver::android_host_path;
use cvd_core::{Envs, InstanceState};
use cvd_engine::{InstanceLock, InstanceLockManager};
use cvd_storage::{CreateGroupParams, InstanceParams};

use crate::selector::start::StartOptions;

/// Everything `create` needs: database input plus the id reservations,
/// which must stay alive until the command finishes.
#[derive(Debug)]
pub struct GroupCreation {
    pub params: CreateGroupParams,
    pub id_locks: Vec<InstanceLock>,
}

/// Figure out the HOME directory. Only a HOME different from the
/// system-wide one counts as user-chosen; otherwise the database assigns
/// a generated base path.
fn analyze_home(envs: &Envs) -> Result<Option<PathBuf>> {
    let Some(home) = envs.get("HOME").filter(|h| !h.is_empty()) else {
        return Ok(None);
    };
    if dirs::home_dir().is_some_and(|system| system.as_os_str() == home.as_str()) {
        return Ok(None);
    }
    std::fs::create_dir_all(home)
        .context("provided home directory doesn't exist and can't be created")?;
    Ok(Some(PathBuf::from(home)))
}

fn product_out_paths(envs: &Envs, host_artifacts: &Path, num_instances: usize) -> Vec<PathBuf> {
    match envs.get(ANDROID_PRODUCT_OUT) {
        Some(value) if !value.is_empty() => {
            let mut paths: Vec<PathBuf> = value.split(',').map(PathBuf::from).collect();
            if paths.len() > num_instances {
                warn!(
                    provided = paths.len(),
                    num_instances, "more product paths provided than instances being created"
                );
                paths.truncate(num_instances);
            }
            paths
        }
        _ => vec![host_artifacts.to_path_buf()],
    }
}

/// Compose `CreateGroupParams` from the start options and environment,
/// reserving instance ids through the lock allocator when they are not
/// fixed by flags.
pub fn analyze_creation(
    options: &StartOptions,
    envs: &Envs,
    lock_manager: &InstanceLockManager,
) -> Result<GroupCreation> {
    let n = options.requested_num_instances;
    let mut id_locks = Vec::new();
    let ids: Vec<u32> = match &options.instance_ids {
        Some(ids) => {
            if options.acquire_file_lock {
                for id in ids {
                    if let Some(lock) = lock_manager.try_acquire(*id)? {
                        id_locks.push(lock);
                    } else {
                        anyhow::bail!("instance id {id} is locked by another command");
                    }
                }
            }
            ids.clone()
        }
        None if options.acquire_file_lock => {
            id_locks = lock_manager.acquire_unused(n)?;
            id_locks.iter().map(InstanceLock::id).collect()
        }
        None => (1..=n as u32).collect(),
    };

    let instances: Vec<InstanceParams> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| InstanceParams {
            id: *id,
            name: match options.instance_names.as_ref().and_then(|names| names.get(i)) {
                Some(name) => name.clone(),
                None => id.to_string(),
            },
            state: InstanceState::Preparing,
        })
        .collect();

    let host_artifacts_path = android_host_path(envs).context(
        "\nTry running this command from the same directory as the downloaded or fetched host \
         tools",
    )?;
    let params = CreateGroupParams {
        home: analyze_home(envs)?,
        product_out_paths: product_out_paths(envs, &host_artifacts_path, instances.len()),
        host_artifacts_path,
        group_name: options.group_name.clone(),
        instances,
    };
    Ok(GroupCreation { params, id_locks })
}

#[cfg(test)]
#[path = "creation_tests.rs"]
mod tests;
