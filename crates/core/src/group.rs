// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance groups: co-located devices sharing HOME and host artifacts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::instance::{Instance, InstanceState};
use crate::name::{is_valid_group_name, is_valid_instance_name};
use crate::paths;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupError {
    #[error("a group must have at least one instance")]
    NoInstances,
    #[error("invalid group name '{0}'")]
    InvalidGroupName(String),
    #[error("invalid instance name '{0}'")]
    InvalidInstanceName(String),
    #[error("instances must have unique ids, found '{0}' repeated")]
    DuplicateInstanceId(u32),
    #[error("instances must have unique names, found '{0}' repeated")]
    DuplicateInstanceName(String),
    #[error("a group needs at least one product out path")]
    NoProductOutPaths,
}

/// Parameters for building a group record. Paths must already be resolved.
#[derive(Debug, Clone)]
pub struct GroupParams {
    pub group_name: String,
    pub home_directory: PathBuf,
    pub host_artifacts_path: PathBuf,
    pub product_out_paths: Vec<PathBuf>,
    pub instances: Vec<Instance>,
}

/// A set of instances deployed together. The group exclusively owns its
/// instances; they are only reachable and mutable through it. The home
/// directory doubles as the group's primary key in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceGroup {
    group_name: String,
    home_directory: PathBuf,
    host_artifacts_path: PathBuf,
    product_out_paths: Vec<PathBuf>,
    start_time_secs: i64,
    instances: Vec<Instance>,
}

impl InstanceGroup {
    pub fn new(params: GroupParams) -> Result<Self, GroupError> {
        if params.instances.is_empty() {
            return Err(GroupError::NoInstances);
        }
        if !is_valid_group_name(&params.group_name) {
            return Err(GroupError::InvalidGroupName(params.group_name));
        }
        let mut ids = std::collections::HashSet::new();
        let mut names = std::collections::HashSet::new();
        for instance in &params.instances {
            if !is_valid_instance_name(&instance.name) {
                return Err(GroupError::InvalidInstanceName(instance.name.clone()));
            }
            // Zero means unassigned, only real ids are checked for uniqueness.
            if instance.id != 0 && !ids.insert(instance.id) {
                return Err(GroupError::DuplicateInstanceId(instance.id));
            }
            if !names.insert(instance.name.clone()) {
                return Err(GroupError::DuplicateInstanceName(instance.name.clone()));
            }
        }
        let mut product_out_paths = params.product_out_paths;
        let first = match product_out_paths.first() {
            Some(first) => first.clone(),
            None => return Err(GroupError::NoProductOutPaths),
        };
        // Fewer paths than instances: repeat the first so multiple identical
        // devices can launch from a single set of images.
        while product_out_paths.len() < params.instances.len() {
            product_out_paths.push(first.clone());
        }
        product_out_paths.truncate(params.instances.len());

        Ok(Self {
            group_name: params.group_name,
            home_directory: params.home_directory,
            host_artifacts_path: params.host_artifacts_path,
            product_out_paths,
            start_time_secs: 0,
            instances: params.instances,
        })
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_directory
    }

    pub fn host_artifacts_path(&self) -> &Path {
        &self.host_artifacts_path
    }

    pub fn product_out_paths(&self) -> &[PathBuf] {
        &self.product_out_paths
    }

    /// Comma-joined product out list, the form helper tools expect in
    /// `ANDROID_PRODUCT_OUT`.
    pub fn product_out_env(&self) -> String {
        self.product_out_paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn instances_mut(&mut self) -> &mut [Instance] {
        &mut self.instances
    }

    pub fn has_active_instances(&self) -> bool {
        self.instances.iter().any(Instance::is_active)
    }

    pub fn set_all_states(&mut self, state: InstanceState) {
        for instance in &mut self.instances {
            instance.state = state;
        }
    }

    pub fn start_time_secs(&self) -> i64 {
        self.start_time_secs
    }

    pub fn set_start_time_secs(&mut self, secs: i64) {
        self.start_time_secs = secs;
    }

    pub fn find_instance_by_id(&self, id: u32) -> Option<&Instance> {
        self.instances.iter().find(|i| i.id == id)
    }

    pub fn find_by_instance_name(&self, name: &str) -> Vec<Instance> {
        self.instances.iter().filter(|i| i.name == name).cloned().collect()
    }

    /// The base directory is always the parent of the home directory.
    pub fn base_dir(&self) -> PathBuf {
        self.home_directory
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.home_directory.clone())
    }

    pub fn assembly_dir(&self) -> PathBuf {
        paths::assembly_dir_from_home(&self.home_directory)
    }

    pub fn metrics_dir(&self) -> PathBuf {
        self.home_directory.join("metrics")
    }

    /// Status document printed on stdout after `create`/`start`.
    pub fn status_json(&self) -> serde_json::Value {
        let start_time = chrono::DateTime::from_timestamp(self.start_time_secs, 0)
            .unwrap_or_default()
            .to_rfc3339();
        serde_json::json!({
            "group_name": self.group_name,
            "metrics_dir": self.metrics_dir(),
            "start_time": start_time,
            "instances": self.instances.iter().map(Instance::status_json).collect::<Vec<_>>(),
        })
    }
}

crate::builder! {
    pub struct InstanceGroupBuilder => InstanceGroup {
        into {
            group_name: String = "test_group",
            home_directory: PathBuf = "/tmp/cvd/1/1234/home",
            host_artifacts_path: PathBuf = "/tmp/cvd/1/1234/artifacts/host_tools",
        }
        set {
            product_out_paths: Vec<PathBuf> = vec![PathBuf::from("/tmp/cvd/1/1234/artifacts/0")],
            start_time_secs: i64 = 0,
            instances: Vec<Instance> = vec![Instance::new(1, "1", InstanceState::Preparing)],
        }
    }
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;
