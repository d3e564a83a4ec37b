// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The instance database: one file holding every group of this user.
//!
//! The on-disk payload is a little-endian u64 length header followed by a
//! JSON document with the ordered group list. Writes go to a temp file in
//! the same directory and are moved into place with a rename. Cross-process
//! writers serialize through an advisory lock on a sibling lock file.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;
use tracing::debug;

use cvd_core::group::{GroupError, GroupParams};
use cvd_core::name::is_valid_group_name;
use cvd_core::{paths, Clock, Instance, InstanceGroup, InstanceState};

use crate::query::Query;

const LENGTH_HEADER: usize = 8;
const DEFAULT_GROUP_NAME: &str = "cvd";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("another group already uses the home directory {0}")]
    DuplicateHome(PathBuf),
    #[error("group name '{0}' is already taken")]
    DuplicateGroupName(String),
    #[error("instance id {0} is already in use by another group")]
    DuplicateInstanceId(u32),
    #[error(transparent)]
    InvalidGroup(#[from] GroupError),
    #[error("no group matches {0}")]
    GroupNotFound(String),
    #[error("{0} matches more than one group")]
    Ambiguous(String),
    #[error("instance database is corrupt: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Instance entry for [`InstanceDatabase::create_instance_group`]. An id of
/// zero means no id has been assigned yet.
#[derive(Debug, Clone)]
pub struct InstanceParams {
    pub id: u32,
    pub name: String,
    pub state: InstanceState,
}

/// Parameters for creating a group. Without a home directory the database
/// assigns a fresh per-user base path; without a group name it picks the
/// first free default name.
#[derive(Debug, Clone, Default)]
pub struct CreateGroupParams {
    pub home: Option<PathBuf>,
    pub host_artifacts_path: PathBuf,
    pub product_out_paths: Vec<PathBuf>,
    pub group_name: Option<String>,
    pub instances: Vec<InstanceParams>,
}

#[derive(Clone)]
pub struct InstanceDatabase {
    db_path: PathBuf,
    lock_path: PathBuf,
}

impl InstanceDatabase {
    /// Database at the well-known per-user location.
    pub fn new() -> Self {
        Self { db_path: paths::instance_database_path(), lock_path: paths::database_lock_path() }
    }

    /// Database backed by explicit paths.
    pub fn at(db_path: impl Into<PathBuf>, lock_path: impl Into<PathBuf>) -> Self {
        Self { db_path: db_path.into(), lock_path: lock_path.into() }
    }

    pub fn has_instance_groups(&self) -> Result<bool, DbError> {
        let _lock = self.lock()?;
        Ok(!self.load_groups()?.is_empty())
    }

    pub fn all_groups(&self) -> Result<Vec<InstanceGroup>, DbError> {
        let _lock = self.lock()?;
        self.load_groups()
    }

    /// Create a group, enforcing the cross-group uniqueness invariants, and
    /// persist the database before returning.
    pub fn create_instance_group(
        &self,
        params: CreateGroupParams,
        clock: &impl Clock,
    ) -> Result<InstanceGroup, DbError> {
        let _lock = self.lock()?;
        let mut groups = self.load_groups()?;

        let home = match params.home {
            Some(home) => home,
            None => paths::home_from_base(&paths::default_base_dir(clock)),
        };
        if groups.iter().any(|g| g.home_dir() == home) {
            return Err(DbError::DuplicateHome(home));
        }

        let group_name = match params.group_name {
            Some(name) if !name.is_empty() => {
                if groups.iter().any(|g| g.group_name() == name) {
                    return Err(DbError::DuplicateGroupName(name));
                }
                name
            }
            _ => default_group_name(&groups),
        };
        if !is_valid_group_name(&group_name) {
            return Err(GroupError::InvalidGroupName(group_name).into());
        }

        for instance in &params.instances {
            if instance.id == 0 {
                continue;
            }
            let taken = groups.iter().any(|g| g.find_instance_by_id(instance.id).is_some());
            if taken {
                return Err(DbError::DuplicateInstanceId(instance.id));
            }
        }

        let group = InstanceGroup::new(GroupParams {
            group_name,
            home_directory: home,
            host_artifacts_path: params.host_artifacts_path,
            product_out_paths: params.product_out_paths,
            instances: params
                .instances
                .into_iter()
                .map(|i| Instance::new(i.id, i.name, i.state))
                .collect(),
        })?;
        debug!(group_name = group.group_name(), home = %group.home_dir().display(), "creating group");

        groups.push(group.clone());
        self.save_groups(&groups)?;
        Ok(group)
    }

    /// Find the single group matching `query`.
    pub fn find_group(&self, query: &Query) -> Result<InstanceGroup, DbError> {
        let matches = self.find_groups(query)?;
        exactly_one(matches, query)
    }

    /// All groups matching `query`, in creation order.
    pub fn find_groups(&self, query: &Query) -> Result<Vec<InstanceGroup>, DbError> {
        let _lock = self.lock()?;
        let groups = self.load_groups()?;
        Ok(groups.into_iter().filter(|g| query.matches(g)).collect())
    }

    /// Replace the record identified by the group's home directory.
    pub fn update_instance_group(&self, group: &InstanceGroup) -> Result<(), DbError> {
        let _lock = self.lock()?;
        let mut groups = self.load_groups()?;
        let Some(slot) = groups.iter_mut().find(|g| g.home_dir() == group.home_dir()) else {
            return Err(DbError::GroupNotFound(format!("home={}", group.home_dir().display())));
        };
        *slot = group.clone();
        self.save_groups(&groups)
    }

    pub fn remove_instance_group_by_home(&self, home: &Path) -> Result<(), DbError> {
        let _lock = self.lock()?;
        let mut groups = self.load_groups()?;
        let before = groups.len();
        groups.retain(|g| g.home_dir() != home);
        if groups.len() == before {
            return Err(DbError::GroupNotFound(format!("home={}", home.display())));
        }
        self.save_groups(&groups)
    }

    fn lock(&self) -> Result<File, DbError> {
        if let Some(parent) = self.lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn load_groups(&self) -> Result<Vec<InstanceGroup>, DbError> {
        let mut file = match File::open(&self.db_path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        if bytes.len() < LENGTH_HEADER {
            return Err(DbError::Corrupt("truncated length header".to_string()));
        }
        let (header, payload) = bytes.split_at(LENGTH_HEADER);
        let mut length_bytes = [0u8; LENGTH_HEADER];
        length_bytes.copy_from_slice(header);
        let length = u64::from_le_bytes(length_bytes) as usize;
        if payload.len() != length {
            return Err(DbError::Corrupt(format!(
                "length header says {length} bytes, found {}",
                payload.len()
            )));
        }
        serde_json::from_slice(payload).map_err(|e| DbError::Corrupt(e.to_string()))
    }

    fn save_groups(&self, groups: &[InstanceGroup]) -> Result<(), DbError> {
        let payload = serde_json::to_vec(groups).map_err(|e| DbError::Corrupt(e.to_string()))?;
        let Some(parent) = self.db_path.parent() else {
            return Err(DbError::Corrupt("database path has no parent".to_string()));
        };
        std::fs::create_dir_all(parent)?;
        let temp_path = self.db_path.with_extension("binpb.tmp");
        {
            let mut temp = File::create(&temp_path)?;
            temp.write_all(&(payload.len() as u64).to_le_bytes())?;
            temp.write_all(&payload)?;
            temp.sync_all()?;
        }
        std::fs::rename(&temp_path, &self.db_path)?;
        debug!(groups = groups.len(), path = %self.db_path.display(), "database persisted");
        Ok(())
    }
}

impl Default for InstanceDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// First free name in the `cvd`, `cvd_1`, `cvd_2`, … sequence.
fn default_group_name(groups: &[InstanceGroup]) -> String {
    let taken: std::collections::HashSet<&str> =
        groups.iter().map(InstanceGroup::group_name).collect();
    if !taken.contains(DEFAULT_GROUP_NAME) {
        return DEFAULT_GROUP_NAME.to_string();
    }
    (1..)
        .map(|n| format!("{DEFAULT_GROUP_NAME}_{n}"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| DEFAULT_GROUP_NAME.to_string())
}

fn exactly_one(mut matches: Vec<InstanceGroup>, query: &Query) -> Result<InstanceGroup, DbError> {
    match matches.len() {
        0 => Err(DbError::GroupNotFound(query.describe())),
        1 => Ok(matches.remove(0)),
        _ => Err(DbError::Ambiguous(query.describe())),
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
