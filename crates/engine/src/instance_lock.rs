// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-instance numeric-id lock files.
//!
//! One well-known lock file exists per candidate id. Acquiring the lock
//! reserves the id for the lifetime of the owning command; the lock is
//! released when the [`InstanceLock`] is dropped.

use std::fs::File;
use std::path::PathBuf;

use fs2::FileExt;
use thiserror::Error;
use tracing::debug;

/// Highest id probed when allocating unused ids.
const MAX_PROBED_ID: u32 = 100;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("could not reserve {needed} instance ids, only {found} were free")]
    Exhausted { needed: usize, found: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// An acquired id reservation. Dropping releases the OS lock.
#[derive(Debug)]
pub struct InstanceLock {
    id: u32,
    _file: File,
}

impl InstanceLock {
    pub fn id(&self) -> u32 {
        self.id
    }
}

pub struct InstanceLockManager {
    dir: PathBuf,
}

impl InstanceLockManager {
    /// Manager over the well-known lock directory.
    pub fn new() -> Self {
        Self { dir: cvd_core::paths::instance_locks_dir() }
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Try to reserve one specific id. Returns `None` when another process
    /// holds it.
    pub fn try_acquire(&self, id: u32) -> Result<Option<InstanceLock>, LockError> {
        std::fs::create_dir_all(&self.dir)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path(id))?;
        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(id, "reserved instance id");
                Ok(Some(InstanceLock { id, _file: file }))
            }
            Err(_) => Ok(None),
        }
    }

    /// Reserve `count` free ids, lowest first.
    pub fn acquire_unused(&self, count: usize) -> Result<Vec<InstanceLock>, LockError> {
        let mut locks = Vec::with_capacity(count);
        for id in 1..=MAX_PROBED_ID {
            if locks.len() == count {
                break;
            }
            if let Some(lock) = self.try_acquire(id)? {
                locks.push(lock);
            }
        }
        if locks.len() < count {
            return Err(LockError::Exhausted { needed: count, found: locks.len() });
        }
        Ok(locks)
    }

    fn lock_path(&self, id: u32) -> PathBuf {
        self.dir.join(format!("local-instance-{id}.lock"))
    }
}

impl Default for InstanceLockManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "instance_lock_tests.rs"]
mod tests;
