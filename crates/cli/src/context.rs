// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared handler dependencies, constructed once at startup.

use cvd_core::SystemClock;
use cvd_storage::InstanceDatabase;

/// Explicitly-constructed dependencies passed into every handler; there
/// are no global singletons behind these.
pub struct Context {
    pub db: InstanceDatabase,
    pub clock: SystemClock,
}

impl Context {
    pub fn new() -> Self {
        Self { db: InstanceDatabase::new(), clock: SystemClock }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
