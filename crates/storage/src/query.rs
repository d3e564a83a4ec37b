// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group lookup queries.

use std::path::PathBuf;

use cvd_core::InstanceGroup;

/// Optional lookup criteria for a group. Every field that is set must
/// match; an empty query matches every group.
#[derive(Debug, Default, Clone)]
pub struct Query {
    pub home: Option<PathBuf>,
    pub group_name: Option<String>,
    pub instance_id: Option<u32>,
    pub instance_name: Option<String>,
}

impl Query {
    pub fn home(home: impl Into<PathBuf>) -> Self {
        Self { home: Some(home.into()), ..Self::default() }
    }

    pub fn group_name(name: impl Into<String>) -> Self {
        Self { group_name: Some(name.into()), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.home.is_none()
            && self.group_name.is_none()
            && self.instance_id.is_none()
            && self.instance_name.is_none()
    }

    pub fn matches(&self, group: &InstanceGroup) -> bool {
        if let Some(home) = &self.home {
            if group.home_dir() != home {
                return false;
            }
        }
        if let Some(name) = &self.group_name {
            if group.group_name() != name {
                return false;
            }
        }
        if let Some(id) = self.instance_id {
            if group.find_instance_by_id(id).is_none() {
                return false;
            }
        }
        if let Some(name) = &self.instance_name {
            if group.find_by_instance_name(name).is_empty() {
                return false;
            }
        }
        true
    }

    /// Human description used in lookup error messages.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(home) = &self.home {
            parts.push(format!("home={}", home.display()));
        }
        if let Some(name) = &self.group_name {
            parts.push(format!("group_name={name}"));
        }
        if let Some(id) = self.instance_id {
            parts.push(format!("instance_id={id}"));
        }
        if let Some(name) = &self.instance_name {
            parts.push(format!("instance_name={name}"));
        }
        if parts.is_empty() {
            "any group".to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
