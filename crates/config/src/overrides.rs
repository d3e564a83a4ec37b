// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `--override=path:value` edits applied to the parsed config.

use serde_json::Value;

use crate::ConfigError;

/// A single override: a dot-separated path into the document and the new
/// leaf value. Numeric segments index into arrays. The value is parsed as
/// JSON when possible and falls back to a plain string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigOverride {
    path: Vec<String>,
    value: String,
}

impl ConfigOverride {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let Some((path, value)) = raw.split_once(':') else {
            return Err(ConfigError::BadOverride(raw.to_string()));
        };
        if path.is_empty() || value.is_empty() {
            return Err(ConfigError::BadOverride(raw.to_string()));
        }
        Ok(Self {
            path: path.split('.').map(str::to_string).collect(),
            value: value.to_string(),
        })
    }

    /// Set the addressed leaf, creating intermediate objects as needed.
    pub fn apply(&self, config: &mut Value) -> Result<(), ConfigError> {
        let mut node = config;
        for segment in &self.path {
            node = match segment.parse::<usize>() {
                Ok(index) => {
                    let items = node.as_array_mut().ok_or_else(|| self.bad())?;
                    items.get_mut(index).ok_or_else(|| self.bad())?
                }
                Err(_) => {
                    if !node.is_object() {
                        return Err(self.bad());
                    }
                    let map = node.as_object_mut().ok_or_else(|| self.bad())?;
                    map.entry(segment.clone()).or_insert(Value::Object(Default::default()))
                }
            };
        }
        *node = leaf_value(&self.value);
        Ok(())
    }

    fn bad(&self) -> ConfigError {
        ConfigError::BadOverride(format!("{}:{}", self.path.join("."), self.value))
    }
}

fn leaf_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
#[path = "overrides_tests.rs"]
mod tests;
