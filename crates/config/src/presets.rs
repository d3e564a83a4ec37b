// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named instance presets referenced through `@import`.
//!
//! A preset is a partial instance document. The user's instance object is
//! merged on top of it, so explicit fields always win over the preset.

use serde_json::{json, Value};

use crate::merge::merge_json;
use crate::ConfigError;

fn preset(name: &str) -> Option<Value> {
    let value = match name {
        "phone" => json!({
            "vm": { "cpus": 4, "memory_mb": 4096 }
        }),
        "tablet" => json!({
            "vm": { "cpus": 4, "memory_mb": 4096 },
            "graphics": {
                "displays": [ { "width": 2560, "height": 1800, "dpi": 320 } ]
            }
        }),
        "tv" => json!({
            "vm": { "cpus": 2, "memory_mb": 2048 },
            "graphics": {
                "displays": [ { "width": 1920, "height": 1080, "dpi": 213 } ]
            }
        }),
        "wearable" => json!({
            "vm": { "cpus": 2, "memory_mb": 1536, "use_sdcard": false },
            "graphics": {
                "displays": [ { "width": 450, "height": 450, "dpi": 320 } ]
            }
        }),
        "auto" => json!({
            "vm": { "cpus": 4, "memory_mb": 4096 },
            "graphics": {
                "displays": [ { "width": 1080, "height": 600, "dpi": 120 } ]
            }
        }),
        "slim" => json!({
            "vm": { "cpus": 2, "memory_mb": 2048, "use_sdcard": false }
        }),
        "foldable" => json!({
            "vm": { "cpus": 4, "memory_mb": 4096 },
            "graphics": {
                "displays": [
                    { "width": 1768, "height": 2208, "dpi": 374 },
                    { "width": 832, "height": 2268, "dpi": 387 }
                ]
            }
        }),
        "go" => json!({
            "vm": { "cpus": 2, "memory_mb": 2048 }
        }),
        _ => return None,
    };
    Some(value)
}

/// Resolve every `@import` reference in `instances[]` by merging the
/// instance over its preset. The `@import` key itself is removed.
pub fn apply_imports(config: &mut Value) -> Result<(), ConfigError> {
    let Some(instances) = config.get_mut("instances").and_then(Value::as_array_mut) else {
        return Ok(());
    };
    for instance in instances {
        let Some(import) = instance.get("@import") else {
            continue;
        };
        let name = import
            .as_str()
            .ok_or_else(|| ConfigError::TypeMismatch {
                path: "instances.@import".to_string(),
                expected: "string",
            })?
            .to_string();
        let mut resolved = preset(&name).ok_or(ConfigError::UnknownPreset(name))?;
        if let Some(map) = instance.as_object_mut() {
            map.remove("@import");
        }
        merge_json(&mut resolved, instance);
        *instance = resolved;
    }
    Ok(())
}

#[cfg(test)]
#[path = "presets_tests.rs"]
mod tests;
