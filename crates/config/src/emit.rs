// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gflag emission helpers: one flag per field, values joined across
//! instances in order, with a documented default token for absent fields.

use serde_json::Value;

/// `--<name>=<v1>,<v2>,…` with one token per instance.
pub(crate) fn joined_flag<F>(name: &str, instances: &[Value], token: F) -> String
where
    F: Fn(&Value) -> String,
{
    let values: Vec<String> = instances.iter().map(token).collect();
    format!("--{name}={}", values.join(","))
}

/// String field at `pointer`, or `default` when absent.
pub(crate) fn str_or(instance: &Value, pointer: &str, default: &str) -> String {
    match instance.pointer(pointer) {
        Some(Value::String(s)) => s.clone(),
        _ => default.to_string(),
    }
}

/// Bool field at `pointer` rendered as `true`/`false`, or `default`.
pub(crate) fn bool_or(instance: &Value, pointer: &str, default: bool) -> String {
    match instance.pointer(pointer) {
        Some(Value::Bool(b)) => b.to_string(),
        _ => default.to_string(),
    }
}

/// Unsigned field at `pointer`, or `default`. The default is a token so
/// sentinel values like `unset` work too.
pub(crate) fn uint_or(instance: &Value, pointer: &str, default: &str) -> String {
    match instance.pointer(pointer).and_then(Value::as_u64) {
        Some(v) => v.to_string(),
        None => default.to_string(),
    }
}

/// Whether any instance carries a value at `pointer`.
pub(crate) fn any_instance_has(instances: &[Value], pointer: &str) -> bool {
    instances.iter().any(|i| i.pointer(pointer).is_some())
}
