// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deep merge of JSON documents, later wins per leaf.

use serde_json::Value;

/// Merge `src` into `dst`.
///
/// Objects merge key by key and arrays element by element; everything else
/// in `src` overwrites the value in `dst`. Extra `src` array elements are
/// appended.
pub fn merge_json(dst: &mut Value, src: &Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (key, src_value) in src_map {
                match dst_map.get_mut(key) {
                    Some(dst_value) => merge_json(dst_value, src_value),
                    None => {
                        dst_map.insert(key.clone(), src_value.clone());
                    }
                }
            }
        }
        (Value::Array(dst_items), Value::Array(src_items)) => {
            for (i, src_item) in src_items.iter().enumerate() {
                match dst_items.get_mut(i) {
                    Some(dst_item) => merge_json(dst_item, src_item),
                    None => dst_items.push(src_item.clone()),
                }
            }
        }
        (dst, src) => *dst = src.clone(),
    }
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
