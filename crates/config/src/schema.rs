// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative schema tree the parsed config is validated against.
//!
//! The walk fails on unknown keys and on type mismatches; absent fields
//! are always fine, their defaults are substituted at emission time.

use indexmap::IndexMap;
use serde_json::Value;

use crate::ConfigError;

enum Kind {
    Object,
    Array,
    String,
    Bool,
    UInt,
    /// Accepted verbatim, no validation below this node.
    Any,
}

struct ConfigNode {
    kind: Kind,
    children: IndexMap<&'static str, ConfigNode>,
    element: Option<Box<ConfigNode>>,
}

fn object(children: Vec<(&'static str, ConfigNode)>) -> ConfigNode {
    ConfigNode { kind: Kind::Object, children: children.into_iter().collect(), element: None }
}

fn array(element: ConfigNode) -> ConfigNode {
    ConfigNode { kind: Kind::Array, children: IndexMap::new(), element: Some(Box::new(element)) }
}

fn leaf(kind: Kind) -> ConfigNode {
    ConfigNode { kind, children: IndexMap::new(), element: None }
}

fn instance_schema() -> ConfigNode {
    object(vec![
        ("name", leaf(Kind::String)),
        (
            "vm",
            object(vec![
                ("cpus", leaf(Kind::UInt)),
                ("memory_mb", leaf(Kind::UInt)),
                ("use_sdcard", leaf(Kind::Bool)),
                ("setupwizard_mode", leaf(Kind::String)),
                ("uuid", leaf(Kind::String)),
                ("custom_actions", leaf(Kind::Any)),
                (
                    "crosvm",
                    object(vec![
                        ("enable_sandbox", leaf(Kind::Bool)),
                        ("simple_media_device", leaf(Kind::Bool)),
                        ("v4l2_proxy", leaf(Kind::String)),
                    ]),
                ),
                ("qemu", object(vec![])),
                ("gem5", object(vec![])),
            ]),
        ),
        (
            "boot",
            object(vec![
                ("enable_bootanimation", leaf(Kind::Bool)),
                ("kernel", object(vec![("extra_kernel_cmdline", leaf(Kind::String))])),
            ]),
        ),
        (
            "security",
            object(vec![
                ("serial_number", leaf(Kind::String)),
                ("guest_enforce_security", leaf(Kind::Bool)),
            ]),
        ),
        (
            "disk",
            object(vec![
                ("blank_data_image_mb", leaf(Kind::UInt)),
                ("default_build", leaf(Kind::String)),
                ("download_img_zip", leaf(Kind::Bool)),
                ("otatools_build", leaf(Kind::String)),
                ("host_package_build", leaf(Kind::String)),
                ("boot_build", leaf(Kind::String)),
                ("kernel_build", leaf(Kind::String)),
                ("bootloader_build", leaf(Kind::String)),
                ("system_image_dir", leaf(Kind::String)),
            ]),
        ),
        (
            "graphics",
            object(vec![(
                "displays",
                array(object(vec![
                    ("width", leaf(Kind::UInt)),
                    ("height", leaf(Kind::UInt)),
                    ("dpi", leaf(Kind::UInt)),
                    ("refresh_rate_hertz", leaf(Kind::UInt)),
                ])),
            )]),
        ),
    ])
}

fn root_schema() -> ConfigNode {
    object(vec![
        ("common", object(vec![("group_name", leaf(Kind::String))])),
        ("netsim_bt", leaf(Kind::Bool)),
        ("instances", array(instance_schema())),
        (
            "fetch",
            object(vec![
                ("api_key", leaf(Kind::String)),
                ("credential_source", leaf(Kind::String)),
                ("wait_retry_period", leaf(Kind::UInt)),
                ("keep_downloaded_archives", leaf(Kind::Bool)),
            ]),
        ),
    ])
}

pub fn validate(config: &Value) -> Result<(), ConfigError> {
    walk(config, &root_schema(), "")
}

fn walk(value: &Value, node: &ConfigNode, path: &str) -> Result<(), ConfigError> {
    match node.kind {
        Kind::Any => Ok(()),
        Kind::Object => {
            let Some(map) = value.as_object() else {
                return Err(mismatch(path, "object"));
            };
            for (key, child_value) in map {
                let child_path = join(path, key);
                let Some(child_node) = node.children.get(key.as_str()) else {
                    return Err(ConfigError::UnknownKey(child_path));
                };
                walk(child_value, child_node, &child_path)?;
            }
            Ok(())
        }
        Kind::Array => {
            let Some(items) = value.as_array() else {
                return Err(mismatch(path, "array"));
            };
            let Some(element) = &node.element else {
                return Ok(());
            };
            for (i, item) in items.iter().enumerate() {
                walk(item, element, &join(path, &i.to_string()))?;
            }
            Ok(())
        }
        Kind::String => {
            if value.is_string() {
                Ok(())
            } else {
                Err(mismatch(path, "string"))
            }
        }
        Kind::Bool => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err(mismatch(path, "bool"))
            }
        }
        Kind::UInt => {
            if value.is_u64() {
                Ok(())
            } else {
                Err(mismatch(path, "unsigned integer"))
            }
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn mismatch(path: &str, expected: &'static str) -> ConfigError {
    ConfigError::TypeMismatch { path: path.to_string(), expected }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
