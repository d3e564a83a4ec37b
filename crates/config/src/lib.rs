// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cvd-config: declarative environment configs
//!
//! Ingests a JSON document describing one or more instances plus an
//! optional fetch block and translates it into the ordered internal
//! sub-commands that materialize the environment: an optional artifact
//! fetch followed by a create-and-start invocation.

mod emit;
mod fetch;
mod launch;
mod merge;
mod overrides;
mod presets;
mod schema;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use cvd_core::resolver::{emulate_absolute_path, InputPathForm};
use cvd_core::{paths, Clock};

pub use merge::merge_json;
pub use overrides::ConfigOverride;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("unknown config key '{0}'")]
    UnknownKey(String),
    #[error("config field '{path}' should be of type {expected}")]
    TypeMismatch { path: String, expected: &'static str },
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
    #[error("invalid override '{0}', expected <path>:<value>")]
    BadOverride(String),
    #[error("missing config file argument, usage: cvd load <config.json>")]
    MissingConfigPath,
    #[error("the config must define at least one instance")]
    NoInstances,
    #[error(transparent)]
    Path(#[from] cvd_core::PathError),
}

/// Arguments of one `cvd load` invocation, before the config is read.
#[derive(Debug, Clone)]
pub struct LoadFlags {
    pub config_path: PathBuf,
    pub overrides: Vec<ConfigOverride>,
    pub base_directory: Option<PathBuf>,
}

/// Directories one loaded environment deploys into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadDirectories {
    pub target_directory: PathBuf,
    /// Per-instance subdirectory names under the target directory.
    pub target_subdirectories: Vec<String>,
    pub launch_home_directory: PathBuf,
    pub host_package_directory: PathBuf,
    /// Comma-joined value for `--system_image_dir`.
    pub system_image_directory_flag_value: String,
}

/// Everything the load handler needs to drive the internal sub-commands.
#[derive(Debug, Clone)]
pub struct CvdFlags {
    pub launch_cvd_flags: Vec<String>,
    pub selector_flags: Vec<String>,
    pub fetch_cvd_flags: Vec<String>,
    pub group_name: Option<String>,
    pub instance_names: Vec<String>,
    pub load_directories: LoadDirectories,
}

/// Parse `cvd load` arguments: the config file path plus `--override` and
/// `--base_directory` flags. The config path is normalized against the
/// caller's working directory.
pub fn get_load_flags(args: &[String], working_dir: &Path) -> Result<LoadFlags, ConfigError> {
    let mut config_path: Option<String> = None;
    let mut overrides = Vec::new();
    let mut base_directory = None;

    fn take_value(
        arg: &str,
        prefix: &str,
        iter: &mut std::slice::Iter<'_, String>,
    ) -> Option<String> {
        if let Some(value) = arg.strip_prefix(prefix) {
            if let Some(value) = value.strip_prefix('=') {
                return Some(value.to_string());
            }
            if value.is_empty() {
                return iter.next().cloned();
            }
        }
        None
    }

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(value) = take_value(arg, "--override", &mut iter) {
            overrides.push(ConfigOverride::parse(&value)?);
        } else if let Some(value) = take_value(arg, "--base_directory", &mut iter) {
            base_directory = Some(PathBuf::from(value));
        } else if !arg.starts_with('-') && config_path.is_none() {
            config_path = Some(arg.clone());
        } else {
            return Err(ConfigError::UnknownKey(arg.clone()));
        }
    }

    let config_path = config_path.ok_or(ConfigError::MissingConfigPath)?;
    let config_path = emulate_absolute_path(&InputPathForm {
        path_to_convert: &config_path,
        current_working_dir: Some(working_dir),
        home_dir: None,
        follow_symlink: true,
    })?;
    Ok(LoadFlags { config_path, overrides, base_directory })
}

/// Read and fully resolve the config document: preset imports, overrides,
/// then schema validation.
pub fn parse_config_file(flags: &LoadFlags) -> Result<serde_json::Value, ConfigError> {
    let text = std::fs::read_to_string(&flags.config_path)
        .map_err(|source| ConfigError::Read { path: flags.config_path.clone(), source })?;
    let mut config: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| ConfigError::Parse { path: flags.config_path.clone(), message: e.to_string() })?;
    presets::apply_imports(&mut config)?;
    for config_override in &flags.overrides {
        config_override.apply(&mut config)?;
    }
    schema::validate(&config)?;
    Ok(config)
}

/// Translate a `cvd load` invocation into the internal command inputs.
pub fn get_cvd_flags(flags: &LoadFlags, clock: &impl Clock) -> Result<CvdFlags, ConfigError> {
    let config = parse_config_file(flags)?;
    let instances = config["instances"].as_array().ok_or(ConfigError::NoInstances)?;
    if instances.is_empty() {
        return Err(ConfigError::NoInstances);
    }

    let load_directories = load_directories(flags, instances, clock)?;
    let group_name = config
        .pointer("/common/group_name")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string);
    let instance_names: Vec<String> = instances
        .iter()
        .enumerate()
        .map(|(i, instance)| match instance["name"].as_str() {
            Some(name) => name.to_string(),
            None => (i + 1).to_string(),
        })
        .collect();
    let mut selector_flags = Vec::new();
    if instances.iter().any(|i| i["name"].is_string()) {
        selector_flags.push(format!("--instance_name={}", instance_names.join(",")));
    }

    debug!(
        instances = instances.len(),
        target = %load_directories.target_directory.display(),
        "config loaded"
    );
    Ok(CvdFlags {
        launch_cvd_flags: launch::launch_flags(&config, instances),
        selector_flags,
        fetch_cvd_flags: fetch::fetch_flags(&config, instances, &load_directories),
        group_name,
        instance_names,
        load_directories,
    })
}

fn load_directories(
    flags: &LoadFlags,
    instances: &[serde_json::Value],
    clock: &impl Clock,
) -> Result<LoadDirectories, ConfigError> {
    let target_directory = match &flags.base_directory {
        Some(dir) => dir.clone(),
        None => paths::parent_of_autogenerated_homes()?
            .join("cvd")
            .join(uid_string())
            .join(clock.epoch_nanos().to_string()),
    };
    let target_subdirectories: Vec<String> =
        (0..instances.len()).map(|i| i.to_string()).collect();
    let system_image_dirs: Vec<String> = instances
        .iter()
        .enumerate()
        .map(|(i, instance)| match instance.pointer("/disk/system_image_dir") {
            Some(serde_json::Value::String(dir)) => dir.clone(),
            _ => target_directory.join(i.to_string()).to_string_lossy().into_owned(),
        })
        .collect();
    Ok(LoadDirectories {
        launch_home_directory: target_directory.join("home"),
        host_package_directory: target_directory.join("host_package"),
        system_image_directory_flag_value: system_image_dirs.join(","),
        target_subdirectories,
        target_directory,
    })
}

fn uid_string() -> String {
    nix::unistd::getuid().to_string()
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
