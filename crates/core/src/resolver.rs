// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path and environment resolution.
//!
//! These helpers are deterministic and side-effect free apart from the
//! single optional `realpath` lookup; they are safe to call from parsers
//! and from interrupt-handling paths.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::env::{Envs, ANDROID_HOST_OUT, ANDROID_SOONG_HOST_OUT};

/// Launcher binaries whose presence marks a host artifacts directory.
const LAUNCHER_BINS: [&str; 2] = ["cvd_internal_start", "launch_cvd"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("{0}")]
    BadPath(String),
    #[error("{0}")]
    NotFound(String),
}

/// Input to [`emulate_absolute_path`].
#[derive(Debug, Default)]
pub struct InputPathForm<'a> {
    pub path_to_convert: &'a str,
    /// Anchor for relative paths; defaults to the process working directory.
    pub current_working_dir: Option<&'a Path>,
    /// Expansion for a leading `~`; defaults to the system home directory.
    pub home_dir: Option<&'a Path>,
    pub follow_symlink: bool,
}

/// Pure-lexical path normalizer.
///
/// A leading `~` expands to the home directory and relative paths are
/// anchored at the working directory. `.` and empty segments are dropped,
/// `..` pops one segment or is ignored at the root. `~` anywhere but at
/// the start is an error. When `follow_symlink` is set and the result
/// exists on disk it is additionally resolved through the OS realpath.
pub fn emulate_absolute_path(form: &InputPathForm<'_>) -> Result<PathBuf, PathError> {
    let path = form.path_to_convert;
    if path.is_empty() {
        return Err(PathError::BadPath("cannot convert an empty path".to_string()));
    }
    let working_dir = match form.current_working_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()
            .map_err(|e| PathError::BadPath(format!("working directory is unavailable: {e}")))?,
    };
    if !working_dir.is_absolute() {
        return Err(PathError::BadPath(
            "current working directory should be given in an absolute path".to_string(),
        ));
    }

    let mut components: Vec<String> = prefix_components(path, &working_dir, form.home_dir)?;
    let mut tokens = path.split('/');
    let first = tokens.next();
    if first != Some("~") {
        if let Some(first) = first {
            components.push(first.to_string());
        }
    }
    components.extend(tokens.map(str::to_string));

    if components.iter().any(|c| c == "~") {
        return Err(PathError::BadPath(format!(
            "~ is not allowed in the middle of the path: {path}"
        )));
    }

    let mut folded: Vec<String> = Vec::new();
    for token in components {
        if token == ".." {
            folded.pop();
        } else if !token.is_empty() && token != "." {
            folded.push(token);
        }
    }

    let processed = PathBuf::from(format!("/{}", folded.join("/")));
    if form.follow_symlink && processed.exists() {
        return processed.canonicalize().map_err(|e| {
            PathError::BadPath(format!("failed to resolve {}: {e}", processed.display()))
        });
    }
    Ok(processed)
}

fn prefix_components(
    path: &str,
    working_dir: &Path,
    home_dir: Option<&Path>,
) -> Result<Vec<String>, PathError> {
    let split = |p: &Path| -> Vec<String> {
        p.to_string_lossy().split('/').filter(|s| !s.is_empty()).map(str::to_string).collect()
    };
    if path == "~" || path.starts_with("~/") {
        match home_dir {
            Some(home) => Ok(split(home)),
            None => match dirs::home_dir() {
                Some(home) => Ok(split(&home)),
                None => Err(PathError::NotFound("system home directory is unknown".to_string())),
            },
        }
    } else if !path.starts_with('/') {
        Ok(split(working_dir))
    } else {
        Ok(Vec::new())
    }
}

/// Returns whether `path` could be a host artifacts directory: it must
/// exist and its `bin/` must hold one of the launcher binaries.
pub fn is_host_artifacts_dir(path: &Path) -> bool {
    LAUNCHER_BINS.iter().any(|bin| path.join("bin").join(bin).is_file())
}

/// Locate the host tool directory from the environment.
///
/// Helper tools are found through the first of `ANDROID_HOST_OUT`,
/// `ANDROID_SOONG_HOST_OUT` and `HOME` that looks like a host artifacts
/// directory, falling back to the current working directory.
pub fn android_host_path(envs: &Envs) -> Result<PathBuf, PathError> {
    for var in [ANDROID_HOST_OUT, ANDROID_SOONG_HOST_OUT, "HOME"] {
        if let Some(value) = envs.get(var) {
            let candidate = PathBuf::from(value);
            if is_host_artifacts_dir(&candidate) {
                return Ok(candidate);
            }
        }
    }
    let current_dir = std::env::current_dir()
        .map_err(|e| PathError::NotFound(format!("working directory is unavailable: {e}")))?;
    if is_host_artifacts_dir(&current_dir) {
        return Ok(current_dir);
    }
    Err(PathError::NotFound("unable to find a valid host tool directory".to_string()))
}

/// Returns the first of `alternatives` present under `<artifacts>/bin/`.
pub fn find_binary(artifacts_path: &Path, alternatives: &[&str]) -> Result<String, PathError> {
    for bin_name in alternatives {
        if artifacts_path.join("bin").join(bin_name).is_file() {
            return Ok((*bin_name).to_string());
        }
    }
    Err(PathError::NotFound(format!(
        "'{}' does not contain any of [{}]",
        artifacts_path.display(),
        alternatives.join(", ")
    )))
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
