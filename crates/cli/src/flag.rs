// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gflags-compatible flag filtering.
//!
//! Helper tools receive unrecognized flags verbatim, so the flags cvd
//! itself understands are consumed out of the argument vector instead of
//! being declared up front. Accepted spellings: `--name=value`,
//! `-name=value`, `--name value`, `-name value`, and for booleans the
//! bare `--name` / `--noname` forms.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlagError {
    #[error("flag --{0} requires a value")]
    MissingValue(String),
    #[error("invalid value '{value}' for flag --{name}")]
    InvalidValue { name: String, value: String },
}

fn matches_flag(arg: &str, name: &str) -> Option<Option<String>> {
    let body = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-'))?;
    if body == name {
        return Some(None);
    }
    let value = body.strip_prefix(name)?.strip_prefix('=')?;
    Some(Some(value.to_string()))
}

/// Consume every occurrence of a value flag, returning the last value.
pub fn filter_value_flag(args: &mut Vec<String>, name: &str) -> Result<Option<String>, FlagError> {
    let mut result = None;
    let mut error = None;
    let mut kept = Vec::with_capacity(args.len());
    let mut iter = args.drain(..);
    while let Some(arg) = iter.next() {
        if error.is_some() {
            kept.push(arg);
            continue;
        }
        match matches_flag(&arg, name) {
            Some(Some(value)) => result = Some(value),
            Some(None) => match iter.next() {
                Some(value) if !value.starts_with('-') => result = Some(value),
                next => {
                    error = Some(FlagError::MissingValue(name.to_string()));
                    kept.extend(next);
                }
            },
            None => kept.push(arg),
        }
    }
    drop(iter);
    *args = kept;
    match error {
        Some(error) => Err(error),
        None => Ok(result),
    }
}

/// Consume an i32 flag.
pub fn filter_i32_flag(args: &mut Vec<String>, name: &str) -> Result<Option<i32>, FlagError> {
    match filter_value_flag(args, name)? {
        Some(value) => value
            .parse::<i32>()
            .map(Some)
            .map_err(|_| FlagError::InvalidValue { name: name.to_string(), value }),
        None => Ok(None),
    }
}

/// Consume a bool flag, understanding `--name`, `--noname`, `--name=true`
/// and friends.
pub fn filter_bool_flag(args: &mut Vec<String>, name: &str) -> Result<Option<bool>, FlagError> {
    let negated = format!("no{name}");
    let mut result = None;
    let mut error = None;
    let mut kept = Vec::with_capacity(args.len());
    for arg in args.drain(..) {
        if error.is_some() {
            kept.push(arg);
            continue;
        }
        if let Some(value) = matches_flag(&arg, name) {
            match value {
                None => result = Some(true),
                Some(value) => match parse_bool(&value) {
                    Some(parsed) => result = Some(parsed),
                    None => {
                        error = Some(FlagError::InvalidValue { name: name.to_string(), value });
                    }
                },
            }
        } else if matches!(matches_flag(&arg, &negated), Some(None)) {
            result = Some(false);
        } else {
            kept.push(arg);
        }
    }
    *args = kept;
    match error {
        Some(error) => Err(error),
        None => Ok(result),
    }
}

pub fn parse_bool(value: &str) -> Option<bool> {
    let lower = value.to_ascii_lowercase();
    match lower.as_str() {
        "y" | "yes" | "true" => Some(true),
        "n" | "no" | "false" => Some(false),
        _ => None,
    }
}

/// Whether the arguments ask for help output.
pub fn has_help_flag(args: &[String]) -> bool {
    args.iter().any(|arg| {
        matches!(arg.as_str(), "--help" | "-help" | "--helpxml" | "-helpxml" | "help")
    })
}

#[cfg(test)]
#[path = "flag_tests.rs"]
mod tests;
