// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start-option parsing: instance ids, counts and lock acquisition.
//!
//! Sources for the id vector, in precedence order: `--instance_nums`,
//! then `--base_instance_num` + `--num_instances`, then an implicit base
//! from `CUTTLEFISH_INSTANCE` or a `vsoc-<n>` user name suffix. With none
//! of those the ids stay unknown and an allocator assigns them later.

use anyhow::{bail, Result};

use cvd_core::env::{CUTTLEFISH_INSTANCE, CVD_ACQUIRE_FILE_LOCK};
use cvd_core::Envs;

use crate::flag::{filter_value_flag, parse_bool};
use crate::selector::SelectorOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOptions {
    pub group_name: Option<String>,
    pub instance_names: Option<Vec<String>>,
    /// `None` when the ids are not yet known; the count then comes from
    /// `requested_num_instances`.
    pub instance_ids: Option<Vec<u32>>,
    pub requested_num_instances: usize,
    pub acquire_file_lock: bool,
}

fn parse_natural(token: &str) -> Result<u32> {
    match token.parse::<i32>() {
        Ok(value) if value > 0 => Ok(value as u32),
        _ => bail!("'{token}' must be a positive integer"),
    }
}

fn instance_from_env(envs: &Envs) -> Option<u32> {
    let value = envs.get(CUTTLEFISH_INSTANCE)?;
    // Unparsable values are ignored, not errors.
    value.parse::<u32>().ok().filter(|id| *id > 0)
}

fn vsoc_suffix(envs: &Envs) -> Option<u32> {
    let user = envs.get("USER")?;
    user.strip_prefix("vsoc-")?.parse::<u32>().ok().filter(|id| *id > 0)
}

/// Determine the instance count from all sources, failing on any mismatch.
fn verify_num_instances(
    num_instances_flag: Option<&str>,
    instance_names: Option<&[String]>,
    instance_nums_flag: Option<&str>,
) -> Result<usize> {
    let mut num_instances: Option<usize> = match num_instances_flag {
        Some(value) => Some(parse_natural(value)? as usize),
        None => None,
    };
    if let Some(names) = instance_names {
        if !names.is_empty() {
            if let Some(n) = num_instances {
                if n != names.len() {
                    bail!(
                        "the number of instances requested by --num_instances and the names given \
                         by --instance_name do not match"
                    );
                }
            }
            num_instances = Some(names.len());
        }
    }
    if let Some(nums) = instance_nums_flag {
        let tokens: Vec<&str> = nums.split(',').collect();
        for token in &tokens {
            parse_natural(token)?;
        }
        let n = num_instances.unwrap_or(tokens.len());
        if n != tokens.len() {
            bail!(
                "the number of instances given by --instance_nums and the other flags do not match"
            );
        }
        num_instances = Some(tokens.len());
    }
    Ok(num_instances.unwrap_or(1))
}

fn parse_instance_nums(flag_value: &str) -> Result<Vec<u32>> {
    let mut ids = Vec::new();
    for token in flag_value.split(',') {
        ids.push(parse_natural(token)?);
    }
    let unique: std::collections::HashSet<u32> = ids.iter().copied().collect();
    if unique.len() != ids.len() {
        bail!("--instance_nums includes duplicated numbers");
    }
    Ok(ids)
}

fn acquire_file_lock(options: &SelectorOptions, envs: &Envs) -> Result<bool> {
    if let Some(from_flag) = options.acquire_file_lock {
        return Ok(from_flag);
    }
    if let Some(value) = envs.get(CVD_ACQUIRE_FILE_LOCK).filter(|v| !v.is_empty()) {
        return match parse_bool(value) {
            Some(parsed) => Ok(parsed),
            None => bail!(
                "in \"{CVD_ACQUIRE_FILE_LOCK}={value}\", \"{value}\" is an invalid value, try true or false"
            ),
        };
    }
    Ok(true)
}

/// Parse the start-scoped flags out of `cmd_args` and combine them with
/// the already-parsed selector options and the environment.
pub fn parse_start_options(
    options: &SelectorOptions,
    cmd_args: &mut Vec<String>,
    envs: &Envs,
) -> Result<StartOptions> {
    let num_instances = filter_value_flag(cmd_args, "num_instances")?;
    let instance_nums = filter_value_flag(cmd_args, "instance_nums")?;
    let base_instance_num = filter_value_flag(cmd_args, "base_instance_num")?;

    let requested_num_instances = verify_num_instances(
        num_instances.as_deref(),
        options.instance_names.as_deref(),
        instance_nums.as_deref(),
    )?;

    let instance_ids = if let Some(nums) = instance_nums {
        if base_instance_num.is_some() {
            bail!("--base_instance_num and --instance_nums are mutually exclusive");
        }
        Some(parse_instance_nums(&nums)?)
    } else if let Some(base) = base_instance_num {
        let base = parse_natural(&base)?;
        Some((0..requested_num_instances as u32).map(|i| base + i).collect())
    } else {
        // No explicit ids: the environment may still imply a base.
        instance_from_env(envs)
            .or_else(|| vsoc_suffix(envs))
            .map(|base| (0..requested_num_instances as u32).map(|i| base + i).collect())
    };

    Ok(StartOptions {
        group_name: options.group_name.clone(),
        instance_names: options.instance_names.clone(),
        instance_ids,
        requested_num_instances,
        acquire_file_lock: acquire_file_lock(options, envs)?,
    })
}

#[cfg(test)]
#[path = "start_tests.rs"]
mod tests;
