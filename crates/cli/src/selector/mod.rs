// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolving a request to the group or instance it applies to.

pub mod creation;
pub mod start;

use std::io::{BufRead, IsTerminal, Write};

use anyhow::{anyhow, bail, Context as _, Result};

use cvd_core::env::CUTTLEFISH_INSTANCE;
use cvd_core::name::{is_valid_group_name, is_valid_instance_name};
use cvd_core::{Envs, Instance, InstanceGroup};
use cvd_storage::{DbError, InstanceDatabase, Query};

use crate::flag::{filter_bool_flag, filter_value_flag};

/// Selector flags recognized on every sub-command, consumed out of the
/// argument vector.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectorOptions {
    pub group_name: Option<String>,
    pub instance_names: Option<Vec<String>>,
    pub disable_default_group: bool,
    pub acquire_file_lock: Option<bool>,
}

pub fn parse_selector_options(args: &mut Vec<String>) -> Result<SelectorOptions> {
    let group_name = match filter_value_flag(args, "group_name")? {
        Some(name) => {
            if !is_valid_group_name(&name) {
                bail!("invalid group name '{name}'");
            }
            Some(name)
        }
        None => None,
    };
    let instance_names = match filter_value_flag(args, "instance_name")? {
        Some(value) => {
            let names: Vec<String> = value.split(',').map(str::to_string).collect();
            for name in &names {
                if !is_valid_instance_name(name) {
                    bail!("invalid instance name '{name}'");
                }
            }
            let unique: std::collections::HashSet<&String> = names.iter().collect();
            if unique.len() != names.len() {
                bail!("--instance_name contains duplicates");
            }
            Some(names)
        }
        None => None,
    };
    Ok(SelectorOptions {
        group_name,
        instance_names,
        disable_default_group: filter_bool_flag(args, "disable_default_group")?.unwrap_or(false),
        acquire_file_lock: filter_bool_flag(args, "acquire_file_lock")?,
    })
}

/// The home directory is only a selection signal when the user overrode
/// it away from the system-wide one.
fn overridden_home(envs: &Envs) -> Option<String> {
    let home = envs.get("HOME").filter(|h| !h.is_empty())?;
    let system_home = dirs::home_dir()?;
    if system_home.as_os_str() != home.as_str() {
        Some(home.clone())
    } else {
        None
    }
}

fn instance_id_from_env(envs: &Envs) -> Option<u32> {
    envs.get(CUTTLEFISH_INSTANCE).and_then(|v| v.parse::<u32>().ok()).filter(|id| *id > 0)
}

fn build_query(options: &SelectorOptions, envs: &Envs) -> Query {
    Query {
        home: overridden_home(envs).map(Into::into),
        group_name: options.group_name.clone(),
        instance_id: instance_id_from_env(envs),
        instance_name: options
            .instance_names
            .as_ref()
            .and_then(|names| (names.len() == 1).then(|| names[0].clone())),
    }
}

/// Select exactly one group. When several match and stdin is a terminal,
/// the user picks from a numbered list; otherwise ambiguity is an error.
pub fn select_group(
    db: &InstanceDatabase,
    options: &SelectorOptions,
    envs: &Envs,
) -> Result<InstanceGroup> {
    if options.disable_default_group
        && options.group_name.is_none()
        && options.instance_names.is_none()
    {
        bail!("--disable_default_group requires selecting a group with --group_name or --instance_name");
    }
    let query = build_query(options, envs);
    let matches = db.find_groups(&query).context("failed to read the instance database")?;
    match matches.len() {
        0 => Err(anyhow!(DbError::GroupNotFound(query.describe()))),
        1 => Ok(matches.into_iter().next().ok_or_else(|| anyhow!("empty selection"))?),
        _ if std::io::stdin().is_terminal() => pick_interactively(matches),
        _ => Err(anyhow!(DbError::Ambiguous(query.describe()))),
    }
}

fn pick_interactively(matches: Vec<InstanceGroup>) -> Result<InstanceGroup> {
    let mut err = std::io::stderr();
    writeln!(err, "Multiple groups match, choose one:")?;
    for (i, group) in matches.iter().enumerate() {
        writeln!(err, "  [{}] {} ({})", i + 1, group.group_name(), group.home_dir().display())?;
    }
    write!(err, "> ")?;
    err.flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let choice: usize = line.trim().parse().context("expected a number from the list")?;
    if choice == 0 || choice > matches.len() {
        bail!("selection {choice} is out of range");
    }
    Ok(matches
        .into_iter()
        .nth(choice - 1)
        .ok_or_else(|| anyhow!("selection out of range"))?)
}

/// Select exactly one instance and its group. No interactive fallback:
/// multiple matches are a hard error.
pub fn select_instance(
    db: &InstanceDatabase,
    options: &SelectorOptions,
    envs: &Envs,
) -> Result<(Instance, InstanceGroup)> {
    let instance_name = match options.instance_names.as_deref() {
        Some([name]) => Some(name.clone()),
        Some(_) => bail!("--instance_name must name exactly one instance here"),
        None => None,
    };
    let instance_id = instance_id_from_env(envs);
    if instance_name.is_none() && instance_id.is_none() {
        bail!(
            "an instance must be selected with --instance_name or the {CUTTLEFISH_INSTANCE} variable"
        );
    }

    let group_query = Query {
        home: overridden_home(envs).map(Into::into),
        group_name: options.group_name.clone(),
        ..Query::default()
    };
    let mut matches: Vec<(Instance, InstanceGroup)> = Vec::new();
    for group in db.find_groups(&group_query)? {
        for instance in group.instances() {
            let name_ok = instance_name.as_deref().map_or(true, |n| instance.name == n);
            let id_ok = instance_id.map_or(true, |id| instance.id == id);
            if name_ok && id_ok {
                matches.push((instance.clone(), group.clone()));
            }
        }
    }
    match matches.len() {
        0 => bail!("no instance matches the selection"),
        1 => Ok(matches.into_iter().next().ok_or_else(|| anyhow!("empty selection"))?),
        _ => bail!("the selection matches more than one instance"),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
