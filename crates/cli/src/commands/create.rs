// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cvd create`: materialize a new group and boot it.

use anyhow::{Context as _, Result};

use crate::context::Context;
use crate::dispatcher::CommandHandler;
use crate::flag::{filter_bool_flag, filter_value_flag};
use crate::request::CommandRequest;
use crate::selector::creation::analyze_creation;
use crate::selector::start::parse_start_options;
use crate::selector::parse_selector_options;
use cvd_engine::InstanceLockManager;

pub struct CreateCommand;

impl CommandHandler for CreateCommand {
    fn subcommands(&self) -> Vec<&'static str> {
        vec!["create"]
    }

    fn summary_help(&self) -> String {
        "Create a group of virtual devices and start it".to_string()
    }

    fn detailed_help(&self, _args: &[String]) -> String {
        "Usage:\n\
         cvd create [--daemon] [--config_file=<path>] [launch flags...]\n\n\
         Creates an instance group and boots its devices. With --config_file the\n\
         group is described by a JSON environment config instead of flags."
            .to_string()
    }

    fn should_intercept_help(&self) -> bool {
        true
    }

    fn handle(&self, context: &Context, request: &CommandRequest) -> Result<()> {
        let mut args = request.args.clone();
        // A config file switches to the declarative path shared with
        // `cvd load`.
        if let Some(config_file) = filter_value_flag(&mut args, "config_file")? {
            // The declarative path always daemonizes; the flag is consumed
            // rather than forwarded.
            filter_bool_flag(&mut args, "daemon")?;
            let mut load_args = vec![config_file];
            load_args.extend(args);
            let load_request =
                CommandRequest::new("load", load_args, request.env.clone());
            return super::load::LoadCommand.handle(context, &load_request);
        }

        let mut envs = request.env.clone();
        super::start::normalize_home(&mut envs)?;

        let selector_options = parse_selector_options(&mut args)?;
        let start_options = parse_start_options(&selector_options, &mut args, &envs)?;
        let lock_manager = InstanceLockManager::new();

        // A group may already exist for this home in PREPARING state
        // (`cvd load` pre-creates it); it is adopted instead of recreated.
        if let Some(group) = existing_group_for_home(context, &envs)? {
            if group.has_active_instances() {
                anyhow::bail!(
                    "a group already runs from this home directory, use 'cvd stop' first"
                );
            }
            let (group, _id_locks) =
                assign_missing_ids(context, group, &start_options, &lock_manager)?;
            return super::start::launch_group(context, group, args, envs);
        }

        let creation = analyze_creation(&start_options, &envs, &lock_manager)?;
        let group = context
            .db
            .create_instance_group(creation.params, &context.clock)
            .context("failed to create the instance group")?;
        // Id reservations stay held until the launch finishes.
        let _id_locks = creation.id_locks;

        super::start::launch_group(context, group, args, envs)
    }
}

fn existing_group_for_home(
    context: &Context,
    envs: &cvd_core::Envs,
) -> Result<Option<cvd_core::InstanceGroup>> {
    let Some(home) = envs.get("HOME").filter(|h| !h.is_empty()) else {
        return Ok(None);
    };
    let query = cvd_storage::Query::home(home.as_str());
    Ok(context.db.find_groups(&query)?.into_iter().next())
}

/// Instances created by the declarative path start with id 0; reserve
/// real ids for them before launch.
fn assign_missing_ids(
    context: &Context,
    mut group: cvd_core::InstanceGroup,
    start_options: &crate::selector::start::StartOptions,
    lock_manager: &InstanceLockManager,
) -> Result<(cvd_core::InstanceGroup, Vec<cvd_engine::InstanceLock>)> {
    let unassigned = group.instances().iter().filter(|i| i.id == 0).count();
    if unassigned == 0 {
        return Ok((group, Vec::new()));
    }
    let locks = if start_options.acquire_file_lock {
        lock_manager.acquire_unused(unassigned)?
    } else {
        Vec::new()
    };
    let mut ids = locks.iter().map(cvd_engine::InstanceLock::id).collect::<Vec<_>>().into_iter();
    let mut next_fallback = 1u32;
    for instance in group.instances_mut().iter_mut().filter(|i| i.id == 0) {
        instance.id = match ids.next() {
            Some(id) => id,
            None => {
                let id = next_fallback;
                next_fallback += 1;
                id
            }
        };
    }
    context.db.update_instance_group(&group)?;
    Ok((group, locks))
}
