// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cvd remove`: stop a group if needed, then delete its record.

use anyhow::{bail, Result};
use tracing::error;

use cvd_engine::{check_normal_exit, CommandSpec, Supervisor};

use crate::context::Context;
use crate::dispatcher::CommandHandler;
use crate::flag::has_help_flag;
use crate::host_tool::HostToolTarget;
use crate::request::CommandRequest;
use crate::selector::{parse_selector_options, select_group};

pub struct RemoveCommand;

impl CommandHandler for RemoveCommand {
    fn subcommands(&self) -> Vec<&'static str> {
        vec!["remove", "rm"]
    }

    fn summary_help(&self) -> String {
        "Remove devices and artifacts from the system".to_string()
    }

    fn detailed_help(&self, _args: &[String]) -> String {
        "Removes selected devices from the system.\n\n\
         Running devices are stopped first. Deletes build and runtime artifacts,\n\
         including log files and images, but only when the directories were\n\
         generated by cvd itself."
            .to_string()
    }

    fn should_intercept_help(&self) -> bool {
        true
    }

    fn handle(&self, context: &Context, request: &CommandRequest) -> Result<()> {
        let mut args = request.args.clone();
        if has_help_flag(&args) {
            println!("{}", self.detailed_help(&args));
            return Ok(());
        }
        if !context.db.has_instance_groups()? {
            bail!(super::no_group_message(&request.subcommand));
        }
        let selector_options = parse_selector_options(&mut args)?;
        let group = select_group(&context.db, &selector_options, &request.env)?;

        if group.has_active_instances() {
            if let Err(e) = stop_group(&group, request) {
                error!("{e:#}");
                error!(
                    "unable to stop devices first, run 'cvd reset' to forcibly kill any \
                     remaining device processes"
                );
            }
        }

        context.db.remove_instance_group_by_home(group.home_dir())?;
        remove_generated_artifacts(&group);
        Ok(())
    }
}

/// Delete the group's base directory, but only when cvd generated it
/// under the per-user data directory; user-chosen homes are untouched.
fn remove_generated_artifacts(group: &cvd_core::InstanceGroup) {
    let Ok(base) = cvd_core::paths::group_dir_from_home(group.home_dir()) else {
        return;
    };
    if !base.starts_with(cvd_core::paths::per_user_dir()) {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(&base) {
        error!("failed to remove group artifacts at {}: {e}", base.display());
    }
}

fn stop_group(group: &cvd_core::InstanceGroup, request: &CommandRequest) -> Result<()> {
    let tool = HostToolTarget::new(group.host_artifacts_path());
    let bin = tool.stop_bin()?;
    let spec = CommandSpec::new(tool.bin_path(&bin))
        .envs(super::group_env(&request.env, group))
        .working_dir(std::env::current_dir()?);
    let supervisor = Supervisor::new();
    supervisor.launch(&spec)?;
    check_normal_exit(&bin, supervisor.wait()?, 0)?;
    Ok(())
}
