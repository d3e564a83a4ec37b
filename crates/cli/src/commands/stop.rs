// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cvd stop`: stop a running group through the stop helper.

use anyhow::{bail, Context as _, Result};

use cvd_core::InstanceState;
use cvd_engine::{check_normal_exit, CommandSpec, Supervisor};

use crate::context::Context;
use crate::dispatcher::CommandHandler;
use crate::flag::has_help_flag;
use crate::host_tool::HostToolTarget;
use crate::request::CommandRequest;
use crate::selector::{parse_selector_options, select_group};

pub struct StopCommand;

impl CommandHandler for StopCommand {
    fn subcommands(&self) -> Vec<&'static str> {
        vec!["stop", "stop_cvd"]
    }

    fn summary_help(&self) -> String {
        "Stop the selected running group".to_string()
    }

    fn detailed_help(&self, _args: &[String]) -> String {
        "Run cvd stop --help for the full help text".to_string()
    }

    fn should_intercept_help(&self) -> bool {
        false
    }

    fn handle(&self, context: &Context, request: &CommandRequest) -> Result<()> {
        let mut args = request.args.clone();
        let envs = request.env.clone();

        if has_help_flag(&args) {
            let (artifacts, bin) =
                crate::host_tool::bin_from_env(&envs, &["cvd_internal_stop", "stop_cvd"])?;
            let spec = CommandSpec::new(crate::host_tool::tool_path(&artifacts, &bin))
                .args(args)
                .envs(envs);
            let supervisor = Supervisor::new();
            supervisor.launch(&spec)?;
            check_normal_exit(&bin, supervisor.wait()?, 0)?;
            return Ok(());
        }

        if !context.db.has_instance_groups()? {
            bail!(super::no_group_message(&request.subcommand));
        }
        let selector_options = parse_selector_options(&mut args)?;
        let mut group = select_group(&context.db, &selector_options, &envs)?;
        if !group.has_active_instances() {
            bail!("selected group is not running");
        }

        let tool = HostToolTarget::new(group.host_artifacts_path());
        let bin = tool.stop_bin()?;
        let spec = CommandSpec::new(tool.bin_path(&bin))
            .args(args)
            .envs(super::group_env(&envs, &group))
            .working_dir(std::env::current_dir()?);

        let supervisor = Supervisor::new();
        supervisor.launch(&spec)?;
        let status = supervisor.wait()?;
        let outcome = check_normal_exit(&bin, status, 0);

        if outcome.is_ok() {
            group.set_all_states(InstanceState::Stopped);
            context.db.update_instance_group(&group)?;
        }
        outcome.context("the group may be in an inconsistent state, run 'cvd reset'")?;
        Ok(())
    }
}
