// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cvd bugreport`: collect host-side debug data for a group.

use anyhow::{bail, Result};

use cvd_engine::{CommandSpec, Supervisor};

use crate::context::Context;
use crate::dispatcher::CommandHandler;
use crate::flag::has_help_flag;
use crate::host_tool::HostToolTarget;
use crate::request::CommandRequest;
use crate::selector::{parse_selector_options, select_group};

const HOST_BUGREPORT_BIN: &str = "cvd_internal_host_bugreport";

pub struct BugreportCommand;

impl CommandHandler for BugreportCommand {
    fn subcommands(&self) -> Vec<&'static str> {
        vec!["bugreport", "host_bugreport", "cvd_host_bugreport"]
    }

    fn summary_help(&self) -> String {
        "Run cvd bugreport --help for the command description".to_string()
    }

    fn detailed_help(&self, args: &[String]) -> String {
        let command = args.first().map(String::as_str).unwrap_or("<command>");
        format!("Run cvd {command} --help for the full help text")
    }

    fn should_intercept_help(&self) -> bool {
        false
    }

    fn handle(&self, context: &Context, request: &CommandRequest) -> Result<()> {
        let mut args = request.args.clone();
        let is_help = has_help_flag(&args);

        let (envs, artifacts) = if is_help {
            let artifacts = cvd_core::resolver::android_host_path(&request.env)?;
            (request.env.clone(), artifacts)
        } else {
            if !context.db.has_instance_groups()? {
                bail!(super::no_group_message(&request.subcommand));
            }
            let selector_options = parse_selector_options(&mut args)?;
            let group = select_group(&context.db, &selector_options, &request.env)?;
            (super::group_env(&request.env, &group), group.host_artifacts_path().to_path_buf())
        };

        let tool = HostToolTarget::new(artifacts);
        let spec = CommandSpec::new(tool.bin_path(HOST_BUGREPORT_BIN))
            .args(args)
            .envs(envs)
            .working_dir(std::env::current_dir()?);
        let supervisor = Supervisor::new();
        supervisor.launch(&spec)?;
        super::forward_helper_exit(HOST_BUGREPORT_BIN, supervisor.wait()?)
    }
}
