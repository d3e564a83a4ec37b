// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cvd env`: explore the gRPC services of one instance.

use anyhow::Result;

use cvd_core::env::ANDROID_HOST_OUT;
use cvd_engine::{CommandSpec, Supervisor};

use crate::context::Context;
use crate::dispatcher::CommandHandler;
use crate::flag::has_help_flag;
use crate::host_tool::HostToolTarget;
use crate::request::CommandRequest;
use crate::selector::{parse_selector_options, select_instance};

const CVD_ENV_BIN: &str = "cvd_internal_env";

const DETAILED_HELP: &str = r#"
Usage:
cvd env ls - lists all available services per instance
cvd env ls $SERVICE_NAME - lists all methods for $SERVICE_NAME
cvd env ls $SERVICE_NAME $METHOD_NAME - list information on input + output message types for $SERVICE_NAME#$METHOD_NAME
cvd env type $SERVICE_NAME $REQUEST_MESSAGE_TYPE - outputs the proto the specified request message type
"#;

pub struct EnvCommand;

impl CommandHandler for EnvCommand {
    fn subcommands(&self) -> Vec<&'static str> {
        vec!["env"]
    }

    fn summary_help(&self) -> String {
        "Enumerate + Query APIs for all gRPC services made available by this virtual device \
         instance"
            .to_string()
    }

    fn detailed_help(&self, _args: &[String]) -> String {
        DETAILED_HELP.to_string()
    }

    fn should_intercept_help(&self) -> bool {
        true
    }

    fn handle(&self, context: &Context, request: &CommandRequest) -> Result<()> {
        let mut args = request.args.clone();
        let spec = if has_help_flag(&args) {
            let artifacts = cvd_core::resolver::android_host_path(&request.env)?;
            let mut envs = request.env.clone();
            envs.insert(ANDROID_HOST_OUT.to_string(), artifacts.to_string_lossy().into_owned());
            CommandSpec::new(HostToolTarget::new(artifacts).bin_path(CVD_ENV_BIN))
                .args(args)
                .envs(envs)
        } else {
            let selector_options = parse_selector_options(&mut args)?;
            let (instance, group) =
                select_instance(&context.db, &selector_options, &request.env)?;
            // The helper addresses the device by its internal name.
            let mut helper_args = vec![format!("cvd-{}", instance.id)];
            helper_args.extend(args);
            CommandSpec::new(
                HostToolTarget::new(group.host_artifacts_path()).bin_path(CVD_ENV_BIN),
            )
            .args(helper_args)
            .envs(super::group_env(&request.env, &group))
            .working_dir(std::env::current_dir()?)
        };

        let supervisor = Supervisor::new();
        supervisor.launch(&spec)?;
        super::forward_helper_exit(CVD_ENV_BIN, supervisor.wait()?)
    }
}
