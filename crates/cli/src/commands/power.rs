// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cvd restart` / `powerwash` / `powerbtn`: single-instance power
//! operations forwarded to the matching helper.

use anyhow::{bail, Result};

use cvd_core::env::CUTTLEFISH_INSTANCE;
use cvd_engine::{check_normal_exit, CommandSpec, Supervisor};

use crate::context::Context;
use crate::dispatcher::CommandHandler;
use crate::flag::{filter_i32_flag, has_help_flag};
use crate::host_tool::HostToolTarget;
use crate::request::CommandRequest;
use crate::selector::{parse_selector_options, select_instance};

const RESTART_HELP: &str = r#"restart: Reboots the virtual device

Flags:
    -boot_timeout (How many seconds to wait for the device to reboot.)
      type: int32 default: 500
    -wait_for_launcher (How many seconds to wait for the launcher to respond to
      the status command. A value of zero means wait indefinitely.) type: int32
      default: 30
"#;

const POWERWASH_HELP: &str = r#"powerwash: Resets device state to first boot. Functionally equivalent to
removing the device and creating it again, but more efficient.

Flags:
    -boot_timeout (How many seconds to wait for the device to reboot.)
      type: int32 default: 500
    -wait_for_launcher (How many seconds to wait for the launcher to respond to
      the status command. A value of zero means wait indefinitely.) type: int32
      default: 30
"#;

const POWERBTN_HELP: &str = "powerbtn: Triggers a power button event\n";

struct PowerOptions {
    wait_for_launcher_seconds: i32,
    boot_timeout_seconds: i32,
}

/// `--wait_for_launcher` and `--boot_timeout` are distinct flags with
/// their own defaults.
fn options_from_args(args: &mut Vec<String>) -> Result<PowerOptions> {
    let wait_for_launcher = filter_i32_flag(args, "wait_for_launcher")?.unwrap_or(30);
    let boot_timeout = filter_i32_flag(args, "boot_timeout")?.unwrap_or(500);
    Ok(PowerOptions {
        wait_for_launcher_seconds: wait_for_launcher,
        boot_timeout_seconds: boot_timeout,
    })
}

pub struct PowerCommand;

impl CommandHandler for PowerCommand {
    fn subcommands(&self) -> Vec<&'static str> {
        vec!["restart", "powerwash", "powerbtn"]
    }

    fn summary_help(&self) -> String {
        "Trigger power button event on the device, reset device to first boot state, restart \
         device"
            .to_string()
    }

    fn detailed_help(&self, args: &[String]) -> String {
        match args.first().map(String::as_str) {
            Some("powerwash") => POWERWASH_HELP.to_string(),
            Some("powerbtn") => POWERBTN_HELP.to_string(),
            _ => RESTART_HELP.to_string(),
        }
    }

    fn should_intercept_help(&self) -> bool {
        false
    }

    fn handle(&self, context: &Context, request: &CommandRequest) -> Result<()> {
        let op = request.subcommand.as_str();
        let mut args = request.args.clone();
        if has_help_flag(&args) {
            let help = match op {
                "restart" => RESTART_HELP,
                "powerwash" => POWERWASH_HELP,
                "powerbtn" => POWERBTN_HELP,
                _ => bail!("unsupported sub-command: {op}"),
            };
            print!("{help}");
            return Ok(());
        }

        let selector_options = parse_selector_options(&mut args)?;
        let (instance, group) = select_instance(&context.db, &selector_options, &request.env)?;

        let tool = HostToolTarget::new(group.host_artifacts_path());
        let (bin, helper_args) = match op {
            "restart" => {
                let options = options_from_args(&mut args)?;
                let bin = tool.restart_bin()?;
                let args = power_args(&options, &tool, &bin);
                (bin, args)
            }
            "powerwash" => {
                let options = options_from_args(&mut args)?;
                let bin = tool.powerwash_bin()?;
                let args = power_args(&options, &tool, &bin);
                (bin, args)
            }
            "powerbtn" => (tool.powerbtn_bin()?, Vec::new()),
            _ => bail!("unsupported sub-command: {op}"),
        };

        // The helper reads the target instance from the environment.
        let mut envs = super::group_env(&request.env, &group);
        envs.insert(CUTTLEFISH_INSTANCE.to_string(), instance.id.to_string());

        let spec = CommandSpec::new(tool.bin_path(&bin))
            .args(helper_args)
            .envs(envs)
            .working_dir(std::env::current_dir()?);
        let supervisor = Supervisor::new();
        supervisor.launch(&spec)?;
        check_normal_exit(&bin, supervisor.wait()?, 0)?;
        Ok(())
    }
}

/// Old helper builds only know `--wait_for_launcher`; `--boot_timeout`
/// is forwarded when the helpxml probe confirms support.
fn power_args(options: &PowerOptions, tool: &HostToolTarget, bin: &str) -> Vec<String> {
    let mut args = vec![format!("--wait_for_launcher={}", options.wait_for_launcher_seconds)];
    match tool.supports_flag(bin, "boot_timeout") {
        Ok(true) => args.push(format!("--boot_timeout={}", options.boot_timeout_seconds)),
        Ok(false) => {}
        Err(e) => tracing::debug!("flag probe for {bin} failed: {e:#}"),
    }
    args
}

#[cfg(test)]
#[path = "power_tests.rs"]
mod tests;
