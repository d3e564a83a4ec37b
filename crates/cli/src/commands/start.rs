// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cvd start`: boot the instances of an existing group.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, bail, Context as _, Result};
use tracing::{error, info, warn};

use cvd_core::env::{
    ANDROID_HOST_OUT, ANDROID_PRODUCT_OUT, ANDROID_SOONG_HOST_OUT, CUTTLEFISH_INSTANCE, CVD_MARK,
};
use cvd_core::resolver::{emulate_absolute_path, InputPathForm};
use cvd_core::{Clock, Envs, InstanceGroup, InstanceState};
use cvd_engine::{check_normal_exit, push_interrupt_listener, CommandSpec, ExitStatus, Supervisor};

use crate::context::Context;
use crate::dispatcher::CommandHandler;
use crate::flag::{filter_value_flag, has_help_flag, parse_bool};
use crate::host_tool::HostToolTarget;
use crate::operator::{OperatorControlConn, DEFAULT_OPERATOR_CONTROL_SOCKET};
use crate::request::CommandRequest;
use crate::selector::start::parse_start_options;
use crate::selector::{parse_selector_options, select_group};

pub struct StartCommand;

impl CommandHandler for StartCommand {
    fn subcommands(&self) -> Vec<&'static str> {
        vec!["start", "launch_cvd"]
    }

    fn summary_help(&self) -> String {
        "Start a virtual device or environment".to_string()
    }

    fn detailed_help(&self, _args: &[String]) -> String {
        "Run cvd start --help for the full help text".to_string()
    }

    fn should_intercept_help(&self) -> bool {
        false
    }

    fn handle(&self, context: &Context, request: &CommandRequest) -> Result<()> {
        let mut args = request.args.clone();
        if filter_value_flag(&mut args, "config_file")?.is_some() {
            bail!("the 'start' command doesn't accept --config_file, did you mean 'create'?");
        }
        let mut envs = request.env.clone();
        normalize_home(&mut envs)?;

        if has_help_flag(&args) {
            return run_help(&envs, &args);
        }

        if !context.db.has_instance_groups()? {
            bail!(super::no_group_message(&request.subcommand));
        }

        let selector_options = parse_selector_options(&mut args)?;
        // The id flags are rebuilt from the group record below, but any
        // user-supplied combination must still be consistent.
        parse_start_options(&selector_options, &mut args, &envs)?;
        let group = select_group(&context.db, &selector_options, &envs)
            .context("failed to select group to start, did you mean 'cvd create'?")?;
        if group.has_active_instances() {
            bail!(
                "selected instance group is already started, use 'cvd create' to create a new one"
            );
        }
        launch_group(context, group, args, envs)
    }
}

/// HOME may be a relative path or carry `~` from the caller's shell; it
/// is normalized before anything touches the filesystem.
pub(crate) fn normalize_home(envs: &mut Envs) -> Result<()> {
    let Some(home) = envs.get("HOME").cloned() else {
        return Ok(());
    };
    if home.is_empty() {
        envs.remove("HOME");
        return Ok(());
    }
    if home.starts_with('~') {
        bail!("the HOME directory should not start with ~");
    }
    let normalized = emulate_absolute_path(&InputPathForm {
        path_to_convert: &home,
        current_working_dir: None,
        home_dir: None,
        follow_symlink: false,
    })?;
    envs.insert("HOME".to_string(), normalized.to_string_lossy().into_owned());
    Ok(())
}

fn run_help(envs: &Envs, args: &[String]) -> Result<()> {
    let (artifacts, bin) =
        crate::host_tool::bin_from_env(envs, &["cvd_internal_start", "launch_cvd"]).context(
            "\nTry running this command from the same directory as the downloaded or fetched \
             host tools",
        )?;
    let spec = CommandSpec::new(crate::host_tool::tool_path(&artifacts, &bin))
        .args(args.iter().cloned())
        .envs(envs.clone());
    let supervisor = Supervisor::new();
    supervisor.launch(&spec)?;
    let status = supervisor.wait()?;
    // gflags exits with 1 after help output.
    check_normal_exit(&bin, status, 1)?;
    Ok(())
}

/// Reject `--nodaemon` and false-y `--daemon` values; the launcher always
/// runs daemonized under cvd.
pub(crate) fn consume_daemon_flag(args: &mut Vec<String>) -> Result<()> {
    const POSSIBLE_CMDS: &str = "\"cvd start\" or \"launch_cvd\"";
    let mut kept = Vec::with_capacity(args.len());
    for arg in args.drain(..) {
        let body = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-')).unwrap_or("");
        if body == "nodaemon" {
            bail!("--nodaemon is not supported by {POSSIBLE_CMDS}");
        }
        if body == "daemon" {
            continue;
        }
        if let Some(value) = body.strip_prefix("daemon=") {
            if value.contains(',') {
                bail!("'{value}' had a comma that is not allowed");
            }
            match parse_bool(value) {
                Some(true) => continue,
                Some(false) => {
                    bail!("\"{arg}\" was given and is not supported by {POSSIBLE_CMDS}")
                }
                None => bail!(
                    "invalid --daemon option: {arg}. {POSSIBLE_CMDS} supports only \
                     \"--daemon=true\""
                ),
            }
        }
        kept.push(arg);
    }
    *args = kept;
    args.push("--daemon=true".to_string());
    Ok(())
}

/// Replace any user-supplied id flags with ones matching the group
/// record: a contiguous range keeps the base+count form, anything else
/// gets the explicit list.
pub(crate) fn update_instance_args(args: &mut Vec<String>, group: &InstanceGroup) -> Result<()> {
    filter_value_flag(args, "instance_nums")?;
    filter_value_flag(args, "num_instances")?;
    filter_value_flag(args, "base_instance_num")?;

    let ids: Vec<u32> = group.instances().iter().map(|i| i.id).collect();
    let first = *ids.first().ok_or_else(|| anyhow!("group has no instances"))?;
    let consecutive = ids.iter().enumerate().all(|(i, id)| *id == first + i as u32);
    if consecutive {
        args.push(format!("--num_instances={}", ids.len()));
        args.push(format!("--base_instance_num={first}"));
    } else {
        let list: Vec<String> = ids.iter().map(u32::to_string).collect();
        args.push(format!("--instance_nums={}", list.join(",")));
    }
    Ok(())
}

/// Fill empty webrtc device ids with generated `{group}-{name}-{id}`
/// ones, de-colliding against user-supplied ids with an `_<k>` suffix.
pub(crate) fn update_webrtc_device_ids(
    args: &mut Vec<String>,
    group: &mut InstanceGroup,
) -> Result<()> {
    let mut webrtc_ids: Vec<String> = match filter_value_flag(args, "webrtc_device_id")? {
        Some(value) => value.split(',').map(str::to_string).collect(),
        None => Vec::new(),
    };
    while webrtc_ids.len() < group.instances().len() {
        webrtc_ids.push(String::new());
    }
    if webrtc_ids.len() > group.instances().len() {
        bail!("specified more webrtc device ids than instances");
    }

    let mut used: HashSet<String> =
        webrtc_ids.iter().filter(|id| !id.is_empty()).cloned().collect();
    for (i, webrtc_id) in webrtc_ids.iter_mut().enumerate() {
        if !webrtc_id.is_empty() {
            continue;
        }
        let instance = &group.instances()[i];
        let generated = format!("{}-{}-{}", group.group_name(), instance.name, instance.id);
        let mut candidate = generated.clone();
        for k in 1.. {
            if !used.contains(&candidate) {
                break;
            }
            candidate = format!("{generated}_{k}");
        }
        used.insert(candidate.clone());
        *webrtc_id = candidate;
    }
    args.push(format!("--webrtc_device_id={}", webrtc_ids.join(",")));

    for (instance, webrtc_id) in group.instances_mut().iter_mut().zip(webrtc_ids) {
        instance.webrtc_device_id = webrtc_id;
    }
    Ok(())
}

fn launch_env(base: &Envs, group: &InstanceGroup) -> Result<Envs> {
    let first = group.instances().first().ok_or_else(|| anyhow!("group has no instances"))?;
    let mut envs = base.clone();
    envs.insert("HOME".to_string(), group.home_dir().to_string_lossy().into_owned());
    envs.insert(
        ANDROID_HOST_OUT.to_string(),
        group.host_artifacts_path().to_string_lossy().into_owned(),
    );
    // Old branches read the soong variant instead.
    envs.insert(
        ANDROID_SOONG_HOST_OUT.to_string(),
        group.host_artifacts_path().to_string_lossy().into_owned(),
    );
    envs.insert(ANDROID_PRODUCT_OUT.to_string(), group.product_out_env());
    envs.insert(CVD_MARK.to_string(), "true".to_string());
    envs.insert(CUTTLEFISH_INSTANCE.to_string(), first.id.to_string());
    Ok(envs)
}

/// The shared launch path of `create` and `start`: rebuild the launcher
/// argv, mark the group STARTING, run the launcher under an interrupt
/// listener, and record the outcome.
pub(crate) fn launch_group(
    context: &Context,
    mut group: InstanceGroup,
    mut args: Vec<String>,
    envs: Envs,
) -> Result<()> {
    consume_daemon_flag(&mut args)?;
    update_instance_args(&mut args, &group)?;
    update_webrtc_device_ids(&mut args, &mut group)?;
    let envs = launch_env(&envs, &group)?;

    // The launcher stages per-group artifacts under the assembly dir.
    std::fs::create_dir_all(group.assembly_dir())
        .with_context(|| format!("failed to create {}", group.assembly_dir().display()))?;

    let tool = HostToolTarget::new(group.host_artifacts_path());
    let bin = tool.start_bin().with_context(|| {
        format!("\"{}\" is not a tool directory", group.host_artifacts_path().display())
    })?;
    let spec = CommandSpec::new(tool.bin_path(&bin))
        .args(args)
        .envs(envs)
        .working_dir(std::env::current_dir()?)
        .stdout_to_stderr();

    let supervisor = Supervisor::new();
    // The database must reflect the cancellation if a signal lands while
    // the launcher runs.
    let listener_handle = {
        let supervisor = supervisor.clone();
        let db = context.db.clone();
        let mut group = group.clone();
        push_interrupt_listener(move |signal| {
            warn!(signal, "signal received, cleaning up");
            if let Err(e) = supervisor.interrupt() {
                error!("failed to stop subprocesses: {e}");
                error!(
                    "devices may still be executing in the background, run 'cvd reset' to \
                     ensure a clean state"
                );
            }
            group.set_all_states(InstanceState::Cancelled);
            if let Err(e) = db.update_instance_group(&group) {
                error!("failed to update group status: {e}");
            }
            // The group may have reached RUNNING just before this fires,
            // but then the instances are indeed running.
            std::process::exit(128 + signal);
        })?
    };

    group.set_all_states(InstanceState::Starting);
    group.set_start_time_secs(context.clock.epoch_secs());
    context.db.update_instance_group(&group)?;

    let launch_result = launch_device(&supervisor, &spec, &group);
    if let Err(e) = launch_result {
        group.set_all_states(InstanceState::BootFailed);
        context.db.update_instance_group(&group)?;
        return Err(e);
    }

    group.set_all_states(InstanceState::Running);
    context.db.update_instance_group(&group)?;
    drop(listener_handle);

    println!("{}", serde_json::to_string_pretty(&group.status_json())?);
    Ok(())
}

fn launch_device(
    supervisor: &Supervisor,
    spec: &CommandSpec,
    group: &InstanceGroup,
) -> Result<()> {
    // Keep the connection open until the devices have registered
    // themselves; dropping it earlier loses the pre-registration and the
    // group won't show in the UI.
    let _operator_conn = preregister_group(group)
        .map_err(|e| {
            error!("failed to pre-register devices with operator, group information won't show in the UI: {e:#}");
        })
        .ok();

    info!(bin = %spec.bin_path.display(), "launching device group");
    supervisor.launch(spec)?;
    let status = supervisor.wait()?;
    if !matches!(status, ExitStatus::NormalExit(0)) {
        info!("device launch failed, cleaning up");
        // Launcher processes may still be running in the background; stop
        // them before recording the failure.
        if let Some(first) = group.instances().first() {
            if let Err(e) = cvd_engine::forcefully_stop_instance(first.id) {
                warn!("failed to clean up after launch failure: {e}");
            }
        }
        check_normal_exit("device launcher", status, 0)?;
    }
    Ok(())
}

fn preregister_group(group: &InstanceGroup) -> Result<OperatorControlConn> {
    let conn = OperatorControlConn::connect(Path::new(DEFAULT_OPERATOR_CONTROL_SOCKET))?;
    conn.preregister(group, &current_user_name())?;
    Ok(conn)
}

fn current_user_name() -> String {
    if let Ok(user) = std::env::var("USER") {
        if !user.is_empty() {
            return user;
        }
    }
    nix::unistd::User::from_uid(nix::unistd::getuid())
        .ok()
        .flatten()
        .map(|u| u.name)
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
#[path = "start_tests.rs"]
mod tests;
