// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cvd load`: expand a JSON environment config into fetch and
//! create+start invocations.

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use parking_lot::Mutex;
use tracing::error;

use cvd_core::env::{ANDROID_HOST_OUT, ANDROID_PRODUCT_OUT, ANDROID_SOONG_HOST_OUT};
use cvd_core::{Envs, InstanceState};
use cvd_engine::push_interrupt_listener;
use cvd_storage::{CreateGroupParams, InstanceParams, Query};

use cvd_config::{get_cvd_flags, get_load_flags, CvdFlags};

use crate::context::Context;
use crate::dispatcher::{self, CommandHandler};
use crate::request::CommandRequest;

const SUMMARY_HELP: &str =
    "Loads the given JSON configuration file and launches devices based on the options provided";

const DETAILED_HELP: &str = r#"
Warning: This command is deprecated, use cvd create --config_file instead.

Usage:
cvd load <config_filepath> [--override=<key>:<value>]

Reads the fields in the JSON configuration file and translates them to corresponding create command and flags.

Optionally fetches remote artifacts prior to launching the environment.

The --override flag can be used to give new values for properties in the config file without needing to edit the file directly. Convenient for one-off invocations.
"#;

pub struct LoadCommand;

impl CommandHandler for LoadCommand {
    fn subcommands(&self) -> Vec<&'static str> {
        vec!["load"]
    }

    fn summary_help(&self) -> String {
        SUMMARY_HELP.to_string()
    }

    fn detailed_help(&self, _args: &[String]) -> String {
        DETAILED_HELP.to_string()
    }

    fn should_intercept_help(&self) -> bool {
        true
    }

    fn handle(&self, context: &Context, request: &CommandRequest) -> Result<()> {
        let mut args = request.args.clone();
        let selector_options = crate::selector::parse_selector_options(&mut args)?;
        let load_flags = get_load_flags(&args, &std::env::current_dir()?)?;
        let mut cvd_flags = get_cvd_flags(&load_flags, &context.clock)?;
        // A selector flag wins over the group name in the config file.
        if selector_options.group_name.is_some() {
            cvd_flags.group_name = selector_options.group_name;
        }
        let group_home = cvd_flags.load_directories.launch_home_directory.clone();

        // The listener may fire before the group exists; it must never
        // observe a half-created record, so creation and the listener's
        // lookup serialize on this mutex.
        let creation_mutex = Arc::new(Mutex::new(()));
        let listener_handle = {
            let creation_mutex = Arc::clone(&creation_mutex);
            let db = context.db.clone();
            let group_home = group_home.clone();
            push_interrupt_listener(move |signal| {
                error!("interrupt signal received");
                let _guard = creation_mutex.lock();
                match db.find_group(&Query::home(group_home.clone())) {
                    Ok(mut group) => {
                        group.set_all_states(InstanceState::Cancelled);
                        if let Err(e) = db.update_instance_group(&group) {
                            error!("failed to update group status: {e}");
                        }
                    }
                    Err(e) => {
                        error!("failed to load group from database: {e}");
                    }
                }
                std::process::exit(128 + signal);
            })?
        };

        let group = {
            let _guard = creation_mutex.lock();
            context.db.create_instance_group(create_params(&cvd_flags), &context.clock)
        }?;

        let load_result = load_group(context, request, &cvd_flags, group.group_name());
        if let Err(e) = load_result {
            // The failure may have hit during prepare (fetch) or launch.
            let mut group = context.db.find_group(&Query::home(group_home))?;
            let failed_state = match group.instances().first().map(|i| i.state) {
                Some(InstanceState::Preparing) => InstanceState::PrepareFailed,
                _ => InstanceState::BootFailed,
            };
            group.set_all_states(failed_state);
            context.db.update_instance_group(&group)?;
            return Err(e);
        }
        drop(listener_handle);
        Ok(())
    }
}

fn create_params(cvd_flags: &CvdFlags) -> CreateGroupParams {
    let directories = &cvd_flags.load_directories;
    CreateGroupParams {
        home: Some(directories.launch_home_directory.clone()),
        host_artifacts_path: directories.host_package_directory.clone(),
        product_out_paths: directories
            .system_image_directory_flag_value
            .split(',')
            .map(PathBuf::from)
            .collect(),
        group_name: cvd_flags.group_name.clone(),
        // Ids are allocated later by create.
        instances: cvd_flags
            .instance_names
            .iter()
            .map(|name| InstanceParams {
                id: 0,
                name: name.clone(),
                state: InstanceState::Preparing,
            })
            .collect(),
    }
}

fn load_group(
    context: &Context,
    request: &CommandRequest,
    cvd_flags: &CvdFlags,
    group_name: &str,
) -> Result<()> {
    let home = &cvd_flags.load_directories.launch_home_directory;
    std::fs::create_dir_all(home)
        .with_context(|| format!("failed to create group home {}", home.display()))?;
    std::fs::set_permissions(home, std::fs::Permissions::from_mode(0o775))?;

    if !cvd_flags.fetch_cvd_flags.is_empty() {
        let mut fetch_args = vec!["-verbosity".to_string(), "WARNING".to_string()];
        fetch_args.extend(cvd_flags.fetch_cvd_flags.iter().cloned());
        let fetch_request = CommandRequest::new("fetch", fetch_args, request.env.clone());
        dispatcher::dispatch(context, &fetch_request)
            .context("failed to fetch build artifacts")?;
    }

    let mut create_args = vec![
        "--daemon".to_string(),
        format!(
            "--system_image_dir={}",
            cvd_flags.load_directories.system_image_directory_flag_value
        ),
    ];
    create_args.extend(cvd_flags.launch_cvd_flags.iter().cloned());
    create_args.extend(cvd_flags.selector_flags.iter().cloned());
    create_args.push(format!("--group_name={group_name}"));

    let create_request =
        CommandRequest::new("create", create_args, launch_env(&request.env, cvd_flags));
    dispatcher::dispatch(context, &create_request)
}

/// The internal invocations inherit the caller env with HOME and the host
/// tool variables forced to the load's directories; the product out list
/// is cleared so the config's image directories win.
fn launch_env(base: &Envs, cvd_flags: &CvdFlags) -> Envs {
    let directories = &cvd_flags.load_directories;
    let mut envs = base.clone();
    envs.insert(
        "HOME".to_string(),
        directories.launch_home_directory.to_string_lossy().into_owned(),
    );
    envs.insert(
        ANDROID_HOST_OUT.to_string(),
        directories.host_package_directory.to_string_lossy().into_owned(),
    );
    envs.insert(
        ANDROID_SOONG_HOST_OUT.to_string(),
        directories.host_package_directory.to_string_lossy().into_owned(),
    );
    envs.remove(ANDROID_PRODUCT_OUT);
    envs
}
