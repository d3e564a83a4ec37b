// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cvd: control plane for groups of locally-hosted virtual devices.

mod commands;
mod context;
mod dispatcher;
mod flag;
mod host_tool;
mod operator;
mod request;
mod selector;

use std::ffi::OsString;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Arg, ArgAction};

use crate::commands::HelperExit;
use crate::context::Context;
use crate::request::CommandRequest;

fn cli() -> clap::Command {
    clap::Command::new("cvd")
        .about("Manage groups of locally-hosted Android virtual devices")
        .after_help("Run 'cvd help' for the sub-command list.")
        .arg(
            Arg::new("verbosity")
                .long("verbosity")
                .value_name("LEVEL")
                .help("Log verbosity: VERBOSE, DEBUG, INFO, WARNING or ERROR")
                .action(ArgAction::Set),
        )
        .allow_external_subcommands(true)
}

fn init_tracing(verbosity: Option<&str>) -> Result<()> {
    let level = match verbosity {
        None => "info",
        Some("VERBOSE") => "trace",
        Some("DEBUG") => "debug",
        Some("INFO") => "info",
        Some("WARNING") => "warn",
        Some("ERROR") => "error",
        Some(other) => bail!("verbosity \"{other}\" is unrecognized"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn run() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_one::<String>("verbosity").map(String::as_str))?;

    let Some((subcommand, sub_matches)) = matches.subcommand() else {
        println!("{}", dispatcher::summary_help());
        return Ok(());
    };
    let args: Vec<String> = sub_matches
        .get_many::<OsString>("")
        .into_iter()
        .flatten()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    if subcommand == "help" {
        println!("{}", dispatcher::summary_help());
        return Ok(());
    }

    let request = CommandRequest::new(subcommand, args, cvd_core::env::snapshot());
    let context = Context::new();
    dispatcher::dispatch(&context, &request)
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error:#}");
            // Forwarding commands propagate the helper tool's exit code.
            let code = match error.downcast_ref::<HelperExit>() {
                Some(helper_exit) => helper_exit.code.clamp(0, 255) as u8,
                None => 1,
            };
            ExitCode::from(code)
        }
    }
}
