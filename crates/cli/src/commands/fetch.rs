// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cvd fetch`: forward to the external artifact download tool.

use anyhow::{Context as _, Result};

use cvd_engine::{check_normal_exit, CommandSpec, Supervisor};

use crate::context::Context;
use crate::dispatcher::CommandHandler;
use crate::request::CommandRequest;

const FETCH_BIN: &str = "fetch_cvd";

pub struct FetchCommand;

impl CommandHandler for FetchCommand {
    fn subcommands(&self) -> Vec<&'static str> {
        vec!["fetch", "fetch_cvd"]
    }

    fn summary_help(&self) -> String {
        "Download build artifacts through the fetch tool".to_string()
    }

    fn detailed_help(&self, _args: &[String]) -> String {
        format!("Run {FETCH_BIN} --help for the full help text")
    }

    fn should_intercept_help(&self) -> bool {
        false
    }

    fn handle(&self, _context: &Context, request: &CommandRequest) -> Result<()> {
        // The download tool ships separately and resolves through PATH.
        let spec = CommandSpec::new(FETCH_BIN)
            .args(request.args.clone())
            .envs(request.env.clone())
            .working_dir(std::env::current_dir()?);
        let supervisor = Supervisor::new();
        supervisor
            .launch(&spec)
            .with_context(|| format!("'{FETCH_BIN}' was not found on PATH"))?;
        check_normal_exit(FETCH_BIN, supervisor.wait()?, 0)?;
        Ok(())
    }
}
