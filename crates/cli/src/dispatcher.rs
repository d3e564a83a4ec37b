// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sub-command registry and routing.

use anyhow::{bail, Result};

use crate::commands;
use crate::context::Context;
use crate::flag::has_help_flag;
use crate::request::CommandRequest;

/// One sub-command implementation.
pub trait CommandHandler {
    /// Names this handler claims, aliases included.
    fn subcommands(&self) -> Vec<&'static str>;
    fn summary_help(&self) -> String;
    fn detailed_help(&self, args: &[String]) -> String;
    /// Whether a help flag is answered here instead of being forwarded to
    /// the helper tool.
    fn should_intercept_help(&self) -> bool;
    fn handle(&self, context: &Context, request: &CommandRequest) -> Result<()>;
}

fn registry() -> Vec<Box<dyn CommandHandler>> {
    vec![
        Box::new(commands::create::CreateCommand),
        Box::new(commands::start::StartCommand),
        Box::new(commands::stop::StopCommand),
        Box::new(commands::remove::RemoveCommand),
        Box::new(commands::power::PowerCommand),
        Box::new(commands::bugreport::BugreportCommand),
        Box::new(commands::env::EnvCommand),
        Box::new(commands::load::LoadCommand),
        Box::new(commands::fetch::FetchCommand),
    ]
}

/// Route a request to the handler claiming its sub-command. A help flag is
/// answered here when the handler opts in; otherwise the handler forwards
/// it to the helper tool.
pub fn dispatch(context: &Context, request: &CommandRequest) -> Result<()> {
    let handlers = registry();
    let Some(handler) =
        handlers.iter().find(|h| h.subcommands().contains(&request.subcommand.as_str()))
    else {
        bail!("unknown sub-command '{}', run 'cvd help'", request.subcommand);
    };
    if has_help_flag(&request.args) && handler.should_intercept_help() {
        println!("{}", handler.detailed_help(&request.args).trim_end());
        return Ok(());
    }
    handler.handle(context, request)
}

/// The `cvd help` summary: one line per sub-command.
pub fn summary_help() -> String {
    let mut lines = vec!["usage: cvd <command> [arguments...]".to_string(), String::new()];
    for handler in registry() {
        let names = handler.subcommands().join(", ");
        lines.push(format!("  {:<28} {}", names, handler.summary_help()));
    }
    lines.join("\n")
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
