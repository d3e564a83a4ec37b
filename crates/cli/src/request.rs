// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A parsed sub-command invocation.

use cvd_core::Envs;

/// One sub-command invocation: the name, its remaining arguments, and a
/// snapshot of the environment it runs against. Selector flags stay in
/// `args` until a selector parser consumes them.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub subcommand: String,
    pub args: Vec<String>,
    pub env: Envs,
}

impl CommandRequest {
    pub fn new(
        subcommand: impl Into<String>,
        args: impl IntoIterator<Item = String>,
        env: Envs,
    ) -> Self {
        Self { subcommand: subcommand.into(), args: args.into_iter().collect(), env }
    }
}
