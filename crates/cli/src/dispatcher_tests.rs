// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn every_spec_subcommand_has_a_handler() {
    let handlers = registry();
    for subcommand in [
        "create",
        "start",
        "launch_cvd",
        "stop",
        "stop_cvd",
        "restart",
        "powerwash",
        "powerbtn",
        "remove",
        "rm",
        "bugreport",
        "host_bugreport",
        "cvd_host_bugreport",
        "env",
        "load",
        "fetch",
    ] {
        assert!(
            handlers.iter().any(|h| h.subcommands().contains(&subcommand)),
            "no handler claims '{subcommand}'"
        );
    }
}

#[test]
fn no_two_handlers_claim_the_same_name() {
    let mut seen = std::collections::HashSet::new();
    for handler in registry() {
        for name in handler.subcommands() {
            assert!(seen.insert(name), "'{name}' is claimed twice");
        }
    }
}

#[test]
fn unknown_subcommand_is_reported() {
    let context = Context::new();
    let request = CommandRequest::new("teleport", Vec::new(), cvd_core::Envs::new());
    let err = dispatch(&context, &request).unwrap_err();
    assert!(err.to_string().contains("unknown sub-command"));
}

#[test]
fn summary_lists_all_commands() {
    let summary = summary_help();
    assert!(summary.contains("usage: cvd"));
    for name in ["create", "start", "stop", "remove", "bugreport", "env", "load"] {
        assert!(summary.contains(name), "summary misses '{name}':\n{summary}");
    }
}
