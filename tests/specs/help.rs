// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help surface specs.

use super::prelude::TestEnv;

#[test]
fn bare_invocation_prints_the_command_summary() {
    let env = TestEnv::new();
    let output = env.cvd().assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).into_owned();
    assert!(stdout.contains("usage: cvd"));
    assert!(stdout.contains("create"));
    assert!(stdout.contains("load"));
}

#[test]
fn help_subcommand_prints_the_same_summary() {
    let env = TestEnv::new();
    let output = env.cvd().arg("help").assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).into_owned();
    assert!(stdout.contains("usage: cvd"));
}

#[test]
fn unknown_subcommand_fails_with_guidance() {
    let env = TestEnv::new();
    let output = env.cvd().arg("teleport").assert().failure().code(1);
    let stderr = String::from_utf8_lossy(&output.get_output().stderr).into_owned();
    assert!(stderr.contains("unknown sub-command"), "stderr was: {stderr}");
}

#[test]
fn intercepting_commands_answer_help_themselves() {
    let env = TestEnv::new();
    let output = env.cvd().args(["load", "--help"]).assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).into_owned();
    assert!(stdout.contains("cvd load <config_filepath>"), "stdout was: {stdout}");

    let output = env.cvd().args(["restart", "--help"]).assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).into_owned();
    assert!(stdout.contains("wait_for_launcher"), "stdout was: {stdout}");
}
