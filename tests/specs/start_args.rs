// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start argument consistency specs.

use serial_test::serial;

use super::prelude::TestEnv;

#[test]
#[serial]
fn mismatched_id_flags_are_rejected() {
    let env = TestEnv::new();
    env.cvd()
        .args(["create", "--daemon", "--group_name=g1"])
        .assert()
        .success();
    env.cvd().arg("stop").assert().success();

    let output = env
        .cvd()
        .args(["start", "--instance_nums=2,5,6", "--instance_name=a,b"])
        .assert()
        .failure()
        .code(1);
    let stderr = String::from_utf8_lossy(&output.get_output().stderr).into_owned();
    assert!(stderr.contains("do not match"), "stderr was: {stderr}");
}

#[test]
#[serial]
fn nodaemon_is_rejected_with_guidance() {
    let env = TestEnv::new();
    env.cvd()
        .args(["create", "--daemon", "--group_name=g1"])
        .assert()
        .success();
    env.cvd().arg("stop").assert().success();

    let output = env.cvd().args(["start", "--nodaemon"]).assert().failure().code(1);
    let stderr = String::from_utf8_lossy(&output.get_output().stderr).into_owned();
    assert!(stderr.contains("--nodaemon is not supported"), "stderr was: {stderr}");
}

#[test]
#[serial]
fn start_restarts_a_stopped_group() {
    let env = TestEnv::new();
    env.cvd()
        .args(["create", "--daemon", "--num_instances=2", "--group_name=g1"])
        .assert()
        .success();
    env.cvd().arg("stop").assert().success();
    assert_eq!(env.instance_states(), ["STOPPED", "STOPPED"]);

    env.cvd().arg("start").assert().success();
    assert_eq!(env.instance_states(), ["RUNNING", "RUNNING"]);
}

#[test]
#[serial]
fn starting_an_active_group_is_rejected() {
    let env = TestEnv::new();
    env.cvd()
        .args(["create", "--daemon", "--group_name=g1"])
        .assert()
        .success();
    let output = env.cvd().arg("start").assert().failure().code(1);
    let stderr = String::from_utf8_lossy(&output.get_output().stderr).into_owned();
    assert!(stderr.contains("already started"), "stderr was: {stderr}");
}

#[test]
#[serial]
fn config_file_belongs_to_create() {
    let env = TestEnv::new();
    let output = env
        .cvd()
        .args(["start", "--config_file=/tmp/cfg.json"])
        .assert()
        .failure()
        .code(1);
    let stderr = String::from_utf8_lossy(&output.get_output().stderr).into_owned();
    assert!(stderr.contains("did you mean 'create'"), "stderr was: {stderr}");
}
