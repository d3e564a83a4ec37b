// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Create → stop → remove lifecycle specs.

use serial_test::serial;

use super::prelude::TestEnv;

#[test]
#[serial]
fn create_boots_one_instance_and_reports_status() {
    let env = TestEnv::new();
    let output = env
        .cvd()
        .args(["create", "--daemon", "--num_instances=1", "--group_name=g1"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout).into_owned();
    let status: serde_json::Value =
        serde_json::from_str(&stdout).expect("status JSON on stdout");
    assert_eq!(status["group_name"], "g1");
    assert!(status["metrics_dir"].as_str().expect("metrics_dir").ends_with("metrics"));
    assert!(status["start_time"].is_string());
    assert_eq!(status["instances"][0]["id"], 1);
    assert_eq!(status["instances"][0]["name"], "1");
    assert_eq!(status["instances"][0]["state"], "RUNNING");

    let db = env.database();
    assert_eq!(db.as_array().expect("group list").len(), 1);
    assert_eq!(db[0]["group_name"], "g1");
    assert_eq!(env.instance_states(), ["RUNNING"]);
}

#[test]
#[serial]
fn stop_transitions_the_group_and_stops_only_once() {
    let env = TestEnv::new();
    env.cvd()
        .args(["create", "--daemon", "--num_instances=1", "--group_name=g1"])
        .assert()
        .success();

    env.cvd().arg("stop").assert().success();
    assert_eq!(env.instance_states(), ["STOPPED"]);

    // A second stop has nothing to act on.
    let output = env.cvd().arg("stop").assert().failure().code(1);
    let stderr = String::from_utf8_lossy(&output.get_output().stderr).into_owned();
    assert!(stderr.contains("not running"), "stderr was: {stderr}");
    assert_eq!(env.instance_states(), ["STOPPED"]);
}

#[test]
#[serial]
fn failed_launch_marks_the_group_boot_failed() {
    let env = TestEnv::new();
    env.install_helper("cvd_internal_start", "#!/bin/sh\necho boom 1>&2\nexit 9\n");
    env.cvd()
        .args(["create", "--daemon", "--group_name=g1"])
        .assert()
        .failure();
    assert_eq!(env.instance_states(), ["BOOT_FAILED"]);
}

#[test]
#[serial]
fn remove_deletes_the_group_record_and_generated_artifacts() {
    let env = TestEnv::new();
    env.cvd()
        .args(["create", "--daemon", "--group_name=g1"])
        .assert()
        .success();
    let home = env.database()[0]["home_directory"].as_str().expect("home").to_string();
    assert!(std::path::Path::new(&home).is_dir());

    env.cvd().arg("rm").assert().success();
    assert_eq!(env.database().as_array().expect("group list").len(), 0);
    // The generated base directory goes with the record.
    assert!(!std::path::Path::new(&home).exists());
}

#[test]
#[serial]
fn restart_forwards_to_the_helper() {
    let env = TestEnv::new();
    env.install_helper(
        "restart_cvd",
        "#!/bin/sh\n\
         if [ \"$1\" = \"--helpxml\" ]; then\n\
         echo '<flag><name>wait_for_launcher</name></flag><flag><name>boot_timeout</name></flag>'\n\
         exit 1\n\
         fi\n\
         case \"$1\" in --wait_for_launcher=*) ;; *) exit 2 ;; esac\n\
         case \"$2\" in --boot_timeout=*) ;; *) exit 2 ;; esac\n\
         exit 0\n",
    );
    env.cvd()
        .args(["create", "--daemon", "--group_name=g1"])
        .assert()
        .success();
    env.cvd().args(["restart", "--instance_name=1"]).assert().success();
}

#[test]
#[serial]
fn start_rejects_a_home_with_tilde() {
    let env = TestEnv::new();
    let output = env.cvd().arg("start").env("HOME", "~/d").assert().failure().code(1);
    let stderr = String::from_utf8_lossy(&output.get_output().stderr).into_owned();
    assert!(stderr.contains("should not start with ~"), "stderr was: {stderr}");
}

#[test]
#[serial]
fn start_requires_an_existing_group() {
    let env = TestEnv::new();
    let output = env.cvd().arg("start").assert().failure().code(1);
    let stderr = String::from_utf8_lossy(&output.get_output().stderr).into_owned();
    assert!(stderr.contains("cvd create"), "stderr was: {stderr}");
}
