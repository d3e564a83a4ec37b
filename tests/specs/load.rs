// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative config loading specs.

use serial_test::serial;

use super::prelude::TestEnv;

fn write_config(env: &TestEnv, contents: &str) -> String {
    let path = env.data_dir().join("env_config.json");
    std::fs::write(&path, contents).expect("config file");
    path.to_string_lossy().into_owned()
}

#[test]
#[serial]
fn load_creates_and_starts_the_described_group() {
    let env = TestEnv::new();
    // The load path points the helper env at the config's directories, so
    // the fake launcher must exist in the host package directory too.
    let base = env.data_dir().join("deploy");
    let host_package = base.join("host_package").join("bin");
    std::fs::create_dir_all(&host_package).expect("host package dir");
    for bin in ["cvd_internal_start", "cvd_internal_stop"] {
        std::fs::copy(env.artifacts_dir().join("bin").join(bin), host_package.join(bin))
            .expect("helper copy");
    }

    let config = write_config(
        &env,
        r#"{
            "common": { "group_name": "deployed" },
            "instances": [ { "name": "phone", "vm": { "crosvm": {} } } ]
        }"#,
    );
    env.cvd()
        .args(["load", &config, &format!("--base_directory={}", base.display())])
        .assert()
        .success();

    let db = env.database();
    assert_eq!(db[0]["group_name"], "deployed");
    assert_eq!(db[0]["instances"][0]["name"], "phone");
    assert_eq!(env.instance_states(), ["RUNNING"]);
}

#[test]
#[serial]
fn interrupted_load_cancels_the_group() {
    let env = TestEnv::new();
    let base = env.data_dir().join("deploy");
    std::fs::create_dir_all(base.join("host_package").join("bin")).expect("host package dir");
    // The fetch step interrupts the foreground command, standing in for a
    // user's ctrl-c between fetch and start.
    env.install_helper(
        "fetch_cvd",
        "#!/bin/sh\nexec >/dev/null 2>&1\nkill -INT $PPID\nsleep 3\n",
    );

    let config = write_config(
        &env,
        r#"{
            "common": { "group_name": "deployed" },
            "instances": [
                { "disk": { "default_build": "aosp-main/cf_x86_64_phone-userdebug" } },
                { "disk": { "default_build": "aosp-main/cf_x86_64_phone-userdebug" } }
            ]
        }"#,
    );
    let assert = env
        .cvd()
        .args(["load", &config, &format!("--base_directory={}", base.display())])
        .assert()
        .failure();
    let code = assert.get_output().status.code();
    assert_eq!(code, Some(130), "expected the SIGINT exit code, got {code:?}");

    assert_eq!(env.instance_states(), ["CANCELLED", "CANCELLED"]);
}

#[test]
#[serial]
fn failed_fetch_marks_the_group_prepare_failed() {
    let env = TestEnv::new();
    let base = env.data_dir().join("deploy");
    env.install_helper("fetch_cvd", "#!/bin/sh\nexit 7\n");

    let config = write_config(
        &env,
        r#"{ "instances": [ { "disk": { "default_build": "aosp-main/cf" } } ] }"#,
    );
    env.cvd()
        .args(["load", &config, &format!("--base_directory={}", base.display())])
        .assert()
        .failure();
    assert_eq!(env.instance_states(), ["PREPARE_FAILED"]);
}

#[test]
#[serial]
fn overrides_edit_the_loaded_config() {
    let env = TestEnv::new();
    let base = env.data_dir().join("deploy");
    let host_package = base.join("host_package").join("bin");
    std::fs::create_dir_all(&host_package).expect("host package dir");
    // The launcher records its argv so the spec can check the flag value.
    let argv_log = env.data_dir().join("launcher_argv");
    env.install_helper(
        "cvd_internal_start",
        &format!("#!/bin/sh\necho \"$@\" > {}\nexit 0\n", argv_log.display()),
    );
    std::fs::copy(
        env.artifacts_dir().join("bin").join("cvd_internal_start"),
        host_package.join("cvd_internal_start"),
    )
    .expect("helper copy");
    std::fs::set_permissions(
        host_package.join("cvd_internal_start"),
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::Permissions::from_mode(0o755)
        },
    )
    .expect("helper permissions");

    let config = write_config(
        &env,
        r#"{ "instances": [ { "vm": { "memory_mb": 2048 } } ] }"#,
    );
    env.cvd()
        .args([
            "load",
            &config,
            &format!("--base_directory={}", base.display()),
            "--override=instances.0.vm.memory_mb:8192",
        ])
        .assert()
        .success();

    let argv = std::fs::read_to_string(&argv_log).expect("launcher argv log");
    assert!(argv.contains("--memory_mb=8192"), "argv was: {argv}");
    assert!(argv.contains("--daemon=true"), "argv was: {argv}");
}
