// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture for the end-to-end specs.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A hermetic cvd installation: its own data directory, home, and a fake
/// host artifacts tree whose helper "binaries" are shell scripts.
pub struct TestEnv {
    temp: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("failed to create test dir");
        let env = Self { temp };
        std::fs::create_dir_all(env.data_dir()).expect("data dir");
        std::fs::create_dir_all(env.home_dir()).expect("home dir");
        std::fs::create_dir_all(env.artifacts_dir().join("bin")).expect("artifacts dir");
        // Default helpers: succeed quietly.
        env.install_helper("cvd_internal_start", "#!/bin/sh\nexit 0\n");
        env.install_helper("cvd_internal_stop", "#!/bin/sh\nexit 0\n");
        env
    }

    pub fn data_dir(&self) -> PathBuf {
        self.temp.path().join("data")
    }

    pub fn home_dir(&self) -> PathBuf {
        self.temp.path().join("home")
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.temp.path().join("host_out")
    }

    /// (Re)install a helper script under the fake artifacts tree.
    pub fn install_helper(&self, name: &str, script: &str) {
        let path = self.artifacts_dir().join("bin").join(name);
        std::fs::write(&path, script).expect("helper script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("helper permissions");
    }

    /// A `cvd` invocation wired to this environment.
    pub fn cvd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("cvd").expect("cvd binary");
        cmd.env_clear()
            .env("PATH", path_with_artifacts(&self.artifacts_dir()))
            .env("HOME", self.home_dir())
            .env("CVD_DATA_DIR", self.data_dir())
            .env("ANDROID_HOST_OUT", self.artifacts_dir());
        cmd
    }

    /// The persisted group list, straight from the database file.
    pub fn database(&self) -> serde_json::Value {
        let bytes = std::fs::read(self.data_dir().join("instance_database.binpb"))
            .expect("database file");
        assert!(bytes.len() >= 8, "database shorter than its length header");
        let payload = &bytes[8..];
        serde_json::from_slice(payload).expect("database payload")
    }

    pub fn instance_states(&self) -> Vec<String> {
        self.database()[0]["instances"]
            .as_array()
            .expect("instances array")
            .iter()
            .map(|i| i["state"].as_str().expect("state").to_string())
            .collect()
    }
}

fn path_with_artifacts(artifacts: &Path) -> String {
    format!("{}:/usr/bin:/bin", artifacts.join("bin").display())
}
