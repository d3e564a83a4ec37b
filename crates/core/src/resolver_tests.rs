// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use yare::parameterized;

fn convert(path: &str, cwd: &str, home: &str) -> Result<PathBuf, PathError> {
    emulate_absolute_path(&InputPathForm {
        path_to_convert: path,
        current_working_dir: Some(Path::new(cwd)),
        home_dir: Some(Path::new(home)),
        follow_symlink: false,
    })
}

#[parameterized(
    bare_tilde = { "~", "/w", "/u/a", "/u/a" },
    tilde_subdir = { "~/x", "/w", "/u/a", "/u/a/x" },
    relative = { "a/b", "/w", "/u/a", "/w/a/b" },
    relative_parent = { "a/../b", "/w", "/u/a", "/w/b" },
    absolute = { "/x/y", "/w", "/u/a", "/x/y" },
    dot_segments = { "./a/./b", "/w", "/u/a", "/w/a/b" },
    double_slash = { "/x//y", "/w", "/u/a", "/x/y" },
    parent_at_root = { "/../x", "/w", "/u/a", "/x" },
    trailing_parent = { "/x/y/..", "/w", "/u/a", "/x" },
)]
fn lexical_normalization(path: &str, cwd: &str, home: &str, expected: &str) {
    assert_eq!(convert(path, cwd, home).unwrap(), PathBuf::from(expected));
}

#[test]
fn tilde_in_the_middle_is_rejected() {
    let err = convert("a/~/b", "/w", "/u/a").unwrap_err();
    assert!(matches!(err, PathError::BadPath(_)));
}

#[test]
fn empty_path_is_rejected() {
    assert!(convert("", "/w", "/u/a").is_err());
}

#[test]
fn relative_working_dir_is_rejected() {
    let err = emulate_absolute_path(&InputPathForm {
        path_to_convert: "a",
        current_working_dir: Some(Path::new("w")),
        home_dir: Some(Path::new("/u/a")),
        follow_symlink: false,
    })
    .unwrap_err();
    assert!(matches!(err, PathError::BadPath(_)));
}

#[test]
fn follow_symlink_resolves_existing_paths() {
    let temp = tempfile::tempdir().unwrap();
    let target = temp.path().join("target");
    std::fs::create_dir(&target).unwrap();
    let link = temp.path().join("link");
    std::os::unix::fs::symlink(&target, &link).unwrap();

    let resolved = emulate_absolute_path(&InputPathForm {
        path_to_convert: &link.to_string_lossy(),
        current_working_dir: Some(Path::new("/")),
        home_dir: None,
        follow_symlink: true,
    })
    .unwrap();
    assert_eq!(resolved, target.canonicalize().unwrap());
}

proptest! {
    // Normalizing an already-normalized path is the identity.
    #[test]
    fn normalization_is_idempotent(segments in proptest::collection::vec("[a-z]{1,8}", 1..6)) {
        let path = format!("/{}", segments.join("/"));
        let once = convert(&path, "/w", "/u/a").unwrap();
        let twice = convert(&once.to_string_lossy(), "/w", "/u/a").unwrap();
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn find_binary_prefers_first_alternative() {
    let temp = tempfile::tempdir().unwrap();
    let bin = temp.path().join("bin");
    std::fs::create_dir(&bin).unwrap();
    std::fs::write(bin.join("launch_cvd"), "").unwrap();

    let found = find_binary(temp.path(), &["cvd_internal_start", "launch_cvd"]).unwrap();
    assert_eq!(found, "launch_cvd");

    std::fs::write(bin.join("cvd_internal_start"), "").unwrap();
    let found = find_binary(temp.path(), &["cvd_internal_start", "launch_cvd"]).unwrap();
    assert_eq!(found, "cvd_internal_start");
}

#[test]
fn find_binary_fails_when_absent() {
    let temp = tempfile::tempdir().unwrap();
    assert!(find_binary(temp.path(), &["stop_cvd"]).is_err());
}

#[test]
fn android_host_path_walks_env_in_order() {
    let temp = tempfile::tempdir().unwrap();
    let bin = temp.path().join("bin");
    std::fs::create_dir(&bin).unwrap();
    std::fs::write(bin.join("cvd_internal_start"), "").unwrap();

    let mut envs = Envs::new();
    envs.insert(ANDROID_HOST_OUT.to_string(), "/nonexistent".to_string());
    envs.insert(ANDROID_SOONG_HOST_OUT.to_string(), temp.path().to_string_lossy().into_owned());
    assert_eq!(android_host_path(&envs).unwrap(), temp.path());
}

#[test]
fn android_host_path_fails_without_launcher() {
    let envs = Envs::new();
    // The test working directory is not a host artifacts dir.
    assert!(android_host_path(&envs).is_err());
}
