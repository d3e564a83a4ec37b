// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::selector::start::StartOptions;
use tempfile::TempDir;

fn artifacts_dir(temp: &TempDir) -> PathBuf {
    let dir = temp.path().join("host_out");
    std::fs::create_dir_all(dir.join("bin")).unwrap();
    std::fs::write(dir.join("bin/cvd_internal_start"), "").unwrap();
    dir
}

fn options(n: usize, ids: Option<Vec<u32>>) -> StartOptions {
    StartOptions {
        group_name: Some("g1".to_string()),
        instance_names: None,
        instance_ids: ids,
        requested_num_instances: n,
        acquire_file_lock: true,
    }
}

fn base_envs(temp: &TempDir) -> Envs {
    let mut envs = Envs::new();
    envs.insert(
        cvd_core::env::ANDROID_HOST_OUT.to_string(),
        artifacts_dir(temp).to_string_lossy().into_owned(),
    );
    envs
}

#[test]
fn unknown_ids_come_from_the_allocator() {
    let temp = TempDir::new().unwrap();
    let lock_manager = InstanceLockManager::at(temp.path().join("locks"));
    let creation = analyze_creation(&options(2, None), &base_envs(&temp), &lock_manager).unwrap();

    let ids: Vec<u32> = creation.params.instances.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(creation.id_locks.len(), 2);
    // Default names are the string form of the id.
    let names: Vec<&str> =
        creation.params.instances.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["1", "2"]);
}

#[test]
fn fixed_ids_are_reserved_too() {
    let temp = TempDir::new().unwrap();
    let lock_manager = InstanceLockManager::at(temp.path().join("locks"));
    let creation =
        analyze_creation(&options(2, Some(vec![5, 9])), &base_envs(&temp), &lock_manager)
            .unwrap();
    let ids: Vec<u32> = creation.params.instances.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![5, 9]);
    assert_eq!(creation.id_locks.len(), 2);

    // A second command cannot grab the same ids while the locks are held.
    let err =
        analyze_creation(&options(1, Some(vec![5])), &base_envs(&temp), &lock_manager).unwrap_err();
    assert!(err.to_string().contains("locked"));
}

#[test]
fn without_lock_acquisition_ids_are_sequential() {
    let temp = TempDir::new().unwrap();
    let lock_manager = InstanceLockManager::at(temp.path().join("locks"));
    let mut opts = options(3, None);
    opts.acquire_file_lock = false;
    let creation = analyze_creation(&opts, &base_envs(&temp), &lock_manager).unwrap();
    let ids: Vec<u32> = creation.params.instances.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(creation.id_locks.is_empty());
}

#[test]
fn product_out_env_is_split_and_truncated() {
    let temp = TempDir::new().unwrap();
    let lock_manager = InstanceLockManager::at(temp.path().join("locks"));
    let mut envs = base_envs(&temp);
    envs.insert(ANDROID_PRODUCT_OUT.to_string(), "/out/a,/out/b,/out/c".to_string());
    let creation = analyze_creation(&options(2, None), &envs, &lock_manager).unwrap();
    assert_eq!(
        creation.params.product_out_paths,
        vec![PathBuf::from("/out/a"), PathBuf::from("/out/b")]
    );
}

#[test]
fn product_out_defaults_to_host_artifacts() {
    let temp = TempDir::new().unwrap();
    let lock_manager = InstanceLockManager::at(temp.path().join("locks"));
    let envs = base_envs(&temp);
    let creation = analyze_creation(&options(1, None), &envs, &lock_manager).unwrap();
    assert_eq!(creation.params.product_out_paths, vec![creation.params.host_artifacts_path.clone()]);
}

#[test]
fn home_is_only_used_when_overridden() {
    let temp = TempDir::new().unwrap();
    let lock_manager = InstanceLockManager::at(temp.path().join("locks"));

    let mut envs = base_envs(&temp);
    let custom_home = temp.path().join("custom_home");
    envs.insert("HOME".to_string(), custom_home.to_string_lossy().into_owned());
    let creation = analyze_creation(&options(1, None), &envs, &lock_manager).unwrap();
    assert_eq!(creation.params.home, Some(custom_home.clone()));
    assert!(custom_home.is_dir());

    // A HOME equal to the system-wide one does not count as user-chosen.
    let mut envs = base_envs(&temp);
    if let Some(system_home) = dirs::home_dir() {
        envs.insert("HOME".to_string(), system_home.to_string_lossy().into_owned());
        let creation = analyze_creation(&options(1, None), &envs, &lock_manager).unwrap();
        assert_eq!(creation.params.home, None);
    }
}

#[test]
fn explicit_names_are_applied_in_order() {
    let temp = TempDir::new().unwrap();
    let lock_manager = InstanceLockManager::at(temp.path().join("locks"));
    let mut opts = options(2, Some(vec![3, 4]));
    opts.instance_names = Some(vec!["phone".to_string(), "tv".to_string()]);
    let creation = analyze_creation(&opts, &base_envs(&temp), &lock_manager).unwrap();
    let names: Vec<&str> =
        creation.params.instances.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["phone", "tv"]);
}

#[test]
fn missing_host_tools_is_a_clear_error() {
    let temp = TempDir::new().unwrap();
    let lock_manager = InstanceLockManager::at(temp.path().join("locks"));
    let err = analyze_creation(&options(1, None), &Envs::new(), &lock_manager).unwrap_err();
    assert!(err.to_string().contains("host tools"));
}
