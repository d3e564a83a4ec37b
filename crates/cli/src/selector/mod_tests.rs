// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cvd_core::{FakeClock, InstanceState};
use cvd_storage::{CreateGroupParams, InstanceParams};
use tempfile::TempDir;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn seeded_db(temp: &TempDir) -> InstanceDatabase {
    let db = InstanceDatabase::at(temp.path().join("db.binpb"), temp.path().join("db.lock"));
    let clock = FakeClock::new();
    for (name, home, ids) in
        [("g1", "/homes/a", vec![1u32, 2]), ("g2", "/homes/b", vec![5])]
    {
        let params = CreateGroupParams {
            home: Some(home.into()),
            host_artifacts_path: "/opt/host_tools".into(),
            product_out_paths: vec!["/opt/images".into()],
            group_name: Some(name.to_string()),
            instances: ids
                .iter()
                .map(|id| InstanceParams {
                    id: *id,
                    name: id.to_string(),
                    state: InstanceState::Running,
                })
                .collect(),
        };
        db.create_instance_group(params, &clock).unwrap();
    }
    db
}

#[test]
fn selector_flags_are_consumed() {
    let mut a = args(&["--group_name=g1", "--instance_name=1,2", "--extra=1"]);
    let options = parse_selector_options(&mut a).unwrap();
    assert_eq!(options.group_name.as_deref(), Some("g1"));
    assert_eq!(
        options.instance_names,
        Some(vec!["1".to_string(), "2".to_string()])
    );
    assert_eq!(a, args(&["--extra=1"]));
}

#[test]
fn invalid_selector_names_are_rejected() {
    assert!(parse_selector_options(&mut args(&["--group_name=9bad"])).is_err());
    assert!(parse_selector_options(&mut args(&["--instance_name=a,,b"])).is_err());
    assert!(parse_selector_options(&mut args(&["--instance_name=a,a"])).is_err());
}

#[test]
fn group_is_selected_by_name() {
    let temp = TempDir::new().unwrap();
    let db = seeded_db(&temp);
    let options = SelectorOptions { group_name: Some("g2".to_string()), ..Default::default() };
    let group = select_group(&db, &options, &Envs::new()).unwrap();
    assert_eq!(group.group_name(), "g2");
}

#[test]
fn group_is_selected_by_unique_instance_name() {
    let temp = TempDir::new().unwrap();
    let db = seeded_db(&temp);
    let options =
        SelectorOptions { instance_names: Some(vec!["5".to_string()]), ..Default::default() };
    let group = select_group(&db, &options, &Envs::new()).unwrap();
    assert_eq!(group.group_name(), "g2");
}

#[test]
fn ambiguous_selection_fails_without_a_terminal() {
    let temp = TempDir::new().unwrap();
    let db = seeded_db(&temp);
    // Test processes have no terminal on stdin, so this must error.
    let err = select_group(&db, &SelectorOptions::default(), &Envs::new()).unwrap_err();
    assert!(err.to_string().contains("more than one"));
}

#[test]
fn disabled_default_group_requires_explicit_selection() {
    let temp = TempDir::new().unwrap();
    let db = seeded_db(&temp);
    let options = SelectorOptions { disable_default_group: true, ..Default::default() };
    let err = select_group(&db, &options, &Envs::new()).unwrap_err();
    assert!(err.to_string().contains("--group_name"));

    let options = SelectorOptions {
        disable_default_group: true,
        group_name: Some("g1".to_string()),
        ..Default::default()
    };
    assert!(select_group(&db, &options, &Envs::new()).is_ok());
}

#[test]
fn missing_group_is_not_found() {
    let temp = TempDir::new().unwrap();
    let db = seeded_db(&temp);
    let options = SelectorOptions { group_name: Some("g9".to_string()), ..Default::default() };
    assert!(select_group(&db, &options, &Envs::new()).is_err());
}

#[test]
fn overridden_home_narrows_the_selection() {
    let temp = TempDir::new().unwrap();
    let db = seeded_db(&temp);
    let mut envs = Envs::new();
    envs.insert("HOME".to_string(), "/homes/b".to_string());
    let group = select_group(&db, &SelectorOptions::default(), &envs).unwrap();
    assert_eq!(group.group_name(), "g2");
}

#[test]
fn instance_selected_by_name() {
    let temp = TempDir::new().unwrap();
    let db = seeded_db(&temp);
    let options =
        SelectorOptions { instance_names: Some(vec!["2".to_string()]), ..Default::default() };
    let (instance, group) = select_instance(&db, &options, &Envs::new()).unwrap();
    assert_eq!(instance.id, 2);
    assert_eq!(group.group_name(), "g1");
}

#[test]
fn instance_selected_by_environment_id() {
    let temp = TempDir::new().unwrap();
    let db = seeded_db(&temp);
    let mut envs = Envs::new();
    envs.insert(CUTTLEFISH_INSTANCE.to_string(), "5".to_string());
    let (instance, group) = select_instance(&db, &SelectorOptions::default(), &envs).unwrap();
    assert_eq!(instance.id, 5);
    assert_eq!(group.group_name(), "g2");
}

#[test]
fn instance_selection_has_no_interactive_fallback() {
    let temp = TempDir::new().unwrap();
    let db = seeded_db(&temp);
    // No name and no id: nothing to narrow the choice down.
    let err = select_instance(&db, &SelectorOptions::default(), &Envs::new()).unwrap_err();
    assert!(err.to_string().contains("--instance_name"));
}

#[test]
fn multiple_instance_matches_are_a_hard_error() {
    let temp = TempDir::new().unwrap();
    let db = InstanceDatabase::at(temp.path().join("db.binpb"), temp.path().join("db.lock"));
    let clock = FakeClock::new();
    for (name, home, id) in [("g1", "/homes/a", 1u32), ("g2", "/homes/b", 2)] {
        let params = CreateGroupParams {
            home: Some(home.into()),
            host_artifacts_path: "/opt/host_tools".into(),
            product_out_paths: vec!["/opt/images".into()],
            group_name: Some(name.to_string()),
            instances: vec![InstanceParams {
                id,
                name: "phone".to_string(),
                state: InstanceState::Running,
            }],
        };
        db.create_instance_group(params, &clock).unwrap();
    }
    let options =
        SelectorOptions { instance_names: Some(vec!["phone".to_string()]), ..Default::default() };
    let err = select_instance(&db, &options, &Envs::new()).unwrap_err();
    assert!(err.to_string().contains("more than one"));
}
