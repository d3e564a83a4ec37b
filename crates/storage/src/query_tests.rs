// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cvd_core::{Instance, InstanceState};

fn group() -> InstanceGroup {
    InstanceGroup::builder()
        .group_name("g1")
        .home_directory("/tmp/cvd/1/10/home")
        .instances(vec![
            Instance::new(1, "phone", InstanceState::Running),
            Instance::new(2, "tv", InstanceState::Running),
        ])
        .build()
}

#[test]
fn empty_query_matches_everything() {
    assert!(Query::default().is_empty());
    assert!(Query::default().matches(&group()));
}

#[test]
fn single_field_queries() {
    let g = group();
    assert!(Query::home("/tmp/cvd/1/10/home").matches(&g));
    assert!(!Query::home("/tmp/cvd/1/11/home").matches(&g));
    assert!(Query::group_name("g1").matches(&g));
    assert!(!Query::group_name("g2").matches(&g));
    assert!(Query { instance_id: Some(2), ..Query::default() }.matches(&g));
    assert!(!Query { instance_id: Some(7), ..Query::default() }.matches(&g));
    assert!(Query { instance_name: Some("tv".to_string()), ..Query::default() }.matches(&g));
}

#[test]
fn all_set_fields_must_match() {
    let g = group();
    let query = Query {
        group_name: Some("g1".to_string()),
        instance_name: Some("watch".to_string()),
        ..Query::default()
    };
    assert!(!query.matches(&g));
}

#[test]
fn describe_lists_set_fields() {
    let query = Query {
        group_name: Some("g1".to_string()),
        instance_id: Some(3),
        ..Query::default()
    };
    assert_eq!(query.describe(), "group_name=g1, instance_id=3");
    assert_eq!(Query::default().describe(), "any group");
}
