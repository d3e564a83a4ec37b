// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    simple = { "cvd", true },
    with_digits = { "cvd2", true },
    with_dash_underscore = { "my-group_1", true },
    leading_digit = { "2cvd", false },
    leading_dash = { "-cvd", false },
    empty = { "", false },
    spaces = { "my group", false },
    slash = { "a/b", false },
)]
fn group_names(name: &str, valid: bool) {
    assert_eq!(is_valid_group_name(name), valid);
}

#[parameterized(
    numeric = { "1", true },
    word = { "phone", true },
    mixed = { "tv-2_b", true },
    empty = { "", false },
    comma = { "a,b", false },
    tilde = { "~a", false },
)]
fn instance_names(name: &str, valid: bool) {
    assert_eq!(is_valid_instance_name(name), valid);
}
