// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

use rstest::rstest;

use super::*;

#[rstest]
#[case("proj")]
#[case("Proj")]
#[case("my-project_3.11")]
#[case(".hidden")]
fn test_valid_names(#[case] name: &str) {
    validate_name(name).expect("name should be accepted");
}

#[rstest]
#[case("")]
#[case(".")]
#[case("..")]
#[case("a/b")]
#[case("a\\b")]
#[case("tab\there")]
#[case("nul\0")]
fn test_invalid_names(#[case] name: &str) {
    match validate_name(name) {
        Err(Error::InvalidName { name: rejected, .. }) => assert_eq!(rejected, name),
        other => panic!("Expected InvalidName, got: {:?}", other),
    }
}

#[rstest]
#[case(ListFilter::All, 0, true)]
#[case(ListFilter::All, 2, true)]
#[case(ListFilter::Attached, 0, false)]
#[case(ListFilter::Attached, 1, true)]
#[case(ListFilter::Unattached, 0, true)]
#[case(ListFilter::Unattached, 3, false)]
fn test_list_filter_accepts(#[case] filter: ListFilter, #[case] count: usize, #[case] expected: bool) {
    assert_eq!(filter.accepts(count), expected);
}

#[rstest]
fn test_list_filter_from_flag() {
    assert_eq!(ListFilter::from_flag(None), ListFilter::All);
    assert_eq!(ListFilter::from_flag(Some(true)), ListFilter::Attached);
    assert_eq!(ListFilter::from_flag(Some(false)), ListFilter::Unattached);
}
