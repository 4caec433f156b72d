// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use rstest::rstest;
use tempfile::TempDir;

use super::*;

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[rstest]
fn test_defaults_with_explicit_home() {
    let tmp = TempDir::new().unwrap();

    let config = Config::load_with(Some(tmp.path().to_path_buf()), vars(&[])).unwrap();

    assert_eq!(config, Config::with_home(tmp.path()));
    assert_eq!(config.envs_dir(), tmp.path().join("envs"));
}

#[rstest]
fn test_home_from_environment() {
    let tmp = TempDir::new().unwrap();
    let home = tmp.path().display().to_string();

    let config = Config::load_with(None, vars(&[(HOME_VAR, &home)])).unwrap();

    assert_eq!(config.home, tmp.path());
}

#[rstest]
fn test_explicit_home_beats_environment() {
    let tmp = TempDir::new().unwrap();
    let explicit = tmp.path().join("explicit");

    let config =
        Config::load_with(Some(explicit.clone()), vars(&[(HOME_VAR, "/elsewhere")])).unwrap();

    assert_eq!(config.home, explicit);
}

#[rstest]
fn test_config_file_then_environment() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("config.yaml"),
        r#"
default_version: "3.10"
python: /opt/python/bin/python3
lock_timeout_ms: 250
lock_poll_ms: 5
"#,
    )
    .unwrap();

    let from_file = Config::load_with(Some(tmp.path().to_path_buf()), vars(&[])).unwrap();
    assert_eq!(from_file.default_version, "3.10");
    assert_eq!(from_file.python.as_deref(), Some("/opt/python/bin/python3"));
    assert_eq!(from_file.lock.timeout, Duration::from_millis(250));
    assert_eq!(from_file.lock.poll, Duration::from_millis(5));

    let overridden = Config::load_with(
        Some(tmp.path().to_path_buf()),
        vars(&[(DEFAULT_VERSION_VAR, "3.12"), (PYTHON_VAR, "python3.12")]),
    )
    .unwrap();
    assert_eq!(overridden.default_version, "3.12");
    assert_eq!(overridden.python.as_deref(), Some("python3.12"));
}

#[rstest]
fn test_empty_variables_are_ignored() {
    let tmp = TempDir::new().unwrap();

    let config = Config::load_with(
        Some(tmp.path().to_path_buf()),
        vars(&[(DEFAULT_VERSION_VAR, ""), (PYTHON_VAR, "")]),
    )
    .unwrap();

    assert_eq!(config.default_version, DEFAULT_VERSION);
    assert_eq!(config.python, None);
}

#[rstest]
fn test_unknown_config_key_is_rejected() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("config.yaml"), "interpreter: python3\n").unwrap();

    let result = Config::load_with(Some(tmp.path().to_path_buf()), vars(&[]));

    match result {
        Err(crate::Error::InvalidConfigFile { path, .. }) => {
            assert_eq!(path, tmp.path().join("config.yaml"));
        }
        other => panic!("Expected InvalidConfigFile, got: {:?}", other),
    }
}
