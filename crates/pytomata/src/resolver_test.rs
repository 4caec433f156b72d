// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

use rstest::rstest;

use super::*;
use crate::fixtures::*;
use crate::toolchain::BIN_DIRNAME;

#[rstest]
fn test_find_by_name(env: TestEnv) {
    let made = env.make("proj");

    let location = env.session.resolver.find("proj", None).unwrap();

    assert_eq!(location.environment, made);
    assert_eq!(location.path, made.root.join(BIN_DIRNAME));
}

#[rstest]
fn test_find_by_project_path(env: TestEnv) {
    env.make("proj");
    let project = env.project("project");
    let nested = project.join("src");
    std::fs::create_dir_all(&nested).unwrap();
    env.session.registry.attach("proj", [&project], true).unwrap();

    let location = env
        .session
        .resolver
        .find(nested.to_str().unwrap(), None)
        .unwrap();

    assert_eq!(location.environment.name, "proj");
}

#[rstest]
fn test_name_wins_over_path(env: TestEnv) {
    // A directory that happens to share an environment's name resolves
    // to that environment, not to whatever governs the directory.
    env.make("proj");
    env.make("other");
    let project = env.project("proj");
    env.session.registry.attach("other", [&project], true).unwrap();

    let location = env.session.resolver.find("proj", None).unwrap();

    assert_eq!(location.environment.name, "proj");
}

#[rstest]
fn test_find_unresolved(env: TestEnv) {
    let lonely = env.project("lonely");

    let result = env.session.resolver.find(lonely.to_str().unwrap(), None);

    assert!(matches!(result, Err(Error::NoEnvironment(path)) if path == lonely));
}

#[rstest]
fn test_find_module(env: TestEnv) {
    let made = env.make("proj");
    let executable = executable_in(&made.root.join(BIN_DIRNAME), "pip");
    std::fs::write(&executable, "").unwrap();

    let location = env.session.resolver.find("proj", Some("pip")).unwrap();
    assert_eq!(location.path, executable);

    match env.session.resolver.find("proj", Some("black")) {
        Err(Error::ModuleNotFound {
            environment,
            module,
        }) => {
            assert_eq!(environment, "proj");
            assert_eq!(module, "black");
        }
        other => panic!("Expected ModuleNotFound, got: {:?}", other),
    }
}

#[rstest]
fn test_workon_by_name(env: TestEnv) {
    let made = env.make("proj");

    let activation = env
        .session
        .resolver
        .workon_from(Some("proj"), env.tmp.path())
        .unwrap();

    assert_eq!(activation.environment, made);
    assert_eq!(activation.bin_dir, made.root.join(BIN_DIRNAME));
    assert_eq!(
        activation.activate_script,
        made.root.join(BIN_DIRNAME).join("activate")
    );
}

#[rstest]
fn test_workon_from_working_directory(env: TestEnv) {
    env.make("proj");
    let project = env.project("project");
    let deep = project.join("a").join("b");
    std::fs::create_dir_all(&deep).unwrap();
    env.session.registry.attach("proj", [&project], true).unwrap();

    let activation = env.session.resolver.workon_from(None, &deep).unwrap();
    assert_eq!(activation.environment.name, "proj");

    let outside = env.project("outside");
    assert!(matches!(
        env.session.resolver.workon_from(None, &outside),
        Err(Error::NoEnvironment(_))
    ));
}

#[rstest]
#[case("Scripts/pip", "Scripts/pip.exe")]
#[case("Scripts/pip3.11", "Scripts/pip3.11.exe")]
#[case("Scripts/python.exe", "Scripts/python.exe")]
#[case("Scripts/PIP.EXE", "Scripts/PIP.EXE")]
fn test_with_exe_extension(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(
        with_exe_extension(PathBuf::from(input)),
        PathBuf::from(expected)
    );
}
