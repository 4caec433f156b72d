// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! Shared test fixtures.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rstest::fixture;
use tempfile::TempDir;

use crate::toolchain::{Toolchain, ToolchainError};
use crate::{Config, Session, StateHandle};

/// A toolchain that only creates directories, with switchable failures.
#[derive(Debug, Default)]
pub(crate) struct FakeToolchain {
    pub fail_provision: AtomicBool,
    pub fail_upgrade: AtomicBool,
    pub fail_destroy: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FakeToolchain {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn failure(program: &str) -> ToolchainError {
        ToolchainError::Failed {
            program: program.to_string(),
            status: Some(1),
            stderr: "scripted failure".to_string(),
        }
    }
}

impl Toolchain for FakeToolchain {
    fn provision(&self, root: &Path, version: &str) -> Result<(), ToolchainError> {
        self.record(format!("provision {} {version}", root.display()));
        // Leave a half-built tree behind on failure, like a real venv would.
        std::fs::create_dir_all(self.bin_dir(root))?;
        if self.fail_provision.load(Ordering::SeqCst) {
            return Err(Self::failure("python-provision"));
        }
        std::fs::write(root.join("pyvenv.cfg"), format!("version = {version}\n"))?;
        Ok(())
    }

    fn upgrade(&self, root: &Path, version: &str) -> Result<(), ToolchainError> {
        self.record(format!("upgrade {} {version}", root.display()));
        if self.fail_upgrade.load(Ordering::SeqCst) {
            return Err(Self::failure("python-upgrade"));
        }
        std::fs::write(root.join("pyvenv.cfg"), format!("version = {version}\n"))?;
        Ok(())
    }

    fn destroy(&self, root: &Path) -> std::io::Result<()> {
        self.record(format!("destroy {}", root.display()));
        if self.fail_destroy.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "scripted failure",
            ));
        }
        match std::fs::remove_dir_all(root) {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            result => result,
        }
    }
}

/// A session over in-memory state, with roots and projects in a temp dir.
pub(crate) struct TestEnv {
    pub tmp: TempDir,
    pub state: StateHandle,
    pub toolchain: Arc<FakeToolchain>,
    pub session: Session,
}

impl TestEnv {
    /// Create (if needed) and canonicalize a project directory.
    pub fn project(&self, relative: &str) -> PathBuf {
        let path = self.tmp.path().join("projects").join(relative);
        std::fs::create_dir_all(&path).unwrap();
        dunce::canonicalize(path).unwrap()
    }

    /// Make an environment, panicking on failure.
    pub fn make(&self, name: &str) -> crate::Environment {
        self.session.lifecycle.make(name, None).unwrap()
    }
}

#[fixture]
pub(crate) fn env() -> TestEnv {
    let tmp = TempDir::new().unwrap();
    let config = Config::with_home(tmp.path().join("home"));
    let state = StateHandle::in_memory();
    let toolchain = Arc::new(FakeToolchain::default());
    let session = Session::with_parts(&config, state.clone(), toolchain.clone());
    TestEnv {
        tmp,
        state,
        toolchain,
        session,
    }
}
