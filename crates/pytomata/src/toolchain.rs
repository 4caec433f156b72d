// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! The external collaborator that materializes environment roots.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

#[cfg(test)]
#[path = "./toolchain_test.rs"]
mod toolchain_test;

/// Directory holding an environment's executables, relative to its root.
#[cfg(windows)]
pub const BIN_DIRNAME: &str = "Scripts";
#[cfg(not(windows))]
pub const BIN_DIRNAME: &str = "bin";

/// Why the toolchain could not do what was asked.
#[derive(Error, Debug)]
pub enum ToolchainError {
    /// The interpreter could not be started at all.
    #[error("could not run '{program}': {error}")]
    Spawn {
        program: String,
        #[source]
        error: std::io::Error,
    },

    /// The interpreter ran and reported failure.
    #[error("'{program}' {}{}", exit_description(.status), stderr_suffix(.stderr))]
    Failed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    /// Filesystem work around the interpreter failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn exit_description(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Creates, re-provisions and deletes environment roots.
pub trait Toolchain: Debug + Send + Sync {
    /// Materialize a fresh environment with `version` at `root`.
    fn provision(&self, root: &Path, version: &str) -> Result<(), ToolchainError>;

    /// Re-provision the existing environment at `root` with `version`.
    fn upgrade(&self, root: &Path, version: &str) -> Result<(), ToolchainError>;

    /// Delete the directory tree at `root`. A missing root is not an error.
    fn destroy(&self, root: &Path) -> std::io::Result<()>;

    /// Directory holding the executables of the environment at `root`.
    fn bin_dir(&self, root: &Path) -> PathBuf {
        root.join(BIN_DIRNAME)
    }

    /// Script that activates the environment at `root` in a shell.
    fn activate_script(&self, root: &Path) -> PathBuf {
        self.bin_dir(root).join("activate")
    }
}

/// Provisions environments with the interpreter's own `venv` module.
#[derive(Debug, Clone, Default)]
pub struct VenvToolchain {
    /// Program to run instead of `python<version>`.
    pub interpreter: Option<String>,
}

impl VenvToolchain {
    pub fn new(interpreter: Option<String>) -> Self {
        Self { interpreter }
    }

    /// The program invoked for `version`, eg: `python3.11`.
    pub fn program_for(&self, version: &str) -> String {
        match &self.interpreter {
            Some(interpreter) => interpreter.clone(),
            None => format!("python{version}"),
        }
    }

    fn run_venv(&self, root: &Path, version: &str, upgrade: bool) -> Result<(), ToolchainError> {
        let program = self.program_for(version);
        let mut cmd = Command::new(&program);
        cmd.args(["-m", "venv"]);
        if upgrade {
            cmd.arg("--upgrade");
        }
        cmd.arg(root);

        tracing::debug!(?cmd, "running venv");
        let output = cmd.output().map_err(|error| ToolchainError::Spawn {
            program: program.clone(),
            error,
        })?;
        if !output.status.success() {
            return Err(ToolchainError::Failed {
                program,
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

impl Toolchain for VenvToolchain {
    fn provision(&self, root: &Path, version: &str) -> Result<(), ToolchainError> {
        if let Some(parent) = root.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.run_venv(root, version, false)
    }

    fn upgrade(&self, root: &Path, version: &str) -> Result<(), ToolchainError> {
        self.run_venv(root, version, true)
    }

    fn destroy(&self, root: &Path) -> std::io::Result<()> {
        match std::fs::remove_dir_all(root) {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            result => result,
        }
    }
}
