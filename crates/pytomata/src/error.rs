// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! Error types for pytomata operations.

use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

/// Convenience Result type with pytomata Error.
pub type Result<T> = std::result::Result<T, Error>;

/// A project path that is already attached to another environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachConflict {
    pub path: PathBuf,
    pub attached_to: String,
}

/// Errors that can occur during pytomata operations.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Environment name is not in the store
    #[error("No virtual environment named '{0}'")]
    #[diagnostic(
        code(pytomata::not_found),
        help("Run 'pytomata list' to see the available environments")
    )]
    NotFound(String),

    /// Environment name already taken
    #[error("A virtual environment named '{0}' already exists")]
    #[diagnostic(
        code(pytomata::duplicate_name),
        help("Pick another name, or use 'pytomata make --upgrade' to re-provision it")
    )]
    DuplicateName(String),

    /// Two environments would share one root directory
    #[error("Root {root:?} is already owned by environment '{owner}'")]
    #[diagnostic(code(pytomata::duplicate_root))]
    DuplicateRoot { root: PathBuf, owner: String },

    /// Attach refused because paths are bound elsewhere
    #[error("Cannot attach '{environment}': {} path(s) already attached elsewhere", .conflicts.len())]
    #[diagnostic(
        code(pytomata::conflict),
        help("{}", conflict_message(conflicts))
    )]
    Conflict {
        environment: String,
        conflicts: Vec<AttachConflict>,
    },

    /// Store deletion attempted while projects are still attached
    #[error("Virtual environment '{name}' is still attached to {count} project(s)")]
    #[diagnostic(
        code(pytomata::has_associations),
        help("Detach it first with 'pytomata detach {name}'")
    )]
    HasAssociations { name: String, count: usize },

    /// The external toolchain failed to provision an environment
    #[error("Failed to provision virtual environment '{name}': {reason}")]
    #[diagnostic(
        code(pytomata::provisioning),
        help("Check that the requested interpreter is installed and on PATH")
    )]
    Provisioning { name: String, reason: String },

    /// Associations were released but the root could not be deleted
    #[error("Virtual environment '{name}' was only partially removed; {root:?} is still on disk")]
    #[diagnostic(
        code(pytomata::partial_removal),
        help("Fix the underlying problem and run 'pytomata remove {name}' again")
    )]
    PartialRemoval {
        name: String,
        root: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// The state lock could not be acquired in time
    #[error("Timed out after {waited:?} waiting for the state lock {path:?}")]
    #[diagnostic(
        code(pytomata::lock_timeout),
        help("{}", holder_message(holder))
    )]
    LockTimeout {
        path: PathBuf,
        waited: Duration,
        holder: Option<String>,
    },

    /// Nothing governs the requested location
    #[error("No virtual environment is attached to {0:?} or any parent directory")]
    #[diagnostic(
        code(pytomata::no_environment),
        help("Attach one with 'pytomata attach <NAME> <PATH>' or pass a name explicitly")
    )]
    NoEnvironment(PathBuf),

    /// Module selector did not match an executable
    #[error("No executable '{module}' in virtual environment '{environment}'")]
    #[diagnostic(code(pytomata::module_not_found))]
    ModuleNotFound { environment: String, module: String },

    /// Rejected environment name
    #[error("Invalid virtual environment name {name:?}: {reason}")]
    #[diagnostic(code(pytomata::invalid_name))]
    InvalidName { name: String, reason: &'static str },

    /// Attach target is missing or not a directory
    #[error("Project path {path:?} is not an existing directory")]
    #[diagnostic(code(pytomata::invalid_project_path))]
    InvalidProjectPath {
        path: PathBuf,
        #[source]
        error: Option<std::io::Error>,
    },

    /// Persisted state could not be understood
    #[error("Invalid state file {path:?}: {error}")]
    #[diagnostic(
        code(pytomata::invalid_state),
        help("The file is not valid pytomata/v0 state; restore it from a backup or remove it")
    )]
    InvalidState {
        path: PathBuf,
        #[source]
        error: serde_yaml::Error,
    },

    /// Configuration could not be resolved
    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(pytomata::invalid_config),
        help("Set PYTOMATA_HOME or pass --home to choose where environments are kept")
    )]
    InvalidConfig(String),

    /// Configuration file is not valid YAML
    #[error("Invalid config file {path:?}: {error}")]
    #[diagnostic(code(pytomata::invalid_config_file))]
    InvalidConfigFile {
        path: PathBuf,
        #[source]
        error: serde_yaml::Error,
    },

    /// Failed to read file
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(pytomata::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to write file
    #[error("Failed to write file: {path:?}")]
    #[diagnostic(code(pytomata::write_failed))]
    WriteFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(pytomata::io_error))]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error category.
    ///
    /// 2 is left to the argument parser for usage errors and 11 to the
    /// command line for an aborted confirmation.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotFound(_) | Error::NoEnvironment(_) | Error::ModuleNotFound { .. } => 3,
            Error::DuplicateName(_) | Error::DuplicateRoot { .. } => 4,
            Error::Conflict { .. } => 5,
            Error::HasAssociations { .. } => 6,
            Error::Provisioning { .. } => 7,
            Error::PartialRemoval { .. } => 8,
            Error::LockTimeout { .. } => 9,
            Error::InvalidName { .. } | Error::InvalidProjectPath { .. } => 10,
            Error::InvalidState { .. }
            | Error::InvalidConfig(_)
            | Error::InvalidConfigFile { .. }
            | Error::ReadFailed { .. }
            | Error::WriteFailed { .. }
            | Error::Io(_) => 1,
        }
    }
}

fn conflict_message(conflicts: &[AttachConflict]) -> String {
    let listing = conflicts
        .iter()
        .map(|c| format!("{} -> {}", c.path.display(), c.attached_to))
        .collect::<Vec<_>>()
        .join(", ");
    format!("Already attached: {listing}. Pass --no-warn to move them")
}

fn holder_message(holder: &Option<String>) -> String {
    match holder {
        Some(holder) => format!("The lock is held by {holder}; wait for it to finish and retry"),
        None => "Another pytomata command is running; wait for it to finish and retry".to_string(),
    }
}
