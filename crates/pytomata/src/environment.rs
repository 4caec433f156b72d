// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! Environment and association records.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

#[cfg(test)]
#[path = "./environment_test.rs"]
mod environment_test;

/// A managed virtual environment.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Environment {
    /// Unique, case-sensitive name.
    pub name: String,

    /// Directory tree owned by this environment.
    pub root: PathBuf,

    /// Interpreter version tag, eg: `3.11`.
    pub version: String,

    pub created: DateTime<Utc>,

    /// Set whenever the interpreter is re-provisioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgraded: Option<DateTime<Utc>>,
}

/// A binding from one project directory to one environment.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Association {
    /// Name of the bound environment.
    pub environment: String,

    /// Canonical absolute project root.
    pub path: PathBuf,

    pub attached: DateTime<Utc>,
}

/// Which environments `list` should report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFilter {
    #[default]
    All,
    /// Only environments attached to at least one project.
    Attached,
    /// Only environments with no project attached.
    Unattached,
}

impl ListFilter {
    /// Build a filter from the `--attached/--not-attached` switch.
    pub fn from_flag(attached: Option<bool>) -> Self {
        match attached {
            None => Self::All,
            Some(true) => Self::Attached,
            Some(false) => Self::Unattached,
        }
    }

    pub fn accepts(&self, attachment_count: usize) -> bool {
        match self {
            Self::All => true,
            Self::Attached => attachment_count > 0,
            Self::Unattached => attachment_count == 0,
        }
    }
}

/// Check that `name` can identify an environment and name its root directory.
pub fn validate_name(name: &str) -> crate::Result<()> {
    let invalid = |reason| Error::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("name must not be a relative directory reference"));
    }
    if name.contains(['/', '\\']) {
        return Err(invalid("name must not contain path separators"));
    }
    if name.chars().any(char::is_control) {
        return Err(invalid("name must not contain control characters"));
    }

    Ok(())
}
