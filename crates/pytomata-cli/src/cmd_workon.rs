// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! Implementation of the `pytomata workon` command.

use clap::Args;
use miette::Result;

/// Activate chosen virtual environment or let pytomata choose for you
///
/// Prints a shell command; use it as: eval "$(pytomata workon)"
#[derive(Debug, Args)]
pub struct CmdWorkon {
    /// Name of the virtual environment (default: the one attached to the
    /// current directory or its parents)
    name: Option<String>,
}

impl CmdWorkon {
    pub async fn run(&mut self, session: &pytomata::Session) -> Result<i32> {
        let activation = session.resolver.workon(self.name.as_deref())?;
        tracing::info!(
            "Activating '{}' from {}",
            activation.environment.name,
            activation.bin_dir.display()
        );

        println!("source {}", shell_quote(&activation.activate_script.to_string_lossy()));
        Ok(0)
    }
}

/// Quote `value` for POSIX shells.
fn shell_quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+:@".contains(c))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}
