// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! Implementation of the `pytomata make` command.

use clap::Args;
use colored::Colorize;
use miette::Result;

/// Create new virtual environment or upgrade Python in an existing one
#[derive(Debug, Args)]
pub struct CmdMake {
    /// Name of the virtual environment
    name: String,

    /// Python version to use, eg: 3.11 (default: the configured version)
    #[clap(short, long, value_name = "VERSION")]
    python: Option<String>,

    /// Upgrade the interpreter of an existing environment
    #[clap(long)]
    upgrade: bool,
}

impl CmdMake {
    pub async fn run(&mut self, session: &pytomata::Session) -> Result<i32> {
        let version = self.python.as_deref();

        if self.upgrade {
            let upgraded = session.lifecycle.upgrade(&self.name, version)?;
            println!(
                "Upgraded {} to python {}",
                upgraded.name.green(),
                upgraded.version.cyan()
            );
        } else {
            let made = session.lifecycle.make(&self.name, version)?;
            println!(
                "Created {} with python {} at {}",
                made.name.green(),
                made.version.cyan(),
                made.root.display().to_string().dimmed()
            );
        }

        Ok(0)
    }
}
