// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! Implementation of the `pytomata remove` command.

use clap::Args;
use colored::Colorize;
use miette::Result;

/// Remove chosen virtual environment
#[derive(Debug, Args)]
pub struct CmdRemove {
    /// Name of the virtual environment
    name: String,
}

impl CmdRemove {
    pub async fn run(&mut self, session: &pytomata::Session) -> Result<i32> {
        let removed = session.lifecycle.remove(&self.name)?;

        for path in &removed.released {
            println!(
                "Detached {} from {}",
                path.display().to_string().cyan(),
                self.name.green()
            );
        }
        println!(
            "Removed {} ({})",
            self.name.green(),
            removed.environment.root.display().to_string().dimmed()
        );

        Ok(0)
    }
}
