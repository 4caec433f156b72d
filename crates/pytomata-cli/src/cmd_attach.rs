// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! Implementation of the `pytomata attach` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use miette::Result;

/// Attach virtual environment to an existing project
///
/// PATHS is a space separated list of project roots. This typically means
/// the directories containing a `.git` folder.
///
/// Usage: pytomata attach my_project ~/personal/my_project ~/builds/another
#[derive(Debug, Args)]
pub struct CmdAttach {
    /// Name of the virtual environment
    name: String,

    /// Project roots to attach
    #[clap(required = true)]
    paths: Vec<PathBuf>,

    /// Do not warn if a project is already attached to another virtual
    /// environment; move it instead
    #[clap(short = 'n', long)]
    no_warn: bool,
}

impl CmdAttach {
    pub async fn run(&mut self, session: &pytomata::Session) -> Result<i32> {
        let report = session
            .registry
            .attach(&self.name, &self.paths, !self.no_warn)?;

        for path in &report.attached {
            println!(
                "Attached {} to {}",
                path.display().to_string().cyan(),
                self.name.green()
            );
        }
        for moved in &report.rebound {
            tracing::info!(
                "Moved {} from '{}' to '{}'",
                moved.path.display(),
                moved.attached_to,
                self.name
            );
            println!(
                "Attached {} to {}",
                moved.path.display().to_string().cyan(),
                self.name.green()
            );
        }
        for path in &report.unchanged {
            println!(
                "{} {}",
                path.display().to_string().cyan(),
                "(already attached)".dimmed()
            );
        }

        Ok(0)
    }
}
