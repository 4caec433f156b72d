// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! Implementation of the `pytomata find` command.

use clap::Args;
use miette::Result;

/// Get path to the executables inside the virtual environment
#[derive(Debug, Args)]
pub struct CmdFind {
    /// Name of the virtual environment, or a path inside an attached project
    venv: String,

    /// Print the path of this executable instead of the directory
    #[clap(short, long)]
    module: Option<String>,
}

impl CmdFind {
    pub async fn run(&mut self, session: &pytomata::Session) -> Result<i32> {
        let location = session
            .resolver
            .find(&self.venv, self.module.as_deref())?;
        tracing::debug!(environment = %location.environment.name, "found");

        println!("{}", location.path.display());
        Ok(0)
    }
}
