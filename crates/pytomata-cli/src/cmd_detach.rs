// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! Implementation of the `pytomata detach` command.

use std::io::{self, BufRead, Write};

use clap::Args;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

/// Detach virtual environment from all of its projects
#[derive(Debug, Args)]
pub struct CmdDetach {
    /// Name of the virtual environment
    name: String,

    /// Do not ask for confirmation
    #[clap(short, long)]
    yes: bool,
}

impl CmdDetach {
    pub async fn run(&mut self, session: &pytomata::Session) -> Result<i32> {
        // Unknown names fail before prompting
        let projects = session.registry.list_for(&self.name)?;

        if !self.yes {
            let prompt = "Are you sure you want to detach from this virtual environment?";
            let stdin = io::stdin();
            if !confirm(prompt, &mut stdin.lock()).into_diagnostic()? {
                eprintln!("Aborted!");
                return Ok(crate::EXIT_ABORTED);
            }
        }

        let released = session.registry.detach(&self.name)?;
        tracing::debug!(before = projects.len(), released = released.len(), "detached");

        if released.is_empty() {
            println!("{} was not attached to any project", self.name.green());
        }
        for path in &released {
            println!(
                "Detached {} from {}",
                path.display().to_string().cyan(),
                self.name.green()
            );
        }

        Ok(0)
    }
}

/// Ask a yes/no question that defaults to yes.
fn confirm(prompt: &str, input: &mut impl BufRead) -> io::Result<bool> {
    eprint!("{} [Y/n]: ", prompt);
    io::stderr().flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        // No terminal to ask; never detach without an answer.
        return Ok(false);
    }

    let trimmed = answer.trim().to_lowercase();
    Ok(trimmed.is_empty() || trimmed == "y" || trimmed == "yes")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::confirm;

    #[rstest]
    #[case("\n", true)]
    #[case("y\n", true)]
    #[case("YES\n", true)]
    #[case("n\n", false)]
    #[case("nope\n", false)]
    #[case("", false)]
    fn test_confirm(#[case] input: &str, #[case] expected: bool) {
        let mut reader = input.as_bytes();
        assert_eq!(confirm("Detach?", &mut reader).unwrap(), expected);
    }
}
