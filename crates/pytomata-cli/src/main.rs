// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! pytomata - Automated virtual environment management CLI
//!
//! Exit codes:
//!
//! | code | meaning |
//! |------|---------|
//! | 0 | success |
//! | 1 | any other failure (state or config I/O) |
//! | 2 | invalid command line usage |
//! | 3 | environment, project or module not found |
//! | 4 | environment name already taken |
//! | 5 | project already attached elsewhere |
//! | 6 | environment still attached to projects |
//! | 7 | provisioning failed |
//! | 8 | environment only partially removed |
//! | 9 | timed out waiting for another pytomata command |
//! | 10 | invalid environment name or project path |
//! | 11 | aborted at a confirmation prompt |

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;

mod cmd_attach;
mod cmd_detach;
mod cmd_find;
mod cmd_list;
mod cmd_make;
mod cmd_remove;
mod cmd_workon;

use cmd_attach::CmdAttach;
use cmd_detach::CmdDetach;
use cmd_find::CmdFind;
use cmd_list::CmdList;
use cmd_make::CmdMake;
use cmd_remove::CmdRemove;
use cmd_workon::CmdWorkon;

/// Exit code used when the user declines a confirmation prompt.
pub const EXIT_ABORTED: i32 = 11;

#[derive(Parser)]
#[clap(
    name = "pytomata",
    about = "Manage multiple virtual environments with ease",
    version,
    long_about = "Automated virtual environment management made dead-simple"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    /// Directory holding pytomata's state and environments
    #[clap(long, global = true, value_name = "DIR")]
    home: Option<PathBuf>,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Attach virtual environment to an existing project
    Attach(CmdAttach),

    /// Detach virtual environment from an existing project
    Detach(CmdDetach),

    /// Get path to the executables inside the virtual environment
    Find(CmdFind),

    /// List available virtual environments along with associated projects
    List(CmdList),

    /// Create new virtual environment or upgrade Python in an existing one
    Make(CmdMake),

    /// Remove chosen virtual environment
    Remove(CmdRemove),

    /// Activate chosen virtual environment or let pytomata choose for you
    Workon(CmdWorkon),
}

impl Opt {
    async fn run(self) -> Result<i32> {
        // Setup logging
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        // stdout is reserved for command output, `workon` is meant to be eval'd
        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        let config = pytomata::Config::load(self.home)?;
        let session = pytomata::Session::open(&config);

        // Dispatch to command
        match self.cmd {
            Command::Attach(mut cmd) => cmd.run(&session).await,
            Command::Detach(mut cmd) => cmd.run(&session).await,
            Command::Find(mut cmd) => cmd.run(&session).await,
            Command::List(mut cmd) => cmd.run(&session).await,
            Command::Make(mut cmd) => cmd.run(&session).await,
            Command::Remove(mut cmd) => cmd.run(&session).await,
            Command::Workon(mut cmd) => cmd.run(&session).await,
        }
    }
}

/// Map a failed command to its documented exit code.
fn exit_code(err: &miette::Report) -> i32 {
    err.downcast_ref::<pytomata::Error>()
        .map(pytomata::Error::exit_code)
        .unwrap_or(1)
}

#[tokio::main]
async fn main() {
    let opt = Opt::parse();
    let code = match opt.run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:?}");
            exit_code(&err)
        }
    };
    std::process::exit(code);
}
