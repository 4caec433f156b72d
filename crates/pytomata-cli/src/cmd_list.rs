// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! Implementation of the `pytomata list` command.

use clap::Args;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use pytomata::{CatalogEntry, ListFilter};

/// List available virtual environments along with associated projects
#[derive(Debug, Args)]
pub struct CmdList {
    /// Only show environments attached to at least one project
    #[clap(long, conflicts_with = "not_attached")]
    attached: bool,

    /// Only show environments not attached to any project
    #[clap(long)]
    not_attached: bool,

    /// Output format: table, yaml
    #[clap(long, default_value = "table", value_parser = ["table", "yaml"])]
    format: String,
}

impl CmdList {
    pub async fn run(&mut self, session: &pytomata::Session) -> Result<i32> {
        let catalog = session.store.catalog(self.filter())?;

        if self.format == "yaml" {
            print!("{}", serde_yaml::to_string(&catalog).into_diagnostic()?);
        } else {
            show_table(&catalog);
        }

        Ok(0)
    }

    fn filter(&self) -> ListFilter {
        let attached = match (self.attached, self.not_attached) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        };
        ListFilter::from_flag(attached)
    }
}

fn show_table(catalog: &[CatalogEntry]) {
    if catalog.is_empty() {
        println!("{}", "(no environments)".dimmed());
        return;
    }

    for entry in catalog {
        let environment = &entry.environment;
        println!(
            "{} {}",
            environment.name.green().bold(),
            format!("(python {})", environment.version).dimmed()
        );
        for project in &entry.projects {
            println!("  {}", project.display().to_string().cyan());
        }
    }

    println!();
    println!("Total: {} environment(s)", catalog.len());
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rstest::rstest;

    use super::*;

    #[derive(Parser)]
    struct Wrapper {
        #[clap(flatten)]
        cmd: CmdList,
    }

    #[rstest]
    #[case(&[], ListFilter::All)]
    #[case(&["--attached"], ListFilter::Attached)]
    #[case(&["--not-attached"], ListFilter::Unattached)]
    fn test_filter_from_flags(#[case] args: &[&str], #[case] expected: ListFilter) {
        let parsed = Wrapper::try_parse_from(std::iter::once("list").chain(args.iter().copied()))
            .unwrap();
        assert_eq!(parsed.cmd.filter(), expected);
    }

    #[rstest]
    fn test_attached_flags_conflict() {
        assert!(Wrapper::try_parse_from(["list", "--attached", "--not-attached"]).is_err());
    }

    #[rstest]
    fn test_unknown_format_rejected() {
        assert!(Wrapper::try_parse_from(["list", "--format", "json"]).is_err());
    }
}
