// toprefix/src/cli.rs
//! Defines the command-line argument structure using clap.
use clap::{ArgAction, Parser, Subcommand};
use toprefix_common::error::Result;
use toprefix_common::Config;

// Module declarations
pub mod install;
pub mod list;
pub mod report;

use crate::cli::install::InstallArgs;
use crate::cli::list::List;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "toprefix", bin_name = "toprefix")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// With no subcommand, prints help plus the environment report.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every package the catalog knows
    List(List),
    /// Fetch, build and install one package
    Install(InstallArgs),
    /// Print the version string
    Version,
}

impl Command {
    pub fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::List(command) => command.run(config),
            Self::Install(command) => command.run(config),
            Self::Version => {
                println!("{}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}
