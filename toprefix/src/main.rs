// toprefix/src/main.rs
use std::process;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use toprefix_common::config::Config;
use toprefix_common::error::Result;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{CliArgs, Command};

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    if matches!(cli_args.command, Some(Command::Version)) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let level_filter = match cli_args.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("TOPREFIX_LOG")
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .without_time()
        .try_init();

    let config = Config::load()?;

    let result = match &cli_args.command {
        Some(command) => command.run(&config),
        None => {
            let mut help = CliArgs::command();
            help.print_help()?;
            cli::report::print(&config);
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("Command failed: {e}");
        eprintln!("{}: {e}", "Error".red().bold());
        process::exit(1);
    }
    debug!("Command completed successfully.");
    Ok(())
}
