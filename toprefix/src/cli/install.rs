// toprefix/src/cli/install.rs
use clap::Args;
use toprefix_common::config::Config;
use toprefix_common::error::{Result, ToprefixError};
use toprefix_core::build::ProcessOptions;
use toprefix_core::catalog::Catalog;

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Package name, as shown by `toprefix list`
    pub package: String,

    /// Delete the build directory and configure from scratch
    #[arg(long)]
    pub clean: bool,

    /// Re-run configure against the existing build directory
    #[arg(long)]
    pub reconfigure: bool,
}

impl InstallArgs {
    pub fn run(&self, config: &Config) -> Result<()> {
        let catalog = Catalog::load(config)?;
        let package = catalog
            .get(&self.package)
            .ok_or_else(|| ToprefixError::UnknownPackage(self.package.clone()))?;

        config.ensure_dirs()?;
        package.process(
            config,
            ProcessOptions {
                clean: self.clean,
                reconfigure: self.reconfigure,
            },
        )
    }
}
