// toprefix-core/src/build/autotools.rs
use std::path::Path;

use toprefix_common::config::Config;
use toprefix_common::error::{Result, Stage};

use super::ProcessOptions;
use crate::exec;

pub(super) fn process(
    package: &str,
    source_dir: &Path,
    config: &Config,
    options: ProcessOptions,
) -> Result<()> {
    configure(package, source_dir, config, options)?;
    exec::run(package, Stage::Build, "make", source_dir)?;
    exec::run(package, Stage::Install, "make install", source_dir)
}

/// autotools configures in-tree, so there is no build directory to
/// observe: `./configure` runs every time. A prior `Makefile` plus the
/// clean flag gets a `make distclean` first.
fn configure(
    package: &str,
    source_dir: &Path,
    config: &Config,
    options: ProcessOptions,
) -> Result<()> {
    if options.clean && source_dir.join("Makefile").exists() {
        exec::run(package, Stage::Configure, "make distclean", source_dir)?;
    }
    exec::run(
        package,
        Stage::Configure,
        &format!("./configure --prefix={}", config.prefix().display()),
        source_dir,
    )
}
