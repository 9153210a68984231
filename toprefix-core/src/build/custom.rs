// toprefix-core/src/build/custom.rs
use std::path::Path;

use toprefix_common::config::Config;
use toprefix_common::error::{Result, Stage};

use super::substitute_prefix;
use crate::exec;

/// Runs the user-declared command lines in declared order. There is no
/// separate install step; whatever installing means for the package is
/// part of the sequence.
pub(super) fn process(
    package: &str,
    source_dir: &Path,
    config: &Config,
    commands: &[String],
) -> Result<()> {
    for line in commands {
        let line = substitute_prefix(line, config.prefix());
        exec::run(package, Stage::Build, &line, source_dir)?;
    }
    Ok(())
}
