// toprefix-core/src/build/make.rs
use std::path::Path;

use toprefix_common::error::{Result, Stage};

use super::push_args;
use crate::exec;

/// Plain make trees have no configure step; make's own dependency
/// tracking decides what a rerun rebuilds.
pub(super) fn process(package: &str, source_dir: &Path, args: &str) -> Result<()> {
    let mut build_line = String::from("make");
    push_args(&mut build_line, args);
    exec::run(package, Stage::Build, &build_line, source_dir)?;

    let mut install_line = String::from("make install");
    push_args(&mut install_line, args);
    exec::run(package, Stage::Install, &install_line, source_dir)
}
