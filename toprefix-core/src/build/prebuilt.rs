// toprefix-core/src/build/prebuilt.rs
use std::fs;
use std::path::Path;

use toprefix_common::config::Config;
use toprefix_common::error::{Result, ToprefixError};
use tracing::info;

/// Links `binary` (relative to the extracted tree) into the local
/// binaries directory, replacing whatever file or link is already there.
/// Single-file archives extract to a plain file instead of a tree; that
/// file is then the binary itself, installed under the declared name.
/// Windows has no unprivileged symlinks, so the binary is copied instead.
pub(super) fn install(
    package: &str,
    source_dir: &Path,
    config: &Config,
    binary: &str,
) -> Result<()> {
    let target = if source_dir.is_file() {
        source_dir.to_path_buf()
    } else {
        source_dir.join(binary)
    };
    if !target.exists() {
        return Err(ToprefixError::Catalog(format!(
            "prebuilt binary '{binary}' for '{package}' is not in {}",
            source_dir.display()
        )));
    }
    let file_name = Path::new(binary).file_name().ok_or_else(|| {
        ToprefixError::Catalog(format!("prebuilt binary path '{binary}' has no file name"))
    })?;

    fs::create_dir_all(config.local_bin_dir())?;
    let dest = config.local_bin_dir().join(file_name);
    // symlink_metadata also sees dangling links, which exists() misses.
    if fs::symlink_metadata(&dest).is_ok() {
        fs::remove_file(&dest)?;
    }
    link_or_copy(&target, &dest)?;
    info!("[{package}] install: {} -> {}", dest.display(), target.display());
    Ok(())
}

#[cfg(unix)]
fn link_or_copy(target: &Path, dest: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, dest)?;
    Ok(())
}

#[cfg(windows)]
fn link_or_copy(target: &Path, dest: &Path) -> Result<()> {
    fs::copy(target, dest)?;
    Ok(())
}
