// toprefix-core/src/source/mod.rs
pub mod archive;
pub mod extract;
pub mod git;
pub mod naming;
#[cfg(test)]
pub(crate) mod test_archives;

use std::path::{Path, PathBuf};

use toprefix_common::config::Config;
use toprefix_common::error::{Result, Stage, ToprefixError};
use tracing::warn;

use crate::exec;

pub use archive::Archive;
pub use git::GitRepository;

/// Where a package's code comes from. Closed set: an HTTP archive or a
/// cloned repository.
#[derive(Debug, Clone)]
pub enum Source {
    Archive(Archive),
    Git(GitRepository),
}

impl Source {
    pub fn name(&self) -> &str {
        match self {
            Source::Archive(a) => &a.name,
            Source::Git(g) => &g.name,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            Source::Archive(a) => &a.version,
            Source::Git(_) => git::GIT_VERSION,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Source::Archive(a) => &a.url,
            Source::Git(g) => &g.url,
        }
    }

    /// Queues a patch file. Only meaningful before the first `extract`.
    pub fn push_patch(&mut self, patch: PathBuf) {
        match self {
            Source::Archive(a) => a.patches.push(patch),
            Source::Git(g) => g.patches.push(patch),
        }
    }

    /// Materializes the source tree under the cache directory and returns
    /// it. Idempotent: existing downloads, extractions and clones are
    /// reused as-is.
    pub fn extract(&self, config: &Config) -> Result<PathBuf> {
        match self {
            Source::Archive(a) => a.extract(config),
            Source::Git(g) => g.extract(config),
        }
    }
}

/// Applies `patches` in declared order inside `dir` with the external
/// patch tool. A failing patch is a warning, not an abort: a patch that
/// is already present in a stale tree must not break reruns.
pub(crate) fn apply_patches(package: &str, dir: &Path, patches: &[PathBuf]) -> Result<()> {
    if patches.is_empty() {
        return Ok(());
    }
    let mut failed = 0usize;
    for patch in patches {
        let line = format!("patch -p0 < {}", patch.display());
        match exec::run(package, Stage::Fetch, &line, dir) {
            Ok(()) => {}
            Err(ToprefixError::CommandFailed { status, .. }) => {
                warn!("[{package}] patch {} failed ({status})", patch.display());
                failed += 1;
            }
            Err(e) => return Err(e),
        }
    }
    if failed > 0 {
        warn!(
            "[{package}] {failed} of {} patches failed to apply",
            patches.len()
        );
    }
    Ok(())
}
