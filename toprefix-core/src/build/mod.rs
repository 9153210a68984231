// toprefix-core/src/build/mod.rs
//! Build backends: the configure, build and install command triads that
//! turn a materialized source tree into installed artifacts.
//!
//! No build state is kept in memory. Whether configure has to run again
//! is re-derived from the filesystem on every invocation, which is what
//! lets an interrupted pipeline resume by simply rerunning it.

mod autotools;
mod cmake;
mod custom;
mod make;
mod meson;
mod prebuilt;

use std::path::Path;

use toprefix_common::config::Config;
use toprefix_common::error::Result;
use tracing::info;

use crate::source::Source;

/// Out-of-tree build directory used by the meson and cmake backends.
pub(crate) const BUILD_DIR: &str = "build";

/// Flags from the command line that widen what a rerun redoes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    pub clean: bool,
    pub reconfigure: bool,
}

/// What `configure` has to do next, derived from one filesystem
/// observation plus the user's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureAction {
    /// No build directory yet: run the full setup command.
    Setup,
    /// Build directory present but the user asked for a clean slate:
    /// delete it, then run the full setup command.
    CleanThenSetup,
    /// Build directory present, incremental re-run requested.
    Reconfigure,
    /// Build directory present and nothing requested: do nothing.
    Skip,
}

/// The single decision point for the configure step. Backends with an
/// out-of-tree build directory map its existence through this table;
/// in-tree backends have no observable state and configure every run.
pub fn configure_action(build_dir_exists: bool, options: ProcessOptions) -> ConfigureAction {
    if !build_dir_exists {
        ConfigureAction::Setup
    } else if options.clean {
        ConfigureAction::CleanThenSetup
    } else if options.reconfigure {
        ConfigureAction::Reconfigure
    } else {
        ConfigureAction::Skip
    }
}

/// How a package gets configured, built and installed once its source
/// tree exists. Closed set resolved at catalog load.
#[derive(Debug, Clone)]
pub enum Backend {
    Meson { args: String },
    CMake { args: String },
    Make { args: String },
    AutoTools,
    /// Install is a single link of `binary` (a path relative to the
    /// extracted tree) into the local binaries directory.
    Prebuilt { binary: String },
    /// User-declared command lines run in order; `{PREFIX}` in each line
    /// is substituted at format time.
    Custom { commands: Vec<String> },
}

impl Backend {
    pub fn label(&self) -> &'static str {
        match self {
            Backend::Meson { .. } => "meson",
            Backend::CMake { .. } => "cmake",
            Backend::Make { .. } => "make",
            Backend::AutoTools => "autotools",
            Backend::Prebuilt { .. } => "prebuilt",
            Backend::Custom { .. } => "custom",
        }
    }
}

/// One catalog entry: a source and the backend that processes it.
#[derive(Debug, Clone)]
pub struct Package {
    pub source: Source,
    pub backend: Backend,
}

impl Package {
    pub fn new(source: Source, backend: Backend) -> Self {
        Self { source, backend }
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn version(&self) -> &str {
        self.source.version()
    }

    /// Runs the whole pipeline for this package: materialize the source,
    /// then hand the tree to the backend. Any command failure aborts the
    /// remaining steps.
    pub fn process(&self, config: &Config, options: ProcessOptions) -> Result<()> {
        info!("[{}] {} {}", self.name(), self.backend.label(), self.version());
        let source_dir = self.source.extract(config)?;
        match &self.backend {
            Backend::Meson { args } => meson::process(self.name(), &source_dir, config, args, options),
            Backend::CMake { args } => cmake::process(self.name(), &source_dir, config, args, options),
            Backend::Make { args } => make::process(self.name(), &source_dir, args),
            Backend::AutoTools => autotools::process(self.name(), &source_dir, config, options),
            Backend::Prebuilt { binary } => prebuilt::install(self.name(), &source_dir, config, binary),
            Backend::Custom { commands } => custom::process(self.name(), &source_dir, config, commands),
        }
    }
}

/// Appends backend args to a command line, skipping the separator when
/// there are none.
fn push_args(line: &mut String, args: &str) {
    if !args.is_empty() {
        line.push(' ');
        line.push_str(args);
    }
}

/// `{PREFIX}` placeholder substitution for user-declared command lines.
fn substitute_prefix(line: &str, prefix: &Path) -> String {
    line.replace("{PREFIX}", &prefix.display().to_string())
}
