// toprefix-common/src/config.rs
use std::fs;
use std::path::{Path, PathBuf};

use directories::UserDirs;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, ToprefixError};

const CONFIG_FILE_NAME: &str = "toprefix.toml";

/// Paths the tool works with. Everything hangs off the user's home
/// directory unless the config file overrides the prefix.
#[derive(Debug, Clone)]
pub struct Config {
    pub prefix: PathBuf,
    pub src_dir: PathBuf,
    pub local_bin_dir: PathBuf,
    pub config_dir: PathBuf,
}

/// On-disk shape of `~/.config/toprefix/toprefix.toml`. All keys optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    prefix: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let user_dirs = UserDirs::new().ok_or_else(|| {
            ToprefixError::Config("could not determine the user home directory".to_string())
        })?;
        let mut config = Self::default_for_home(user_dirs.home_dir());

        let config_file = config.config_file_path();
        if config_file.is_file() {
            let text = fs::read_to_string(&config_file)?;
            config.apply_file(&text, user_dirs.home_dir())?;
            debug!("Loaded configuration from {}", config_file.display());
        }
        debug!("Effective prefix: {}", config.prefix.display());
        Ok(config)
    }

    fn default_for_home(home: &Path) -> Self {
        Self {
            prefix: home.join("prefix"),
            src_dir: home.join("local").join("src"),
            local_bin_dir: home.join("local").join("bin"),
            config_dir: home.join(".config").join("toprefix"),
        }
    }

    fn apply_file(&mut self, text: &str, home: &Path) -> Result<()> {
        let parsed: ConfigFile = toml::from_str(text)?;
        if let Some(prefix) = parsed.prefix {
            self.prefix = expand_tilde(&prefix, home);
        }
        Ok(())
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    pub fn local_bin_dir(&self) -> &Path {
        &self.local_bin_dir
    }

    pub fn config_file_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    pub fn user_catalog_path(&self) -> PathBuf {
        self.config_dir.join("packages.toml")
    }

    pub fn patches_dir(&self) -> PathBuf {
        self.config_dir.join("patches")
    }

    /// Creates the directories builds write into. The prefix itself is
    /// left to the backends.
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.src_dir)?;
        fs::create_dir_all(&self.local_bin_dir)?;
        Ok(())
    }

    pub fn home_dir(&self) -> PathBuf {
        UserDirs::new().map_or_else(|| PathBuf::from("/"), |ud| ud.home_dir().to_path_buf())
    }
}

pub fn expand_tilde(path_str: &str, home: &Path) -> PathBuf {
    if let Some(stripped) = path_str.strip_prefix("~/") {
        home.join(stripped)
    } else {
        PathBuf::from(path_str)
    }
}

/// Inverse of `expand_tilde`, for display only.
pub fn unexpand_tilde(path: &Path, home: &Path) -> String {
    match path.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => path.display().to_string(),
    }
}
