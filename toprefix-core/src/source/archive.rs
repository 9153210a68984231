// toprefix-core/src/source/archive.rs
use std::fs;
use std::path::PathBuf;

use lazy_static::lazy_static;
use regex::Regex;
use toprefix_common::config::Config;
use toprefix_common::error::{Result, ToprefixError};
use tracing::debug;

use super::extract::unpack_archive;
use super::naming;

lazy_static! {
    static ref DOTTED_VERSION: Regex = Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?$").unwrap();
}

/// A compressed single-root tree fetched over HTTP.
#[derive(Debug, Clone)]
pub struct Archive {
    pub name: String,
    pub version: String,
    pub url: String,
    /// Local filename the download is cached under.
    pub archive_name: String,
    pub patches: Vec<PathBuf>,
}

impl Archive {
    pub fn new(name: &str, version: &str, url: &str) -> Self {
        let archive_name = url.rsplit('/').next().unwrap_or("").to_string();
        Self::with_archive_name(name, version, url, &archive_name)
    }

    /// For forges whose download URLs do not end in a useful filename.
    pub fn with_archive_name(name: &str, version: &str, url: &str, archive_name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            url: url.to_string(),
            archive_name: archive_name.to_string(),
            patches: Vec::new(),
        }
    }

    /// Derives name and version from the URL itself.
    pub fn from_url(url: &str) -> Result<Self> {
        let (name, version) = naming::name_version_from_url(url)?;
        Ok(Self::new(&name, &version, url))
    }

    /// The GNOME download mirror keys releases by `major.minor`.
    pub fn gnome(name: &str, version: &str) -> Result<Self> {
        let m = DOTTED_VERSION.captures(version).ok_or_else(|| {
            ToprefixError::Catalog(format!(
                "gnome version '{version}' for '{name}' is not MAJOR.MINOR[.PATCH]"
            ))
        })?;
        let major = m.get(1).map_or("", |g| g.as_str());
        let minor = m.get(2).map_or("", |g| g.as_str());
        let url = format!(
            "https://download.gnome.org/sources/{name}/{major}.{minor}/{name}-{version}.tar.xz"
        );
        Ok(Self::new(name, version, &url))
    }

    pub fn github_tag(user: &str, name: &str, tag: &str) -> Self {
        Self::with_archive_name(
            name,
            tag,
            &format!("https://github.com/{user}/{name}/archive/refs/tags/{tag}.tar.gz"),
            &format!("{name}-{tag}.tar.gz"),
        )
    }

    pub fn codeberg_tag(user: &str, name: &str, tag: &str) -> Self {
        Self::with_archive_name(
            name,
            tag,
            &format!("https://codeberg.org/{user}/{name}/archive/{tag}.tar.gz"),
            &format!("{name}-{tag}.tar.gz"),
        )
    }

    pub fn sourcehut_tag(user: &str, name: &str, tag: &str) -> Self {
        Self::with_archive_name(
            name,
            tag,
            &format!("https://git.sr.ht/~{user}/{name}/archive/{tag}.tar.gz"),
            &format!("{name}-{tag}.tar.gz"),
        )
    }

    /// Downloads (if missing), unpacks (if missing), patches, and returns
    /// the extraction directory.
    pub fn extract(&self, config: &Config) -> Result<PathBuf> {
        let download = config.src_dir().join(&self.archive_name);
        if download.exists() {
            debug!("exists: {}", download.display());
        } else {
            toprefix_net::download(&self.name, &self.url, &download)?;
        }

        let (stem, format) = naming::split_archive_suffix(&self.archive_name)?;
        let target = config.src_dir().join(stem);
        if !target.exists() {
            // Unpack somewhere disposable first. The target only appears
            // once a single root entry has been verified and renamed, so
            // a bad archive leaves nothing behind.
            let staging = tempfile::tempdir_in(config.src_dir())?;
            unpack_archive(&download, staging.path(), format)?;

            let mut entries = Vec::new();
            for entry in fs::read_dir(staging.path())? {
                entries.push(entry?.path());
            }
            if entries.len() != 1 {
                return Err(ToprefixError::UnexpectedArchiveLayout {
                    archive: self.archive_name.clone(),
                    entries: entries.len(),
                });
            }
            fs::rename(&entries[0], &target)?;
        }

        super::apply_patches(&self.name, &target, &self.patches)?;
        Ok(target)
    }
}
