// toprefix-core/src/source/git.rs
use std::path::PathBuf;

use toprefix_common::config::Config;
use toprefix_common::error::{Result, Stage, ToprefixError};
use tracing::debug;

use crate::exec;

/// Clones track a branch head rather than a release, so they all report
/// this placeholder version.
pub const GIT_VERSION: &str = "git";

/// A repository cloned at its default branch head.
#[derive(Debug, Clone)]
pub struct GitRepository {
    pub name: String,
    pub url: String,
    pub patches: Vec<PathBuf>,
}

impl GitRepository {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            patches: Vec::new(),
        }
    }

    pub fn github(user: &str, name: &str) -> Self {
        Self::new(name, &format!("https://github.com/{user}/{name}.git"))
    }

    pub fn gitlab_freedesktop(group: &str, name: &str) -> Self {
        Self::new(
            name,
            &format!("https://gitlab.freedesktop.org/{group}/{name}.git"),
        )
    }

    pub fn codeberg(user: &str, name: &str) -> Self {
        Self::new(name, &format!("https://codeberg.org/{user}/{name}.git"))
    }

    pub fn sourcehut(user: &str, name: &str) -> Self {
        Self::new(name, &format!("https://git.sr.ht/~{user}/{name}"))
    }

    /// Clones into the cache directory unless the working tree is already
    /// there, applies patches, and returns the tree.
    pub fn extract(&self, config: &Config) -> Result<PathBuf> {
        let target = config.src_dir().join(&self.name);
        if target.exists() {
            debug!("exists: {}", target.display());
        } else {
            std::fs::create_dir_all(config.src_dir())?;
            let line = format!("git clone {} {}", self.url, self.name);
            exec::run(&self.name, Stage::Fetch, &line, config.src_dir()).map_err(|e| match e {
                ToprefixError::CommandFailed { status, .. } => ToprefixError::Clone {
                    package: self.name.clone(),
                    url: self.url.clone(),
                    status,
                },
                other => other,
            })?;
        }
        super::apply_patches(&self.name, &target, &self.patches)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use toprefix_common::config::Config;
    use which::which;

    use super::*;

    fn test_config(root: &std::path::Path) -> Config {
        Config {
            prefix: root.join("prefix"),
            src_dir: root.join("src"),
            local_bin_dir: root.join("bin"),
            config_dir: root.join("config"),
        }
    }

    #[test]
    fn forge_constructors_build_clone_urls() {
        assert_eq!(
            GitRepository::github("wizbright", "waybox").url,
            "https://github.com/wizbright/waybox.git"
        );
        assert_eq!(
            GitRepository::gitlab_freedesktop("wayland", "wayland-protocols").url,
            "https://gitlab.freedesktop.org/wayland/wayland-protocols.git"
        );
        assert_eq!(
            GitRepository::codeberg("dnkl", "foot").url,
            "https://codeberg.org/dnkl/foot.git"
        );
        assert_eq!(
            GitRepository::sourcehut("sircmpwn", "scdoc").url,
            "https://git.sr.ht/~sircmpwn/scdoc"
        );
    }

    #[test]
    fn existing_clone_is_reused_without_running_git() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());
        let tree = config.src_dir().join("demo");
        std::fs::create_dir_all(&tree).unwrap();
        std::fs::write(tree.join("marker"), "kept").unwrap();

        // A URL no clone could ever succeed from proves nothing runs.
        let repo = GitRepository::new("demo", "http://invalid.invalid/demo.git");
        let dir = repo.extract(&config).unwrap();
        assert_eq!(dir, tree);
        assert!(dir.join("marker").exists());
    }

    #[test]
    fn failed_clone_maps_to_a_clone_error() {
        if which("git").is_err() {
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());

        let repo = GitRepository::new("demo", "/nonexistent/nowhere.git");
        let err = repo.extract(&config).unwrap_err();
        match err {
            ToprefixError::Clone { package, url, .. } => {
                assert_eq!(package, "demo");
                assert_eq!(url, "/nonexistent/nowhere.git");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
