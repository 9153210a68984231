// toprefix-core/src/env/mod.rs
//! Resolves the process environment every spawned command runs under.
//!
//! Commands never inherit the ambient shell environment. Each invocation
//! gets a snapshot built from scratch: a minimal PATH around the git
//! binary, a short allow-list of ambient variables, and on Windows the
//! native toolchain variables recovered from the vendor setup script.

#[cfg(windows)]
mod vsenv;

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;
use toprefix_common::error::{Result, ToprefixError};
use tracing::debug;
use which::which;

#[cfg(not(windows))]
const AMBIENT_KEEP: &[&str] = &["HOME", "LANG", "USER", "SHELL"];
#[cfg(windows)]
const AMBIENT_KEEP: &[&str] = &[
    "SystemRoot",
    "APPDATA",
    "LOCALAPPDATA",
    "ComSpec",
    "OS",
    "NUMBER_OF_PROCESSORS",
    "PROCESSOR_ARCHITECTURE",
    "PROCESSOR_IDENTIFIER",
    "PROCESSOR_LEVEL",
    "PROCESSOR_REVISION",
    "POWERSHELL_DISTRIBUTION_CHANNEL",
    "PSModulePath",
    "TEMP",
    "TMP",
    "USERNAME",
    "USERPROFILE",
];

/// Toolchain variables worth keeping out of the vcvars dump. Everything
/// else the script exports is discarded.
pub const TOOLCHAIN_KEEP: [&str; 5] = ["VCINSTALLDIR", "PATH", "INCLUDE", "LIB", "LIBPATH"];

/// One immutable environment snapshot. Keys are case-insensitive on
/// Windows (stored upper-cased).
#[derive(Debug, Clone)]
pub struct Environment {
    vars: HashMap<String, String>,
}

fn canonical_key(key: &str) -> String {
    if cfg!(windows) {
        key.to_uppercase()
    } else {
        key.to_string()
    }
}

impl Environment {
    /// Builds the snapshot commands run under: the minimal baseline plus,
    /// on Windows, the recovered toolchain variables.
    pub fn resolve() -> Result<Self> {
        #[cfg(windows)]
        {
            let mut env = Self::minimal()?;
            let toolchain = vsenv::toolchain_env(&env)?;
            env.merge_toolchain(toolchain)?;
            Ok(env)
        }
        #[cfg(not(windows))]
        Self::minimal()
    }

    /// The platform baseline: git's directory plus the OS-essential PATH
    /// entries, and the fixed ambient allow-list.
    pub fn minimal() -> Result<Self> {
        let git = which("git").map_err(|_| ToprefixError::ToolNotFound("git".to_string()))?;
        let git_dir = git.parent().ok_or_else(|| {
            ToprefixError::BuildEnv(format!("git binary {} has no parent directory", git.display()))
        })?;

        let mut path_dirs: Vec<PathBuf> = vec![git_dir.to_path_buf()];
        if cfg!(windows) {
            if let Ok(system_root) = env::var("SystemRoot") {
                let root = PathBuf::from(system_root);
                path_dirs.push(root.join("System32"));
                path_dirs.push(root.join("System32").join("WindowsPowerShell").join("v1.0"));
            }
        } else {
            path_dirs.push(PathBuf::from("/bin"));
            path_dirs.push(PathBuf::from("/usr/bin"));
            path_dirs.push(PathBuf::from("/sbin"));
        }
        let path = join_path_dirs(&path_dirs)?;

        let mut vars = HashMap::new();
        vars.insert(canonical_key("PATH"), path);
        for key in AMBIENT_KEEP {
            if let Ok(value) = env::var(key) {
                vars.insert(canonical_key(key), value);
            }
        }
        debug!("Resolved minimal environment ({} variables)", vars.len());
        Ok(Self { vars })
    }

    #[cfg(test)]
    pub(crate) fn from_vars(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(&canonical_key(key)).map(String::as_str)
    }

    pub fn path_string(&self) -> Option<&str> {
        self.get("PATH")
    }

    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }

    /// Layers script-recovered variables over the baseline. `PATH` merges
    /// by appending only segments the baseline does not already have;
    /// every other key overwrites.
    pub fn merge_toolchain(&mut self, toolchain: HashMap<String, String>) -> Result<()> {
        for (key, value) in toolchain {
            let key = canonical_key(&key);
            if key == "PATH" {
                let merged = match self.vars.get("PATH") {
                    Some(base) => merge_path_value(base, &value)?,
                    None => value,
                };
                self.vars.insert(key, merged);
            } else {
                self.vars.insert(key, value);
            }
        }
        Ok(())
    }

    /// Replaces the child's inherited environment with this snapshot.
    pub fn apply_to_command(&self, command: &mut Command) {
        command.env_clear();
        command.envs(&self.vars);
    }
}

/// Path of the toolchain setup script the environment is recovered from.
#[cfg(windows)]
pub fn toolchain_script() -> Result<PathBuf> {
    vsenv::find_vcvars()
}

fn join_path_dirs(dirs: &[PathBuf]) -> Result<String> {
    let joined = env::join_paths(dirs)
        .map_err(|e| ToprefixError::BuildEnv(format!("Failed to join PATH entries: {e}")))?;
    Ok(joined.to_string_lossy().into_owned())
}

/// Appends the segments of `extra` that `base` does not already contain,
/// preserving base order.
pub fn merge_path_value(base: &str, extra: &str) -> Result<String> {
    let mut dirs: Vec<PathBuf> = env::split_paths(base).collect();
    for dir in env::split_paths(extra) {
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    join_path_dirs(&dirs)
}

/// Parses the output of the shell's `set` builtin: one `KEY=value` per
/// line, keys upper-cased, anything without a `=` skipped.
pub fn parse_env_dump(text: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if let Some((key, value)) = line.split_once('=') {
            if !key.is_empty() {
                vars.insert(key.to_uppercase(), value.to_string());
            }
        }
    }
    vars
}

/// Intersects a recovered variable dump with `TOOLCHAIN_KEEP`.
pub fn filter_toolchain_vars(mut all: HashMap<String, String>) -> HashMap<String, String> {
    all.retain(|key, _| TOOLCHAIN_KEEP.contains(&key.as_str()));
    all
}

/// Kit names read `<display name> Release - <arch>`; the vswhere product
/// query wants just the display name.
pub fn product_display_name(kit_name: &str) -> String {
    let head = kit_name.split('-').next().unwrap_or(kit_name).trim();
    head.strip_suffix(" Release").unwrap_or(head).to_string()
}

/// Picks the kit configured for a 64-bit host and target out of the CMake
/// Tools kits registry.
pub fn select_x64_kit(kits: &Value) -> Option<String> {
    for kit in kits.as_array()?.iter() {
        let generator = match kit.get("preferredGenerator") {
            Some(g) => g,
            None => continue,
        };
        if generator.get("platform").and_then(Value::as_str) == Some("x64")
            && generator.get("toolset").and_then(Value::as_str) == Some("host=x64")
        {
            if let Some(name) = kit.get("name").and_then(Value::as_str) {
                return Some(name.to_string());
            }
        }
    }
    None
}

/// Finds the installation path of the product whose `displayName` matches,
/// in vswhere's JSON output.
pub fn find_install_path(products: &Value, display_name: &str) -> Option<PathBuf> {
    for product in products.as_array()?.iter() {
        if product.get("displayName").and_then(Value::as_str) == Some(display_name) {
            if let Some(path) = product.get("installationPath").and_then(Value::as_str) {
                return Some(PathBuf::from(path));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn minimal_path_starts_with_the_git_directory() {
        if which("git").is_err() {
            return;
        }
        let env = Environment::minimal().unwrap();
        let path = env.path_string().unwrap();
        let git_dir = which("git").unwrap().parent().unwrap().to_path_buf();
        let first: Vec<PathBuf> = std::env::split_paths(path).collect();
        assert_eq!(first[0], git_dir);
        #[cfg(not(windows))]
        {
            assert!(first.contains(&PathBuf::from("/bin")));
            assert!(first.contains(&PathBuf::from("/usr/bin")));
            assert!(first.contains(&PathBuf::from("/sbin")));
        }
    }

    #[test]
    fn merge_appends_only_new_path_segments() {
        let merged = merge_path_value("/git:/bin:/usr/bin", "/bin:/opt/vc/bin:/usr/bin").unwrap();
        assert_eq!(merged, "/git:/bin:/usr/bin:/opt/vc/bin");
    }

    #[test]
    fn merge_toolchain_overwrites_plain_keys_and_merges_path() {
        let mut env = Environment {
            vars: HashMap::from([
                ("PATH".to_string(), "/git:/bin".to_string()),
                ("LANG".to_string(), "C".to_string()),
            ]),
        };
        env.merge_toolchain(HashMap::from([
            ("PATH".to_string(), "/bin:/toolchain/bin".to_string()),
            ("INCLUDE".to_string(), "/toolchain/include".to_string()),
        ]))
        .unwrap();
        assert_eq!(env.get("PATH").unwrap(), "/git:/bin:/toolchain/bin");
        assert_eq!(env.get("INCLUDE").unwrap(), "/toolchain/include");
        assert_eq!(env.get("LANG").unwrap(), "C");
    }

    #[test]
    fn dump_parsing_uppercases_keys_and_skips_noise() {
        let dump = "Path=C:\\x;C:\\y\r\nINCLUDE=C:\\inc\r\nMicrosoft Windows [Version]\r\n=weird\r\n";
        let vars = parse_env_dump(dump);
        assert_eq!(vars.get("PATH").unwrap(), "C:\\x;C:\\y");
        assert_eq!(vars.get("INCLUDE").unwrap(), "C:\\inc");
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn toolchain_filter_keeps_only_the_allow_list() {
        let mut dump = HashMap::new();
        for key in [
            "PATH", "INCLUDE", "LIB", "LIBPATH", "VCINSTALLDIR", "VSCMD_ARG_HOST_ARCH",
            "WINDIR", "FRAMEWORKDIR", "UCRTVERSION", "TMP",
        ] {
            dump.insert(key.to_string(), "x".to_string());
        }
        let kept = filter_toolchain_vars(dump);
        let mut keys: Vec<&str> = kept.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["INCLUDE", "LIB", "LIBPATH", "PATH", "VCINSTALLDIR"]);
    }

    #[test]
    fn kit_selection_filters_for_x64_host_and_target() {
        let kits = json!([
            {"name": "Clang 15 - x86", "preferredGenerator": {"platform": "x86", "toolset": "host=x86"}},
            {"name": "Visual Studio Community 2022 Release - amd64",
             "preferredGenerator": {"name": "Visual Studio 17 2022", "platform": "x64", "toolset": "host=x64"}},
        ]);
        assert_eq!(
            select_x64_kit(&kits).unwrap(),
            "Visual Studio Community 2022 Release - amd64"
        );
        assert_eq!(select_x64_kit(&json!([])), None);
        assert_eq!(select_x64_kit(&json!({})), None);
    }

    #[test]
    fn kit_name_maps_to_product_display_name() {
        assert_eq!(
            product_display_name("Visual Studio Community 2022 Release - amd64"),
            "Visual Studio Community 2022"
        );
        assert_eq!(
            product_display_name("Visual Studio Build Tools 2019 - amd64"),
            "Visual Studio Build Tools 2019"
        );
        assert_eq!(product_display_name("plain"), "plain");
    }

    #[test]
    fn install_path_lookup_matches_display_name() {
        let products = json!([
            {"displayName": "Visual Studio Community 2022",
             "installationPath": "C:\\VS\\Community"},
        ]);
        assert_eq!(
            find_install_path(&products, "Visual Studio Community 2022").unwrap(),
            PathBuf::from("C:\\VS\\Community")
        );
        assert_eq!(find_install_path(&products, "Visual Studio 2019"), None);
    }
}
