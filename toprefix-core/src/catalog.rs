// toprefix-core/src/catalog.rs
//! Declarative package catalog.
//!
//! An embedded definition file ships with the tool; a user file under the
//! configuration directory appends to it. Every entry is resolved to a
//! concrete `Source` and `Backend` here, at load time, so a bad entry
//! fails before anything is fetched or built.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use toml::value::Table;
use toml::Value;
use toprefix_common::config::Config;
use toprefix_common::error::{Result, ToprefixError};
use tracing::debug;

use crate::build::{Backend, Package};
use crate::source::{Archive, GitRepository, Source};

const EMBEDDED_CATALOG: &str = include_str!("packages.toml");

#[derive(Debug)]
pub struct Catalog {
    entries: Vec<Package>,
}

impl Catalog {
    /// Parses the embedded catalog, then the user catalog if one exists.
    /// A name declared twice, in one file or across both, is an error.
    pub fn load(config: &Config) -> Result<Self> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        parse_into(EMBEDDED_CATALOG, config, &mut entries, &mut seen)?;

        let user_catalog = config.user_catalog_path();
        if user_catalog.is_file() {
            let text = fs::read_to_string(&user_catalog)?;
            parse_into(&text, config, &mut entries, &mut seen)?;
            debug!("Loaded user catalog from {}", user_catalog.display());
        }
        debug!("Catalog holds {} packages", entries.len());
        Ok(Self { entries })
    }

    /// Declaration order, embedded entries first.
    pub fn packages(&self) -> &[Package] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&Package> {
        self.entries.iter().find(|p| p.name() == name)
    }
}

fn parse_into(
    text: &str,
    config: &Config,
    entries: &mut Vec<Package>,
    seen: &mut HashSet<String>,
) -> Result<()> {
    let root: Value = text.parse()?;
    let table = root
        .as_table()
        .ok_or_else(|| ToprefixError::Catalog("catalog root is not a table".to_string()))?;

    for (name, value) in table {
        if !seen.insert(name.clone()) {
            return Err(ToprefixError::Catalog(format!(
                "duplicate package '{name}'"
            )));
        }
        let entry = value.as_table().ok_or_else(|| ToprefixError::UnknownSpec {
            package: name.clone(),
            detail: "entry is not a table".to_string(),
        })?;
        reject_unknown_keys(name, "entry", entry, &["source", "pkg", "patch"])?;

        let source_value = entry.get("source").ok_or_else(|| ToprefixError::UnknownSpec {
            package: name.clone(),
            detail: "missing 'source'".to_string(),
        })?;
        let pkg_value = entry.get("pkg").ok_or_else(|| ToprefixError::UnknownSpec {
            package: name.clone(),
            detail: "missing 'pkg'".to_string(),
        })?;

        let mut source = resolve_source(name, source_value)?;
        if let Some(patch_value) = entry.get("patch") {
            for patch in resolve_patches(name, patch_value, config)? {
                source.push_patch(patch);
            }
        }
        let backend = resolve_backend(name, pkg_value)?;
        entries.push(Package::new(source, backend));
    }
    Ok(())
}

/// The catalog key is the package name everywhere; a source's derived or
/// repository name only shows up inside URLs and cache file names.
fn resolve_source(package: &str, value: &Value) -> Result<Source> {
    let table = value.as_table().ok_or_else(|| ToprefixError::UnknownSpec {
        package: package.to_string(),
        detail: "'source' is not a table".to_string(),
    })?;
    let (kind, spec) = single_entry(package, "source", table)?;

    match kind {
        "gnome" => {
            let spec_table = kind_table(package, kind, spec)?;
            reject_unknown_keys(package, kind, spec_table, &["version"])?;
            let version = require_str(package, kind, spec_table, "version")?;
            Ok(Source::Archive(Archive::gnome(package, version)?))
        }
        "url" => {
            let url = spec.as_str().ok_or_else(|| ToprefixError::UnknownSpec {
                package: package.to_string(),
                detail: "source kind 'url' needs a string value".to_string(),
            })?;
            let mut archive = Archive::from_url(url)?;
            archive.name = package.to_string();
            Ok(Source::Archive(archive))
        }
        "github" | "codeberg" | "sourcehut" => {
            let spec_table = kind_table(package, kind, spec)?;
            reject_unknown_keys(package, kind, spec_table, &["user", "name", "tag"])?;
            let user = require_str(package, kind, spec_table, "user")?;
            let repo = spec_table
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(package);
            match spec_table.get("tag") {
                Some(tag) => {
                    let tag = tag.as_str().ok_or_else(|| ToprefixError::UnknownSpec {
                        package: package.to_string(),
                        detail: format!("source kind '{kind}' needs a string 'tag'"),
                    })?;
                    let mut archive = match kind {
                        "github" => Archive::github_tag(user, repo, tag),
                        "codeberg" => Archive::codeberg_tag(user, repo, tag),
                        _ => Archive::sourcehut_tag(user, repo, tag),
                    };
                    archive.name = package.to_string();
                    Ok(Source::Archive(archive))
                }
                None => {
                    let mut repository = match kind {
                        "github" => GitRepository::github(user, repo),
                        "codeberg" => GitRepository::codeberg(user, repo),
                        _ => GitRepository::sourcehut(user, repo),
                    };
                    repository.name = package.to_string();
                    Ok(Source::Git(repository))
                }
            }
        }
        "gitlab" => {
            let spec_table = kind_table(package, kind, spec)?;
            reject_unknown_keys(package, kind, spec_table, &["user", "name"])?;
            let user = require_str(package, kind, spec_table, "user")?;
            let repo = spec_table
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(package);
            let mut repository = GitRepository::gitlab_freedesktop(user, repo);
            repository.name = package.to_string();
            Ok(Source::Git(repository))
        }
        other => Err(ToprefixError::UnknownSpec {
            package: package.to_string(),
            detail: format!("unknown source kind '{other}'"),
        }),
    }
}

fn resolve_backend(package: &str, value: &Value) -> Result<Backend> {
    let table = value.as_table().ok_or_else(|| ToprefixError::UnknownSpec {
        package: package.to_string(),
        detail: "'pkg' is not a table".to_string(),
    })?;
    let (kind, spec) = single_entry(package, "pkg", table)?;
    let text = spec.as_str().ok_or_else(|| ToprefixError::UnknownSpec {
        package: package.to_string(),
        detail: format!("pkg kind '{kind}' needs a string value"),
    })?;

    match kind {
        "meson" => Ok(Backend::Meson {
            args: text.trim().to_string(),
        }),
        "cmake" => Ok(Backend::CMake {
            args: text.trim().to_string(),
        }),
        "make" => Ok(Backend::Make {
            args: text.trim().to_string(),
        }),
        "autotools" => {
            if text.trim().is_empty() {
                Ok(Backend::AutoTools)
            } else {
                Err(ToprefixError::UnknownSpec {
                    package: package.to_string(),
                    detail: "pkg kind 'autotools' takes no arguments".to_string(),
                })
            }
        }
        "prebuilt" => {
            let binary = text.trim();
            if binary.is_empty() {
                Err(ToprefixError::UnknownSpec {
                    package: package.to_string(),
                    detail: "pkg kind 'prebuilt' needs a binary name".to_string(),
                })
            } else {
                Ok(Backend::Prebuilt {
                    binary: binary.to_string(),
                })
            }
        }
        "custom" => {
            let commands: Vec<String> = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect();
            if commands.is_empty() {
                Err(ToprefixError::UnknownSpec {
                    package: package.to_string(),
                    detail: "pkg kind 'custom' has no commands".to_string(),
                })
            } else {
                Ok(Backend::Custom { commands })
            }
        }
        other => Err(ToprefixError::UnknownSpec {
            package: package.to_string(),
            detail: format!("unknown pkg kind '{other}'"),
        }),
    }
}

/// Patch tables map an integer order key to a patch file. Relative paths
/// live under the configuration directory's `patches/`.
fn resolve_patches(package: &str, value: &Value, config: &Config) -> Result<Vec<PathBuf>> {
    let table = value.as_table().ok_or_else(|| ToprefixError::UnknownSpec {
        package: package.to_string(),
        detail: "'patch' is not a table".to_string(),
    })?;

    let mut numbered = Vec::with_capacity(table.len());
    for (key, val) in table {
        let index: u32 = key.parse().map_err(|_| {
            ToprefixError::Catalog(format!(
                "patch key '{key}' for '{package}' is not an integer"
            ))
        })?;
        let text = val.as_str().ok_or_else(|| {
            ToprefixError::Catalog(format!(
                "patch '{key}' for '{package}' is not a file name"
            ))
        })?;
        let path = PathBuf::from(text);
        let path = if path.is_absolute() {
            path
        } else {
            config.patches_dir().join(path)
        };
        numbered.push((index, path));
    }
    numbered.sort_by_key(|(index, _)| *index);
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

fn single_entry<'a>(
    package: &str,
    what: &str,
    table: &'a Table,
) -> Result<(&'a str, &'a Value)> {
    let mut iter = table.iter();
    match (iter.next(), iter.next()) {
        (Some((key, value)), None) => Ok((key.as_str(), value)),
        _ => Err(ToprefixError::UnknownSpec {
            package: package.to_string(),
            detail: format!("expected exactly one {what} kind, found {}", table.len()),
        }),
    }
}

fn kind_table<'a>(package: &str, kind: &str, spec: &'a Value) -> Result<&'a Table> {
    spec.as_table().ok_or_else(|| ToprefixError::UnknownSpec {
        package: package.to_string(),
        detail: format!("source kind '{kind}' is not a table"),
    })
}

fn require_str<'a>(package: &str, kind: &str, table: &'a Table, key: &str) -> Result<&'a str> {
    table
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToprefixError::UnknownSpec {
            package: package.to_string(),
            detail: format!("source kind '{kind}' needs a string '{key}'"),
        })
}

fn reject_unknown_keys(package: &str, what: &str, table: &Table, allowed: &[&str]) -> Result<()> {
    for key in table.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(ToprefixError::UnknownSpec {
                package: package.to_string(),
                detail: format!("unrecognized {what} key '{key}'"),
            });
        }
    }
    Ok(())
}
