// toprefix-core/src/source/naming.rs
use lazy_static::lazy_static;
use regex::Regex;
use toprefix_common::error::{Result, ToprefixError};

/// The four archive layouts the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarXz,
    TarGz,
    TarBz2,
    Zip,
}

impl ArchiveFormat {
    pub fn suffix(self) -> &'static str {
        match self {
            ArchiveFormat::TarXz => ".tar.xz",
            ArchiveFormat::TarGz => ".tar.gz",
            ArchiveFormat::TarBz2 => ".tar.bz2",
            ArchiveFormat::Zip => ".zip",
        }
    }
}

const ARCHIVE_SUFFIXES: [(&str, ArchiveFormat); 4] = [
    (".tar.xz", ArchiveFormat::TarXz),
    (".tar.gz", ArchiveFormat::TarGz),
    (".tar.bz2", ArchiveFormat::TarBz2),
    (".zip", ArchiveFormat::Zip),
];

// some-v1.23.456
// hoge-123.45.6
// hoge-v1.23
// go1.19.3
lazy_static! {
    static ref STEM_PATTERN: Regex = Regex::new(r"^(.*?)-?v?(\d+)(\.\d+)(\.\d+)?$").unwrap();
}

/// Platform suffixes that sit between the version and the archive suffix.
const TRIPLETS: [&str; 2] = [".linux-amd64", "-windows-x86_64"];

/// Release-asset URLs whose basename carries no version. The tag path
/// segment holds the version instead.
lazy_static! {
    static ref RELEASE_ASSET_PATTERNS: Vec<(Regex, &'static str)> = vec![(
        Regex::new(r"/releases/download/v?([^/]+)/ninja-(?:win|linux|mac)\.zip$").unwrap(),
        "ninja",
    )];
}

/// Splits a recognized archive suffix off `file_name`.
pub fn split_archive_suffix(file_name: &str) -> Result<(&str, ArchiveFormat)> {
    for (suffix, format) in ARCHIVE_SUFFIXES {
        if let Some(stem) = file_name.strip_suffix(suffix) {
            return Ok((stem, format));
        }
    }
    Err(ToprefixError::UnsupportedArchiveFormat(file_name.to_string()))
}

fn match_stem(stem: &str) -> Option<(String, String)> {
    let m = STEM_PATTERN.captures(stem)?;
    let name = m.get(1).map_or("", |g| g.as_str());
    if name.is_empty() {
        return None;
    }
    let major = m.get(2).map_or("", |g| g.as_str());
    let minor = m.get(3).map_or("", |g| g.as_str());
    // absent patch is omitted, not padded
    let patch = m.get(4).map_or("", |g| g.as_str());
    Some((name.to_string(), format!("{major}{minor}{patch}")))
}

fn stem_name_version(stem: &str) -> Option<(String, String)> {
    if let Some(found) = match_stem(stem) {
        return Some(found);
    }
    for triplet in TRIPLETS {
        if let Some(bare) = stem.strip_suffix(triplet) {
            if let Some(found) = match_stem(bare) {
                return Some(found);
            }
        }
    }
    None
}

/// Derives `(name, version)` from an archive URL.
///
/// Tries the basename stem first, then the stem with a platform triplet
/// stripped, then the tool-specific release-asset patterns against the
/// whole URL. A stem nothing matches is a `NamingError`; a name is never
/// fabricated.
pub fn name_version_from_url(url: &str) -> Result<(String, String)> {
    let basename = url.rsplit('/').next().unwrap_or("");
    let (stem, _) = split_archive_suffix(basename)?;
    if let Some(found) = stem_name_version(stem) {
        return Ok(found);
    }
    for (pattern, tool) in RELEASE_ASSET_PATTERNS.iter() {
        if let Some(m) = pattern.captures(url) {
            if let Some(tag) = m.get(1) {
                return Ok((tool.to_string(), tag.as_str().to_string()));
            }
        }
    }
    Err(ToprefixError::Naming(stem.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashed_name_and_three_part_version() {
        let (name, version) =
            name_version_from_url("https://example.org/glib-2.75.0.tar.xz").unwrap();
        assert_eq!(name, "glib");
        assert_eq!(version, "2.75.0");
    }

    #[test]
    fn absent_patch_component_is_omitted() {
        let (name, version) = name_version_from_url("https://example.org/hoge-v1.23.tar.gz").unwrap();
        assert_eq!(name, "hoge");
        assert_eq!(version, "1.23");
    }

    #[test]
    fn linux_triplet_with_undashed_version() {
        let (name, version) =
            name_version_from_url("https://go.dev/dl/go1.19.3.linux-amd64.tar.gz").unwrap();
        assert_eq!(name, "go");
        assert_eq!(version, "1.19.3");
    }

    #[test]
    fn windows_triplet() {
        let (name, version) =
            name_version_from_url("https://example.org/foo-2.5.1-windows-x86_64.zip").unwrap();
        assert_eq!(name, "foo");
        assert_eq!(version, "2.5.1");
    }

    #[test]
    fn multi_dash_names_keep_their_dashes() {
        let (name, version) =
            name_version_from_url("https://example.org/wayland-protocols-1.31.tar.xz").unwrap();
        assert_eq!(name, "wayland-protocols");
        assert_eq!(version, "1.31");
    }

    #[test]
    fn release_asset_url_names_the_tool() {
        let (name, version) = name_version_from_url(
            "https://github.com/ninja-build/ninja/releases/download/v1.11.1/ninja-linux.zip",
        )
        .unwrap();
        assert_eq!(name, "ninja");
        assert_eq!(version, "1.11.1");
    }

    #[test]
    fn unversioned_stem_is_a_naming_error() {
        let err = name_version_from_url("https://example.org/master.zip").unwrap_err();
        match err {
            ToprefixError::Naming(stem) => assert_eq!(stem, "master"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bare_version_has_no_name_to_extract() {
        assert!(name_version_from_url("https://example.org/v1.2.3.tar.gz").is_err());
    }

    #[test]
    fn unknown_suffix_is_unsupported() {
        let err = name_version_from_url("https://example.org/foo-1.2.3.tar.zst").unwrap_err();
        assert!(matches!(err, ToprefixError::UnsupportedArchiveFormat(_)));
    }

    #[test]
    fn suffix_split_returns_stem_and_format() {
        let (stem, format) = split_archive_suffix("glib-2.75.0.tar.xz").unwrap();
        assert_eq!(stem, "glib-2.75.0");
        assert_eq!(format, ArchiveFormat::TarXz);
        let (stem, format) = split_archive_suffix("foot-1.13.1.tar.bz2").unwrap();
        assert_eq!(stem, "foot-1.13.1");
        assert_eq!(format, ArchiveFormat::TarBz2);
    }
}
