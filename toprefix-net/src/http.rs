// toprefix-net/src/http.rs
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use toprefix_common::error::{Result, ToprefixError};
use tracing::debug;

const DOWNLOAD_TIMEOUT_SECS: u64 = 300;
const CONNECT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT_STRING: &str = "toprefix build tool (Rust; +https://github.com/toprefix/toprefix)";
const CHUNK_SIZE: usize = 8192;

/// Streams `url` to `dest`, reporting progress by bytes transferred.
///
/// The body is written to a dotfile next to `dest` and renamed into place
/// once the transfer completes, so an interrupted download never leaves a
/// file that would satisfy a later existence check.
pub fn download(package: &str, url: &str, dest: &Path) -> Result<PathBuf> {
    let temp_filename = format!(
        ".{}.download",
        dest.file_name().unwrap_or_default().to_string_lossy()
    );
    let temp_path = dest.with_file_name(temp_filename);
    if temp_path.exists() {
        if let Err(e) = fs::remove_file(&temp_path) {
            tracing::warn!(
                "Could not remove stale temporary file {}: {}",
                temp_path.display(),
                e
            );
        }
    }

    debug!("Downloading {} to {}", url, temp_path.display());
    let client = build_http_client()?;
    let mut response = client.get(url).send().map_err(|e| {
        debug!("HTTP request failed for {url}: {e}");
        ToprefixError::Download {
            package: package.to_string(),
            url: url.to_string(),
            reason: format!("request failed: {e}"),
        }
    })?;

    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);
    if !status.is_success() {
        let reason = match status {
            StatusCode::NOT_FOUND => "Resource not found (404)".to_string(),
            StatusCode::FORBIDDEN => "Access forbidden (403)".to_string(),
            _ => {
                let body_text = response
                    .text()
                    .unwrap_or_else(|_| "Failed to read response body".to_string());
                format!("HTTP error {status}: {body_text}")
            }
        };
        tracing::error!("HTTP error {} for URL {}", status, url);
        return Err(ToprefixError::Download {
            package: package.to_string(),
            url: url.to_string(),
            reason,
        });
    }

    // Content-Length may be absent; progress is indeterminate then.
    let total = response.content_length();
    let pb = download_bar(total);

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut temp_file = File::create(&temp_path)?;
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = response.read(&mut buf).map_err(|e| ToprefixError::Download {
            package: package.to_string(),
            url: url.to_string(),
            reason: format!("transfer interrupted: {e}"),
        })?;
        if n == 0 {
            break;
        }
        temp_file.write_all(&buf[..n])?;
        pb.inc(n as u64);
    }
    temp_file.flush()?;
    drop(temp_file);
    pb.finish_and_clear();

    fs::rename(&temp_path, dest)?;
    debug!("Moved finished download to {}", dest.display());
    Ok(dest.to_path_buf())
}

fn build_http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, USER_AGENT_STRING.parse().unwrap());
    headers.insert(ACCEPT, "*/*".parse().unwrap());
    Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| {
            ToprefixError::Config(format!("Failed to build HTTP client: {e}"))
        })
}

fn download_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(len) if len > 0 => {
            let pb = ProgressBar::new(len);
            pb.set_style(
                ProgressStyle::with_template(
                    "{bytes:>10} / {total_bytes:<10} [{bar:30.cyan/dim}] {bytes_per_sec}",
                )
                .unwrap()
                .progress_chars("━░"),
            );
            pb
        }
        _ => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner:.blue.bold} {bytes} downloaded").unwrap(),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_writes_dest_and_removes_temp_file() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/glib-2.75.0.tar.xz")
            .with_status(200)
            .with_body(b"not really a tarball")
            .create();

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("glib-2.75.0.tar.xz");
        let url = format!("{}/glib-2.75.0.tar.xz", server.url());

        let out = download("glib", &url, &dest).unwrap();
        mock.assert();
        assert_eq!(out, dest);
        assert_eq!(fs::read(&dest).unwrap(), b"not really a tarball");
        assert!(!dir.path().join(".glib-2.75.0.tar.xz.download").exists());
    }

    #[test]
    fn missing_resource_maps_to_download_error() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/gone.tar.gz")
            .with_status(404)
            .create();

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("gone.tar.gz");
        let url = format!("{}/gone.tar.gz", server.url());

        let err = download("gone", &url, &dest).unwrap_err();
        match err {
            ToprefixError::Download { package, reason, .. } => {
                assert_eq!(package, "gone");
                assert!(reason.contains("404"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!dest.exists());
    }

    #[test]
    fn overwrites_a_stale_temp_file() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/tool.zip")
            .with_status(200)
            .with_body(b"fresh bytes")
            .create();

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tool.zip");
        fs::write(dir.path().join(".tool.zip.download"), b"half finished").unwrap();
        let url = format!("{}/tool.zip", server.url());

        download("tool", &url, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"fresh bytes");
        assert!(!dir.path().join(".tool.zip.download").exists());
    }
}
