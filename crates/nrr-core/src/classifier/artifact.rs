//! Locating and fetching the classifier weights.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{NrrError, Result};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

fn load_error(context: &str, e: impl std::fmt::Display) -> NrrError {
    NrrError::ModelLoad(format!("{context}: {e}"))
}

/// Makes sure the weights exist at `path`, downloading them from `url` if not.
///
/// The download lands in a sibling `.part` file and is renamed into place
/// only once complete, so an interrupted fetch never leaves a truncated
/// artifact behind.
///
/// # Errors
///
/// Returns `NrrError::ModelLoad` if the file is missing and the download
/// fails, or the bytes cannot be written.
pub fn ensure_artifact(path: &Path, url: &str) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    warn!(path = %path.display(), url, "classifier weights not found, downloading");
    let bytes = download(url)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| load_error("failed to create weights directory", e))?;
    }

    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    std::fs::write(&partial, &bytes).map_err(|e| load_error("failed to write weights", e))?;
    std::fs::rename(&partial, path).map_err(|e| {
        let _ = std::fs::remove_file(&partial);
        load_error("failed to move weights into place", e)
    })?;

    info!(path = %path.display(), bytes = bytes.len(), "classifier weights downloaded");
    Ok(path.to_path_buf())
}

fn download(url: &str) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| load_error("failed to build http client", e))?;

    let response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|e| load_error(&format!("failed to download {url}"), e))?;

    let bytes = response
        .bytes()
        .map_err(|e| load_error(&format!("failed to read body from {url}"), e))?;
    if bytes.is_empty() {
        return Err(NrrError::ModelLoad(format!("empty response from {url}")));
    }
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_file_is_used_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.safetensors");
        std::fs::write(&path, b"stub").unwrap();

        // Unroutable URL: reaching the network would fail the test.
        let resolved = ensure_artifact(&path, "http://127.0.0.1:9/never").unwrap();
        assert_eq!(resolved, path);
    }

    #[test]
    fn failed_download_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.pt");

        let err = ensure_artifact(&path, "http://127.0.0.1:9/never").unwrap_err();
        assert!(matches!(err, NrrError::ModelLoad(_)));
        assert!(!path.exists());
    }
}
