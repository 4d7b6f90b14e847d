//! HTTP fetch layer for patch and source downloads.

use crate::error::DownloadError;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};

/// Download one URL to a file.
pub async fn fetch(url: &str, dest: &Path) -> Result<(), DownloadError> {
    log::debug!("[Download] Fetching: {}", url);

    let response = reqwest::get(url)
        .await
        .map_err(|e| DownloadError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::BadStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| DownloadError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    tokio::fs::write(dest, &body)
        .await
        .map_err(|e| DownloadError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;

    log::info!("Downloaded {} ({} bytes)", dest.display(), body.len());
    Ok(())
}

/// Download a set of (url, destination) jobs concurrently.
///
/// Fan-out is bounded by the CPU count; the first failure aborts the set.
pub async fn fetch_all(jobs: &[(String, PathBuf)]) -> Result<(), DownloadError> {
    stream::iter(jobs.iter().map(|(url, dest)| fetch(url, dest)))
        .buffer_unordered(num_cpus::get())
        .try_collect::<Vec<()>>()
        .await?;
    Ok(())
}
