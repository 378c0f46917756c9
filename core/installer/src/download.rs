//! Artifact download.
//!
//! Streams the response body to a temporary sibling file and renames it over the
//! destination on success, so a failed transfer never leaves a truncated archive
//! at the fixed path. There is no retry and no overall timeout here: artifacts
//! can be large, and retrying is the caller's decision.

use std::path::Path;
use std::time::Instant;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::{IoContext, SdkError};
use crate::report::Reporter;

/// Minimum interval between progress updates in milliseconds.
const PROGRESS_INTERVAL_MS: u128 = 250;

/// Downloads `url` to `dest` through `partial`, reporting progress.
///
/// Any previous file at `dest` is replaced. Returns the number of bytes written.
///
/// # Errors
///
/// Returns [`SdkError::Transport`] if the request or the body stream fails,
/// [`SdkError::Http`] for a non-success status, and [`SdkError::Io`] if the
/// file cannot be written or renamed.
pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    partial: &Path,
    reporter: &dyn Reporter,
) -> Result<u64, SdkError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .io_context("Failed to create directory", parent)?;
    }

    match stream_to_file(client, url, partial, reporter).await {
        Ok(written) => {
            tokio::fs::rename(partial, dest)
                .await
                .io_context("Failed to move download into place", dest)?;
            tracing::debug!(%url, bytes = written, "download complete");
            Ok(written)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(partial).await;
            Err(e)
        }
    }
}

async fn stream_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    reporter: &dyn Reporter,
) -> Result<u64, SdkError> {
    let transport = |e: reqwest::Error| SdkError::Transport {
        url: url.to_string(),
        source: e,
    };

    let response = client.get(url).send().await.map_err(transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(SdkError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let total = response.content_length().unwrap_or(0);

    let mut file = tokio::fs::File::create(dest)
        .await
        .io_context("Failed to create file", dest)?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let start_time = Instant::now();
    let mut last_update = Instant::now();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(transport)?;
        file.write_all(&chunk)
            .await
            .io_context("Failed to write", dest)?;
        downloaded += chunk.len() as u64;

        let now = Instant::now();
        if now.duration_since(last_update).as_millis() >= PROGRESS_INTERVAL_MS {
            reporter.download_progress(downloaded, total, start_time.elapsed().as_secs_f64());
            last_update = now;
        }
    }

    file.flush()
        .await
        .io_context("Failed to flush", dest)?;

    reporter.download_finished(downloaded, total, start_time.elapsed().as_secs_f64());
    Ok(downloaded)
}
