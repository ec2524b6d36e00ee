//! Artifact download with staged writes.
//!
//! Bytes are streamed to a `.part` file next to the destination and only
//! renamed into the final artifact slot once the stream has completed. A
//! failed or interrupted download therefore never leaves a partial file
//! where the symlink step could pick it up.

use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::http::HttpClient;
use crate::runtime::Runtime;

/// Staging path for a destination: `<dest>.part`.
fn staging_path(dest: &Path) -> Result<PathBuf> {
    let file_name = dest
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Artifact path {:?} has no file name", dest))?;
    Ok(dest.with_file_name(format!("{}.part", file_name.to_string_lossy())))
}

/// Downloads `url` into `dest`, creating parent directories as needed.
///
/// Returns the number of bytes written. On failure the staging file is
/// removed and `dest` is left untouched.
#[tracing::instrument(skip(runtime, http))]
pub async fn fetch_artifact<R: Runtime>(
    runtime: &R,
    http: &HttpClient,
    url: &str,
    dest: &Path,
) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        runtime
            .create_dir_all(parent)
            .with_context(|| format!("Failed to create package directory {:?}", parent))?;
    }

    let staging = staging_path(dest)?;
    info!("Downloading {} to {:?}...", url, staging);

    let result = http
        .download(url, || {
            runtime
                .create_file(&staging)
                .with_context(|| format!("Failed to create staging file at {:?}", staging))
        })
        .await;

    match result {
        Ok(bytes) => {
            runtime
                .rename(&staging, dest)
                .with_context(|| format!("Failed to move downloaded artifact into {:?}", dest))?;
            info!("Download complete ({} bytes).", bytes);
            Ok(bytes)
        }
        Err(e) => {
            if runtime.exists(&staging) {
                debug!("Removing staging file {:?} after failed download", staging);
                if let Err(cleanup) = runtime.remove_file(&staging) {
                    debug!("Failed to remove staging file: {:#}", cleanup);
                }
            }
            Err(e).with_context(|| format!("Failed to download {}", url))
        }
    }
}
