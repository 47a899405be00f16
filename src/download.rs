// Download engine: streams an HTTP body to disk

use crate::http;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Size of the pieces written to disk between progress callbacks.
pub const CHUNK_SIZE: usize = 32 * 1024;

/// Download `url` to `dest`, returning the number of bytes written.
pub async fn download(url: &str, dest: &Path) -> Result<u64> {
    fetch_to_file(url, dest, None).await
}

/// Download `url` to `dest`, calling `on_progress(downloaded, total)` after
/// every chunk.
///
/// Progress is only reported when the server announces a content length;
/// without one the body is copied in bulk and the callback never fires.
pub async fn download_with_progress<F>(url: &str, dest: &Path, mut on_progress: F) -> Result<u64>
where
    F: FnMut(u64, u64) + Send,
{
    fetch_to_file(url, dest, Some(&mut on_progress)).await
}

async fn fetch_to_file(
    url: &str,
    dest: &Path,
    on_progress: Option<&mut (dyn FnMut(u64, u64) + Send)>,
) -> Result<u64> {
    let mut response = http::download_client()
        .get(url)
        .send()
        .await
        .with_context(|| format!("Download failed: {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed: {} ({})", url, response.status());
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let file = File::create(dest)
        .await
        .with_context(|| format!("Failed to create {}", dest.display()))?;
    let mut out = BufWriter::with_capacity(CHUNK_SIZE, file);
    let total = response.content_length().filter(|len| *len > 0);
    let mut downloaded: u64 = 0;

    match (on_progress, total) {
        (Some(on_progress), Some(total)) => {
            while let Some(chunk) = response.chunk().await? {
                for piece in chunk.chunks(CHUNK_SIZE) {
                    out.write_all(piece).await?;
                    downloaded += piece.len() as u64;
                    on_progress(downloaded, total);
                }
            }
        }
        _ => {
            while let Some(chunk) = response.chunk().await? {
                out.write_all(&chunk).await?;
                downloaded += chunk.len() as u64;
            }
        }
    }

    out.flush().await?;
    log::debug!("Downloaded {} ({} bytes) to {}", url, downloaded, dest.display());
    Ok(downloaded)
}
