//! Download of external datasets which are cached locally.
use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Make sure there is a local copy of a remote file at `file_path`.
///
/// If the file is already present it is used as is. Otherwise it is downloaded from `url`. There
/// are no retries: a failed download is an error.
///
/// # Arguments
///
/// * `file_path` - Where the local copy lives
/// * `url` - Where to download the file from, if known
pub fn ensure_cached(file_path: &Path, url: Option<&str>) -> Result<()> {
    if file_path.is_file() {
        debug!("Using cached copy of {}", file_path.display());
        return Ok(());
    }

    let url = url.with_context(|| {
        format!(
            "{} not found and no URL was given to download it from",
            file_path.display()
        )
    })?;
    info!("{} not found. Downloading from {url}", file_path.display());

    let bytes = download(url).with_context(|| format!("Failed to download {url}"))?;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, &bytes)
        .with_context(|| format!("Could not write {}", file_path.display()))?;
    info!("Saved {} bytes to {}", bytes.len(), file_path.display());

    Ok(())
}

fn download(url: &str) -> Result<Vec<u8>> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    Ok(response.bytes()?.to_vec())
}
