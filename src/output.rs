//! Common routines for writing output files.
use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Create a new output directory, if it doesn't already exist.
///
/// # Arguments
///
/// * `output_dir` - The directory to create
/// * `allow_overwrite` - Whether an existing, non-empty directory may be written into
///
/// # Returns
///
/// `true` if an existing, non-empty directory will be overwritten, otherwise `false`.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    // If the folder already exists, then check it is empty or we are allowed to overwrite it
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder {} already exists and is not empty. Use --overwrite to overwrite it.",
            output_dir.display()
        );
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Write a series of serialisable records to a CSV file, including a header row
pub fn write_csv<T, I>(file_path: &Path, records: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let write = || -> Result<()> {
        let mut writer = csv::Writer::from_path(file_path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    };

    write().with_context(|| format!("Error writing {}", file_path.display()))
}
