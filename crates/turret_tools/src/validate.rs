//! Data validation utilities.

use std::path::Path;

use tracing::{debug, info};

use turret_core::data::TierTable;
use turret_core::error::{Result, TurretError};

/// Validate all RON tier tables in a directory.
///
/// Every `.ron` file in `path` (non-recursive) is parsed as a
/// [`TierTable`] and validated. Returns the number of files checked.
///
/// # Errors
///
/// Returns [`TurretError::DataParseError`] for the first unreadable,
/// unparsable, or invalid file, or when the directory itself cannot
/// be read.
pub fn validate_data_directory(path: &Path) -> Result<u32> {
    let entries = std::fs::read_dir(path).map_err(|e| TurretError::DataParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut checked = 0u32;
    let mut files: Vec<_> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    files.sort();

    for file in files {
        let display_path = file.display().to_string();
        let source = std::fs::read_to_string(&file).map_err(|e| TurretError::DataParseError {
            path: display_path.clone(),
            message: e.to_string(),
        })?;

        let table = TierTable::load_from_str(&source, &display_path)?;
        debug!(file = %display_path, tiers = table.tiers.len(), "validated");
        checked += 1;
    }

    info!(files = checked, "data validation passed");
    Ok(checked)
}
