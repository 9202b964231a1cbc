//! Output formatting and persistence for published views.
//!
//! View files are written whole: the JSON goes to a temporary file in the
//! target directory and is renamed over the destination once complete.

use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{MrvError, Result};

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl std::fmt::Debug) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Serializes `value` as compact JSON to `dir/file_name`, replacing any
/// previous file atomically. Returns the final path.
pub fn write_json(dir: &Path, file_name: &str, value: &impl Serialize) -> Result<PathBuf> {
    let body = serde_json::to_vec(value)?;
    write_atomic(dir, file_name, &body)
}

/// Writes `body` to `dir/file_name` through a temporary file and a rename.
pub fn write_atomic(dir: &Path, file_name: &str, body: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    debug!(path = %path.display(), bytes = body.len(), "Writing file");

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(body)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&path).map_err(|e| MrvError::Io(e.error))?;

    info!(path = %path.display(), "File written");
    Ok(path)
}
