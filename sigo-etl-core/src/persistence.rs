//! Atomic file writes for the pipeline outputs.
//!
//! Each file is written to a `.tmp` sibling and renamed into place, so a reader
//! never sees a half-written table. A run that writes several files is still
//! not transactional across them.

use std::io;
use std::path::{Path, PathBuf};

/// Atomically write pretty-printed JSON to a file.
///
/// Creates parent directories if they don't exist.
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let mut json = serde_json::to_string_pretty(data).map_err(io::Error::other)?;
    json.push('\n');
    atomic_write(path, json.as_bytes())
}

/// Atomically write raw bytes to a file.
///
/// Creates parent directories if they don't exist.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = tmp_path(path);
    if let Err(e) = std::fs::write(&tmp, data).and_then(|()| std::fs::rename(&tmp, path)) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

/// `dim_categoria.csv` -> `dim_categoria.csv.tmp`
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
