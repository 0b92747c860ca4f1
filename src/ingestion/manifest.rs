//! Manifests: text files listing sources, one per line.
//!
//! Blank lines and lines starting with `#` are ignored. Relative entries are resolved against the
//! directory containing the manifest.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IngestionError, IngestionResult};

/// Read a manifest and return the listed paths.
pub fn read_manifest(path: impl AsRef<Path>) -> IngestionResult<Vec<PathBuf>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| IngestionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(parse_manifest(&text, base))
}

/// Parse manifest text, resolving relative entries against `base`.
pub fn parse_manifest(text: &str, base: &Path) -> Vec<PathBuf> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let entry = Path::new(line);
            if entry.is_absolute() {
                entry.to_path_buf()
            } else {
                base.join(entry)
            }
        })
        .collect()
}
