//! Per-file cache documents.
//!
//! A cache file holds the combined plugin output for one data file as a single JSON object. Its
//! row name in the table is its path with the extension removed, so `run1/a.fastq.json` is the
//! row `run1/a.fastq`.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{IngestionError, IngestionResult};

/// Extensions recognized as cache files when none are configured.
pub const DEFAULT_CACHE_EXTENSIONS: &[&str] = &["bdqc", "qc", "json"];

/// Whether `path` ends in one of `extensions` (without the leading dot, case-sensitive).
pub fn has_cache_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| x.as_ref() == ext))
}

/// Row name for a cache file: its path without the final extension.
pub fn row_name(path: &Path) -> String {
    path.with_extension("").to_string_lossy().into_owned()
}

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> IngestionResult<Value> {
    let text = fs::read_to_string(path).map_err(|source| IngestionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| IngestionError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load one cache file, returning its row name and document.
pub fn load_cache_file<S: AsRef<str>>(
    path: impl AsRef<Path>,
    extensions: &[S],
) -> IngestionResult<(String, Value)> {
    let path = path.as_ref();
    if !has_cache_extension(path, extensions) {
        return Err(IngestionError::UnexpectedExtension {
            path: path.to_path_buf(),
            expected: extensions.iter().map(|e| e.as_ref().to_string()).collect(),
        });
    }
    let document = read_json(path)?;
    Ok((row_name(path), document))
}

#[cfg(test)]
mod tests {
    use super::{has_cache_extension, row_name, DEFAULT_CACHE_EXTENSIONS};
    use std::path::Path;

    #[test]
    fn recognizes_default_extensions() {
        assert!(has_cache_extension(Path::new("a/b.json"), DEFAULT_CACHE_EXTENSIONS));
        assert!(has_cache_extension(Path::new("a/b.fastq.qc"), DEFAULT_CACHE_EXTENSIONS));
        assert!(has_cache_extension(Path::new("a/b.fastq.bdqc"), DEFAULT_CACHE_EXTENSIONS));
        assert!(!has_cache_extension(Path::new("a/b.fastq"), DEFAULT_CACHE_EXTENSIONS));
        assert!(!has_cache_extension(Path::new("a/noext"), DEFAULT_CACHE_EXTENSIONS));
    }

    #[test]
    fn row_name_drops_only_the_last_extension() {
        assert_eq!(row_name(Path::new("run1/a.fastq.json")), "run1/a.fastq");
    }
}
