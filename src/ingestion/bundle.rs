//! Pre-aggregated bundles: one JSON object mapping filenames to their documents.

use std::path::Path;

use serde_json::Value;

use crate::error::{IngestionError, IngestionResult};

use super::cache::read_json;

/// Load a bundle file. Entries are returned in file order.
pub fn load_bundle(path: impl AsRef<Path>) -> IngestionResult<Vec<(String, Value)>> {
    let path = path.as_ref();
    bundle_entries(path, read_json(path)?)
}

/// Split an already parsed bundle into `(filename, document)` entries.
pub fn bundle_entries(path: &Path, bundle: Value) -> IngestionResult<Vec<(String, Value)>> {
    match bundle {
        Value::Object(entries) => Ok(entries.into_iter().collect()),
        _ => Err(IngestionError::InvalidBundle {
            path: path.to_path_buf(),
        }),
    }
}
