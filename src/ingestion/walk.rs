//! Directory recursion for cache files.

use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::error::IngestionResult;

use super::cache::{has_cache_extension, DEFAULT_CACHE_EXTENSIONS};

/// Options controlling which files a directory walk yields.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Number of directory levels below the root to descend into. `Some(0)` only looks at the
    /// root's own files; `None` is unbounded.
    pub max_depth: Option<usize>,
    /// Only paths matching this expression are yielded.
    pub include: Option<Regex>,
    /// Paths matching this expression are skipped.
    pub exclude: Option<Regex>,
    /// Cache file extensions, without the leading dot.
    pub extensions: Vec<String>,
    /// Follow symbolic links while walking.
    pub follow_links: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            include: None,
            exclude: None,
            extensions: DEFAULT_CACHE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            follow_links: false,
        }
    }
}

impl WalkOptions {
    /// Compile include/exclude patterns.
    ///
    /// Validating them here reports a bad expression before any directory is visited.
    pub fn with_patterns(mut self, include: Option<&str>, exclude: Option<&str>) -> IngestionResult<Self> {
        self.include = include.map(Regex::new).transpose()?;
        self.exclude = exclude.map(Regex::new).transpose()?;
        Ok(self)
    }

    /// Whether a file path passes the extension and pattern filters.
    pub fn accepts(&self, path: &Path) -> bool {
        if !has_cache_extension(path, &self.extensions) {
            return false;
        }
        let text = path.to_string_lossy();
        if let Some(re) = &self.include {
            if !re.is_match(&text) {
                return false;
            }
        }
        if let Some(re) = &self.exclude {
            if re.is_match(&text) {
                return false;
            }
        }
        true
    }
}

/// Collect the cache files under `root`, sorted by path so row order is reproducible.
///
/// # Errors
///
/// The first traversal error (unreadable directory, broken link when following links) aborts
/// the walk.
pub fn walk_cache_files(root: impl AsRef<Path>, options: &WalkOptions) -> IngestionResult<Vec<PathBuf>> {
    let mut walker = WalkDir::new(root).follow_links(options.follow_links);
    if let Some(depth) = options.max_depth {
        walker = walker.max_depth(depth.saturating_add(1));
    }

    let mut paths = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && options.accepts(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}
