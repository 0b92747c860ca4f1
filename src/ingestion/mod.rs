//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest_sources`] (from [`unified`]) which:
//!
//! - enumerates directories, bundles and `@manifest` sources
//! - flattens every file and merges it into an [`crate::aggregation::Aggregator`]
//! - optionally reports additions/rejections/alerts to an [`IngestionObserver`]
//!
//! Source-specific functions are also available under:
//! - [`cache`]
//! - [`bundle`]
//! - [`manifest`]
//! - [`walk`]

pub mod bundle;
pub mod cache;
pub mod manifest;
pub mod observability;
pub mod unified;
pub mod walk;

pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    StdErrObserver,
};
pub use unified::{ingest_sources, IngestionOptions, IngestionSummary, Source};
pub use walk::{walk_cache_files, WalkOptions};
