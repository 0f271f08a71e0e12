//! Listing catalog and its persistent cache.
//!
//! The catalog is built in one piece by a crawl, saved atomically, read back
//! in full for ranking and cleared in full by invalidation.

mod json;
mod types;

pub use json::JsonCatalogStore;
pub use types::*;

/// Outcome of [`CatalogStore::invalidate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct InvalidationReport {
    /// Whether a saved catalog existed and was removed.
    pub catalog_removed: bool,
    /// Cached image files or directories removed.
    pub images_removed: usize,
    /// Cached image paths that could not be removed.
    pub failures: Vec<String>,
}

/// Trait for catalog storage.
pub trait CatalogStore: Send + Sync {
    /// Persist the full catalog, replacing any previous one.
    ///
    /// Readers never observe a partially written catalog.
    fn save(&self, catalog: &Catalog) -> Result<(), CatalogError>;

    /// Load the saved catalog.
    ///
    /// Returns `CatalogError::NotFound` when nothing has been saved.
    fn load(&self) -> Result<Catalog, CatalogError>;

    /// Check whether a catalog has been saved.
    fn exists(&self) -> bool;

    /// Delete the saved catalog and every cached image.
    ///
    /// Safe to call when nothing exists. A failure to delete one image is
    /// recorded and the remaining files are still processed.
    fn invalidate(&self) -> Result<InvalidationReport, CatalogError>;
}
