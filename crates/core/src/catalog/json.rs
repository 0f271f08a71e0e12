//! JSON-file-backed catalog store.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{Catalog, CatalogError, CatalogStore, InvalidationReport};

/// Catalog persisted as one pretty-printed JSON file, next to a directory of
/// cached listing photos.
pub struct JsonCatalogStore {
    catalog_path: PathBuf,
    image_dir: PathBuf,
}

impl JsonCatalogStore {
    /// Create a store; nothing is touched on disk until the first save.
    pub fn new(catalog_path: impl Into<PathBuf>, image_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            image_dir: image_dir.into(),
        }
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    fn io_error(path: &Path, source: std::io::Error) -> CatalogError {
        CatalogError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Removes everything inside the image directory, one entry at a time.
    fn clear_images(&self, report: &mut InvalidationReport) {
        let entries = match fs::read_dir(&self.image_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return,
            Err(e) => {
                warn!(dir = %self.image_dir.display(), error = %e, "Cannot list image cache");
                report.failures.push(self.image_dir.display().to_string());
                return;
            }
        };

        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!(error = %e, "Cannot read image cache entry");
                    continue;
                }
            };

            let result = match fs::symlink_metadata(&path) {
                Ok(meta) if meta.is_dir() => fs::remove_dir_all(&path),
                Ok(_) => fs::remove_file(&path),
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => report.images_removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to delete cached image");
                    report.failures.push(path.display().to_string());
                }
            }
        }
    }
}

impl CatalogStore for JsonCatalogStore {
    fn save(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        let bytes = serde_json::to_vec_pretty(catalog)
            .map_err(|e| CatalogError::Serialization(e.to_string()))?;

        let dir = match self.catalog_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| Self::io_error(&dir, e))?;

        // Write next to the target, then rename over it.
        let tmp_path = dir.join(format!(".catalog-{}.tmp", uuid::Uuid::new_v4()));
        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp_path);
            return Err(Self::io_error(&tmp_path, e));
        }
        if let Err(e) = fs::rename(&tmp_path, &self.catalog_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(Self::io_error(&self.catalog_path, e));
        }

        info!(
            path = %self.catalog_path.display(),
            entries = catalog.len(),
            "Catalog saved"
        );
        Ok(())
    }

    fn load(&self) -> Result<Catalog, CatalogError> {
        let bytes = match fs::read(&self.catalog_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(CatalogError::NotFound),
            Err(e) => return Err(Self::io_error(&self.catalog_path, e)),
        };

        let catalog: Catalog = serde_json::from_slice(&bytes)
            .map_err(|e| CatalogError::Serialization(e.to_string()))?;
        debug!(entries = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    fn exists(&self) -> bool {
        self.catalog_path.is_file()
    }

    fn invalidate(&self) -> Result<InvalidationReport, CatalogError> {
        let mut report = InvalidationReport::default();

        self.clear_images(&mut report);

        match fs::remove_file(&self.catalog_path) {
            Ok(()) => report.catalog_removed = true,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Self::io_error(&self.catalog_path, e)),
        }

        info!(
            catalog_removed = report.catalog_removed,
            images_removed = report.images_removed,
            failures = report.failures.len(),
            "Cache invalidated"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonCatalogStore {
        JsonCatalogStore::new(dir.path().join("catalog.json"), dir.path().join("images"))
    }

    fn sample_catalog() -> Catalog {
        vec![
            CatalogEntry::new(
                "https://shop.test/yarn/merino-teal",
                "Merino Teal",
                Some("https://cdn.shop.test/merino-teal.jpg".to_string()),
            ),
            CatalogEntry::new("https://shop.test/yarn/alpaca-grey", "Alpaca \"Grey\"", None),
            CatalogEntry::new(
                "https://shop.test/yarn/cotton-ochre",
                "Cotton Ochre ünïcode",
                Some("/img/ochre.png".to_string()),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_load_before_save_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(!store.exists());
        assert!(matches!(store.load(), Err(CatalogError::NotFound)));
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let catalog = sample_catalog();

        store.save(&catalog).unwrap();
        assert!(store.exists());
        assert_eq!(store.load().unwrap(), catalog);
    }

    #[test]
    fn test_round_trip_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save(&Catalog::new()).unwrap();
        let loaded = store.load().unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded, Catalog::new());
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save(&sample_catalog()).unwrap();
        let first = fs::read(store.catalog_path()).unwrap();

        let loaded = store.load().unwrap();
        store.save(&loaded).unwrap();
        let second = fs::read(store.catalog_path()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_save_overwrites_previous_catalog() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save(&sample_catalog()).unwrap();
        let replacement: Catalog =
            vec![CatalogEntry::new("https://shop.test/yarn/solo", "Solo", None)]
                .into_iter()
                .collect();
        store.save(&replacement).unwrap();

        assert_eq!(store.load().unwrap(), replacement);
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&sample_catalog()).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["catalog.json".to_string()]);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = JsonCatalogStore::new(
            dir.path().join("nested/deeper/catalog.json"),
            dir.path().join("images"),
        );
        store.save(&sample_catalog()).unwrap();
        assert!(store.exists());
    }

    #[test]
    fn test_invalidate_then_load_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&sample_catalog()).unwrap();

        let report = store.invalidate().unwrap();
        assert!(report.catalog_removed);
        assert!(matches!(store.load(), Err(CatalogError::NotFound)));
    }

    #[test]
    fn test_invalidate_when_nothing_exists_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let report = store.invalidate().unwrap();
        assert_eq!(report, InvalidationReport::default());
        // Twice in a row is fine too.
        assert!(store.invalidate().is_ok());
    }

    #[test]
    fn test_invalidate_removes_cached_images() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let images = store.image_dir().to_path_buf();
        fs::create_dir_all(images.join("nested")).unwrap();
        fs::write(images.join("a.jpg"), b"a").unwrap();
        fs::write(images.join("b.jpg"), b"b").unwrap();
        fs::write(images.join("nested/c.jpg"), b"c").unwrap();

        let report = store.invalidate().unwrap();
        assert_eq!(report.images_removed, 3);
        assert!(report.failures.is_empty());
        assert!(!report.catalog_removed);
        assert_eq!(fs::read_dir(&images).unwrap().count(), 0);
    }

    #[test]
    fn test_load_corrupt_catalog_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.catalog_path(), b"{not json").unwrap();
        assert!(matches!(
            store.load(),
            Err(CatalogError::Serialization(_))
        ));
    }
}
