//! The user-supplied reference photo.

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::color::{ColorError, DominantColorExtractor, RgbColor};

/// Errors for reference photo operations.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("No reference color available; upload a reference image first")]
    NotFound,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Color(#[from] ColorError),
}

impl ReferenceError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The single reference photo rankings are measured against.
///
/// Stored at a fixed path and replaced whole; readers see either the old
/// or the new photo.
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    path: PathBuf,
}

impl ReferenceImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replaces the reference with an encoded image.
    ///
    /// Bytes that do not decode are rejected and the current reference is
    /// kept. Returns the new reference color, `None` when every pixel is
    /// white-like under `extractor`.
    pub fn replace(
        &self,
        bytes: &[u8],
        extractor: &DominantColorExtractor,
    ) -> Result<Option<RgbColor>, ReferenceError> {
        let color = match extractor.extract_from_bytes(bytes) {
            Ok(color) => Some(color),
            // Decodable but all white: still a valid photo to keep.
            Err(ColorError::NoDominantColor) => None,
            Err(e) => return Err(e.into()),
        };

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| ReferenceError::io(dir, e))?;

        let temp_path = dir.join(format!(".reference-{}.tmp", uuid::Uuid::new_v4()));
        let written = std::fs::File::create(&temp_path)
            .and_then(|mut file| {
                file.write_all(bytes)?;
                file.sync_all()
            })
            .and_then(|()| std::fs::rename(&temp_path, &self.path));

        if let Err(e) = written {
            let _ = std::fs::remove_file(&temp_path);
            return Err(ReferenceError::io(&self.path, e));
        }

        info!(path = %self.path.display(), bytes = bytes.len(), "Reference image replaced");
        Ok(color)
    }

    /// Replaces the reference with a copy of a local image file.
    pub fn replace_from_file(
        &self,
        source: &Path,
        extractor: &DominantColorExtractor,
    ) -> Result<Option<RgbColor>, ReferenceError> {
        let bytes = std::fs::read(source).map_err(|e| ReferenceError::io(source, e))?;
        self.replace(&bytes, extractor)
    }

    /// Dominant color of the stored reference.
    pub fn color(&self, extractor: &DominantColorExtractor) -> Result<RgbColor, ReferenceError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReferenceError::NotFound)
            }
            Err(e) => return Err(ReferenceError::io(&self.path, e)),
        };
        let color = extractor.extract_from_bytes(&bytes)?;
        debug!(color = %color, "Reference color extracted");
        Ok(color)
    }
}
