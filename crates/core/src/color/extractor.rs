//! Most-frequent non-white color of a pixel buffer.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ColorError;
use super::rgb::RgbColor;

/// Default per-channel lower bound for white-like pixels.
pub const DEFAULT_WHITE_THRESHOLD: u8 = 200;

/// A validated white threshold.
///
/// A pixel is white-like when every channel is `>=` the threshold, so a
/// threshold of 200 discards near-white pixels and keeps near-black ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct WhiteThreshold(u8);

impl WhiteThreshold {
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for WhiteThreshold {
    fn default() -> Self {
        Self(DEFAULT_WHITE_THRESHOLD)
    }
}

impl TryFrom<i64> for WhiteThreshold {
    type Error = ColorError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map(Self)
            .map_err(|_| ColorError::InvalidThreshold(value))
    }
}

impl From<WhiteThreshold> for i64 {
    fn from(threshold: WhiteThreshold) -> Self {
        i64::from(threshold.0)
    }
}

impl From<u8> for WhiteThreshold {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

/// Picks the dominant color of a photo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DominantColorExtractor {
    threshold: WhiteThreshold,
}

impl DominantColorExtractor {
    /// Creates an extractor, rejecting thresholds outside 0..=255.
    pub fn new(white_threshold: i64) -> Result<Self, ColorError> {
        Ok(Self {
            threshold: WhiteThreshold::try_from(white_threshold)?,
        })
    }

    pub fn with_threshold(threshold: WhiteThreshold) -> Self {
        Self { threshold }
    }

    pub fn white_threshold(&self) -> u8 {
        self.threshold.value()
    }

    /// Replaces the threshold. On error the current threshold is kept.
    pub fn set_white_threshold(&mut self, white_threshold: i64) -> Result<(), ColorError> {
        self.threshold = WhiteThreshold::try_from(white_threshold)?;
        Ok(())
    }

    /// Returns the most frequent non-white-like triple, `None` when every
    /// pixel is white-like. Equal counts resolve to the triple seen first.
    pub fn extract<I>(&self, pixels: I) -> Option<RgbColor>
    where
        I: IntoIterator<Item = RgbColor>,
    {
        let threshold = self.threshold.value();
        // color -> (count, index of first occurrence)
        let mut counts: HashMap<RgbColor, (u64, usize)> = HashMap::new();

        for (index, pixel) in pixels.into_iter().enumerate() {
            if pixel.is_white_like(threshold) {
                continue;
            }
            counts.entry(pixel).or_insert((0, index)).0 += 1;
        }

        counts
            .into_iter()
            .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
                count_a.cmp(count_b).then(first_b.cmp(first_a))
            })
            .map(|(color, _)| color)
    }

    /// Decodes an encoded image (JPEG, PNG, ...) and extracts its dominant color.
    pub fn extract_from_bytes(&self, bytes: &[u8]) -> Result<RgbColor, ColorError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| ColorError::Decode(e.to_string()))?
            .to_rgb8();
        debug!(
            width = decoded.width(),
            height = decoded.height(),
            threshold = self.threshold.value(),
            "Extracting dominant color"
        );

        self.extract(decoded.pixels().map(|p| RgbColor::from(p.0)))
            .ok_or(ColorError::NoDominantColor)
    }

    /// Reads, decodes and extracts the dominant color of an image file.
    pub fn extract_from_file(&self, path: &Path) -> Result<RgbColor, ColorError> {
        let bytes = std::fs::read(path).map_err(|source| ColorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.extract_from_bytes(&bytes)
    }
}
