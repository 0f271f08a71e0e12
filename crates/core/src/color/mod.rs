//! Dominant color extraction.
//!
//! A photo's dominant color is the most frequent exact RGB triple among its
//! pixels once white-like pixels (every channel at or above the white
//! threshold) are discarded. Decoding is delegated to the `image` crate and
//! the decoded buffer never outlives the extraction call.

mod error;
mod extractor;
mod rgb;

pub use error::ColorError;
pub use extractor::{DominantColorExtractor, WhiteThreshold, DEFAULT_WHITE_THRESHOLD};
pub use rgb::{distance, RgbColor};
