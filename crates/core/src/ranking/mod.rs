//! Similarity ranking.
//!
//! Each catalog entry with a photo is fetched, reduced to its dominant color
//! and scored by Euclidean RGB distance to the reference color. Entries whose
//! photo cannot be fetched, decoded or reduced are left out of the result.

mod pagination;
mod ranker;
mod types;

pub use pagination::{paginate, Page, PageCursor};
pub use ranker::SimilarityRanker;
pub use types::*;
