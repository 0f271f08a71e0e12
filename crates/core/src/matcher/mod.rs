//! Matcher service.
//!
//! The entry point the display layer talks to: rebuild or clear the cached
//! catalog, replace the reference photo, tune the white threshold, run a
//! ranking and page over the last one.

mod service;
mod types;

pub use service::YarnMatcher;
pub use types::{MatcherError, RankingSnapshot};
