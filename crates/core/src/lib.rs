pub mod catalog;
pub mod color;
pub mod config;
pub mod crawler;
pub mod fetcher;
pub mod matcher;
pub mod ranking;
pub mod reference;
pub mod renderer;
pub mod testing;

pub use catalog::{
    Catalog, CatalogEntry, CatalogError, CatalogStats, CatalogStore, InvalidationReport,
    JsonCatalogStore,
};
pub use color::{distance, ColorError, DominantColorExtractor, RgbColor, WhiteThreshold};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use crawler::{CatalogCrawler, CatalogSource, CrawlError, CrawlOutcome, CrawlReport, LotFilter};
pub use fetcher::{FetchError, HttpImageFetcher, ImageFetcher};
pub use matcher::{MatcherError, RankingSnapshot, YarnMatcher};
pub use ranking::{paginate, Page, PageCursor, SimilarityRanker, SimilarityResult};
pub use reference::{ReferenceError, ReferenceImage};
pub use renderer::{HttpRenderer, PageRenderer, RenderError, RenderedPage, RendererPool};
