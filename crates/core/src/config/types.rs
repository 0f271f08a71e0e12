use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Where the catalog, the working image cache and the reference photo live.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// Path of the persisted catalog file.
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("catalog.json")
    }

    /// Directory holding downloaded listing photos.
    pub fn image_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    /// Path of the user-supplied reference photo.
    pub fn reference_path(&self) -> PathBuf {
        self.data_dir.join("reference").join("reference.img")
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Catalog crawler configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlerConfig {
    /// Listing page URL; `{page}` is replaced with the 1-based page number.
    #[serde(default = "default_page_url_template")]
    pub page_url_template: String,
    /// Hard cap on page-count discovery (default: 100)
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Number of independent render sessions (default: 1)
    #[serde(default = "default_sessions")]
    pub sessions: usize,
    /// Per-navigation deadline in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// CSS selector of the container holding a page's listings.
    #[serde(default = "default_listing_selector")]
    pub listing_selector: String,
    /// CSS selector of listing anchors, relative to the container.
    #[serde(default = "default_listing_link_selector")]
    pub listing_link_selector: String,
    /// CSS selector of the product title on a detail page.
    #[serde(default = "default_title_selector")]
    pub title_selector: String,
    /// CSS selector of the primary product image on a detail page.
    #[serde(default = "default_image_selector")]
    pub image_selector: String,
    /// Words that mark a listing as a bundle or accessory.
    #[serde(default = "default_lot_vocabulary")]
    pub lot_vocabulary: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_url_template: default_page_url_template(),
            max_pages: default_max_pages(),
            sessions: default_sessions(),
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
            listing_selector: default_listing_selector(),
            listing_link_selector: default_listing_link_selector(),
            title_selector: default_title_selector(),
            image_selector: default_image_selector(),
            lot_vocabulary: default_lot_vocabulary(),
        }
    }
}

impl CrawlerConfig {
    /// Listing page URL for a 1-based page number.
    pub fn page_url(&self, page: u32) -> String {
        self.page_url_template.replace("{page}", &page.to_string())
    }
}

fn default_page_url_template() -> String {
    "https://www.iceyarns.net/yarn/page/{page}".to_string()
}

fn default_max_pages() -> u32 {
    100
}

fn default_sessions() -> usize {
    1
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("yarnhue/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_listing_selector() -> String {
    "#innerlist".to_string()
}

fn default_listing_link_selector() -> String {
    "li a".to_string()
}

fn default_title_selector() -> String {
    "#pdm .product-detail-title span".to_string()
}

fn default_image_selector() -> String {
    "ul.cloud_small > li:nth-child(2) > a > img".to_string()
}

fn default_lot_vocabulary() -> Vec<String> {
    ["Lot", "Shades", "Mixed", "Leftover", "Needle", "Hook"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Similarity ranking configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RankingConfig {
    /// Per-channel lower bound for white-like pixels, 0..=255 (default: 200)
    #[serde(default = "default_white_threshold")]
    pub white_threshold: i64,
    /// Maximum outstanding image downloads (default: 8)
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    /// Per-download deadline in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub fetch_timeout_secs: u64,
    /// Results per page served to the display layer (default: 9)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            white_threshold: default_white_threshold(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            fetch_timeout_secs: default_request_timeout(),
            page_size: default_page_size(),
        }
    }
}

fn default_white_threshold() -> i64 {
    200
}

fn default_max_concurrent_fetches() -> usize {
    8
}

fn default_page_size() -> usize {
    9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.crawler.max_pages, 100);
        assert_eq!(config.crawler.sessions, 1);
        assert_eq!(config.ranking.white_threshold, 200);
        assert_eq!(config.ranking.page_size, 9);
        assert_eq!(config.storage.data_dir.to_str().unwrap(), "data");
    }

    #[test]
    fn test_deserialize_custom_sections() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[storage]
data_dir = "/var/lib/yarnhue"

[crawler]
page_url_template = "https://shop.test/list?p={page}"
max_pages = 5
sessions = 3
lot_vocabulary = ["Bundle"]

[ranking]
white_threshold = 180
max_concurrent_fetches = 2
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.crawler.max_pages, 5);
        assert_eq!(config.crawler.sessions, 3);
        assert_eq!(config.crawler.lot_vocabulary, vec!["Bundle".to_string()]);
        assert_eq!(config.crawler.listing_selector, "#innerlist");
        assert_eq!(config.ranking.white_threshold, 180);
        assert_eq!(config.ranking.max_concurrent_fetches, 2);
        assert_eq!(config.ranking.fetch_timeout_secs, 30);
        assert_eq!(
            config.storage.catalog_path(),
            PathBuf::from("/var/lib/yarnhue/catalog.json")
        );
    }

    #[test]
    fn test_page_url_substitution() {
        let crawler = CrawlerConfig {
            page_url_template: "https://shop.test/yarn/page/{page}".to_string(),
            ..CrawlerConfig::default()
        };
        assert_eq!(crawler.page_url(7), "https://shop.test/yarn/page/7");
    }

    #[test]
    fn test_storage_paths() {
        let storage = StorageConfig {
            data_dir: PathBuf::from("/tmp/hue"),
        };
        assert_eq!(storage.image_dir(), PathBuf::from("/tmp/hue/images"));
        assert_eq!(
            storage.reference_path(),
            PathBuf::from("/tmp/hue/reference/reference.img")
        );
    }
}
