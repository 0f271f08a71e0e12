//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! over a matcher whose crawler and image fetcher are scripted, so the API
//! can be exercised without a live shop.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use yarnhue_core::{
    config::{CrawlerConfig, RankingConfig, StorageConfig},
    testing::{MockImageFetcher, ScriptedRenderer},
    CatalogCrawler, Config, ImageFetcher, JsonCatalogStore, RendererPool, RgbColor, YarnMatcher,
};

/// Re-export fixtures for test convenience
pub use yarnhue_core::testing::fixtures;

pub const SHOP: &str = "https://shop.test";

const BOUNDARY: &str = "yarnhue-test-boundary";

/// A small shop: two colored listings, one lot listing, one white photo.
pub fn scripted_shop() -> ScriptedRenderer {
    ScriptedRenderer::new()
        .with_page(
            &format!("{}/yarn/page/1", SHOP),
            fixtures::listing_page(&[
                ("Alpaca Charcoal", "/yarn/alpaca-charcoal"),
                ("Leftover Lot", "/yarn/leftovers"),
                ("Wool Scarlet", "/yarn/wool-scarlet"),
                ("Cotton Plain", "/yarn/cotton-plain"),
            ]),
        )
        .with_page(&format!("{}/yarn/page/2", SHOP), fixtures::listing_page(&[]))
        .with_page(
            &format!("{}/yarn/alpaca-charcoal", SHOP),
            fixtures::detail_page("Alpaca Charcoal", Some("/img/a.png")),
        )
        .with_page(
            &format!("{}/yarn/wool-scarlet", SHOP),
            fixtures::detail_page("Wool Scarlet", Some("/img/b.png")),
        )
        .with_page(
            &format!("{}/yarn/cotton-plain", SHOP),
            fixtures::detail_page("Cotton Plain", Some("/img/white.png")),
        )
}

/// Photos for [`scripted_shop`].
pub fn shop_photos() -> MockImageFetcher {
    MockImageFetcher::new()
        .with_image(
            &format!("{}/img/a.png", SHOP),
            fixtures::swatch_png(RgbColor::new(12, 11, 9), 6, 6),
        )
        .with_image(
            &format!("{}/img/b.png", SHOP),
            fixtures::swatch_png(RgbColor::new(200, 5, 5), 6, 6),
        )
        .with_image(
            &format!("{}/img/white.png", SHOP),
            fixtures::swatch_png(RgbColor::new(255, 255, 255), 6, 6),
        )
}

/// Test fixture for API testing with scripted dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_rebuild() {
///     let fixture = TestFixture::new();
///     let response = fixture.post("/api/v1/catalog/rebuild").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock fetcher - inspect requested photo URLs
    pub fetcher: Arc<MockImageFetcher>,
    /// Temporary data directory
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture over the default scripted shop.
    pub fn new() -> Self {
        Self::with_shop(scripted_shop(), shop_photos())
    }

    /// Create a fixture over a custom shop.
    pub fn with_shop(renderer: ScriptedRenderer, fetcher: MockImageFetcher) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let config = Config {
            storage: StorageConfig {
                data_dir: temp_dir.path().join("data"),
            },
            crawler: CrawlerConfig {
                page_url_template: format!("{}/yarn/page/{{page}}", SHOP),
                max_pages: 5,
                request_timeout_secs: 2,
                ..CrawlerConfig::default()
            },
            ranking: RankingConfig {
                page_size: 1,
                fetch_timeout_secs: 2,
                ..RankingConfig::default()
            },
            ..Config::default()
        };

        let fetcher = Arc::new(fetcher);
        let crawler = CatalogCrawler::new(config.crawler.clone(), RendererPool::single(renderer))
            .expect("Failed to create crawler");
        let store = JsonCatalogStore::new(
            config.storage.catalog_path(),
            config.storage.image_dir(),
        );
        let matcher = YarnMatcher::new(
            Arc::new(crawler),
            Arc::new(store),
            Arc::clone(&fetcher) as Arc<dyn ImageFetcher>,
            &config.storage,
            &config.ranking,
        )
        .expect("Failed to create matcher");

        let state = Arc::new(yarnhue_server::state::AppState::new(
            config,
            Arc::new(matcher),
        ));
        let router = yarnhue_server::api::create_router(state);

        Self {
            router,
            fetcher,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Request::builder().method("GET").uri(path).body(Body::empty()).unwrap())
            .await
    }

    /// Send a POST request without body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.send(Request::builder().method("POST").uri(path).body(Body::empty()).unwrap())
            .await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        let request = Request::builder()
            .method("PUT")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        self.send(request).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.send(Request::builder().method("DELETE").uri(path).body(Body::empty()).unwrap())
            .await
    }

    /// Send a PUT request with one multipart file field.
    pub async fn put_file(&self, path: &str, field: &str, bytes: &[u8]) -> TestResponse {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"upload.png\"\r\nContent-Type: image/png\r\n\r\n",
                b = BOUNDARY,
                f = field
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method("PUT")
            .uri(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Upload a solid-color reference photo.
    pub async fn upload_reference(&self, color: RgbColor) -> TestResponse {
        self.put_file("/api/v1/reference", "image", &fixtures::swatch_png(color, 4, 4))
            .await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
