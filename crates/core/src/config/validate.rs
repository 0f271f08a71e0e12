use scraper::Selector;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Crawler limits and timeouts are positive and the page template has a `{page}` slot
/// - Every configured CSS selector parses
/// - Ranking concurrency and fetch timeout are positive
/// - The white threshold is in 0..=255
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let crawler = &config.crawler;
    if !crawler.page_url_template.contains("{page}") {
        return Err(ConfigError::ValidationError(
            "crawler.page_url_template must contain {page}".to_string(),
        ));
    }
    if crawler.max_pages == 0 {
        return Err(ConfigError::ValidationError(
            "crawler.max_pages must be at least 1".to_string(),
        ));
    }
    if crawler.sessions == 0 {
        return Err(ConfigError::ValidationError(
            "crawler.sessions must be at least 1".to_string(),
        ));
    }
    if crawler.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "crawler.request_timeout_secs must be at least 1".to_string(),
        ));
    }
    for (key, selector) in [
        ("crawler.listing_selector", &crawler.listing_selector),
        ("crawler.listing_link_selector", &crawler.listing_link_selector),
        ("crawler.title_selector", &crawler.title_selector),
        ("crawler.image_selector", &crawler.image_selector),
    ] {
        if Selector::parse(selector).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "{} is not a valid CSS selector: {:?}",
                key, selector
            )));
        }
    }

    let ranking = &config.ranking;
    if ranking.max_concurrent_fetches == 0 {
        return Err(ConfigError::ValidationError(
            "ranking.max_concurrent_fetches must be at least 1".to_string(),
        ));
    }
    if ranking.fetch_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "ranking.fetch_timeout_secs must be at least 1".to_string(),
        ));
    }
    if ranking.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "ranking.page_size must be at least 1".to_string(),
        ));
    }
    if !(0..=255).contains(&ranking.white_threshold) {
        return Err(ConfigError::ValidationError(format!(
            "ranking.white_threshold must be within 0..=255, got {}",
            ranking.white_threshold
        )));
    }

    Ok(())
}
