//! Page rendering sessions.
//!
//! A [`PageRenderer`] is one stateful session that navigates to a URL and
//! hands back the rendered HTML. Sessions are exclusive: navigation takes
//! `&mut self`, and parallel crawling goes through a [`RendererPool`] that
//! checks sessions out one worker at a time.

mod error;
mod http;
mod page;
mod pool;

pub use error::RenderError;
pub use http::HttpRenderer;
pub use page::RenderedPage;
pub use pool::{PooledRenderer, RendererPool};

use async_trait::async_trait;

/// A single navigation session.
#[async_trait]
pub trait PageRenderer: Send {
    /// Returns the name of this renderer implementation.
    fn name(&self) -> &str;

    /// Navigates to `url` and returns the rendered document.
    async fn render(&mut self, url: &str) -> Result<RenderedPage, RenderError>;
}

#[async_trait]
impl<R: PageRenderer + ?Sized> PageRenderer for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn render(&mut self, url: &str) -> Result<RenderedPage, RenderError> {
        (**self).render(url).await
    }
}
