//! Testing utilities and mock implementations.
//!
//! Mocks stand in for the network-facing traits so crawls and rankings can
//! be exercised without a live shop.
//!
//! # Example
//!
//! ```rust,ignore
//! use yarnhue_core::testing::{fixtures, MockImageFetcher, ScriptedRenderer};
//!
//! let renderer = ScriptedRenderer::new()
//!     .with_page("https://shop.test/yarn/teal", fixtures::detail_page("Teal", Some("/img/teal.jpg")));
//! let fetcher = MockImageFetcher::new()
//!     .with_image("https://shop.test/img/teal.jpg", fixtures::swatch_png(RgbColor::new(0, 128, 128), 8, 8));
//! ```

mod mock_fetcher;
mod mock_renderer;

pub use mock_fetcher::MockImageFetcher;
pub use mock_renderer::ScriptedRenderer;

/// Test fixtures and helper functions.
///
/// Page markup matches the default crawler selectors.
pub mod fixtures {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    use crate::color::RgbColor;

    fn escape(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
    }

    fn encode_png(image: &RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("PNG encoding of an in-memory image");
        bytes
    }

    /// A solid `width` x `height` PNG of one color.
    pub fn swatch_png(color: RgbColor, width: u32, height: u32) -> Vec<u8> {
        encode_png(&RgbImage::from_pixel(width, height, Rgb(color.channels())))
    }

    /// A square PNG of one color surrounded by a white frame `border` pixels
    /// wide, so white pixels outnumber the swatch.
    pub fn framed_swatch_png(color: RgbColor, size: u32, border: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(size, size, |x, y| {
            let inside = x >= border && y >= border && x < size - border && y < size - border;
            if inside {
                Rgb(color.channels())
            } else {
                Rgb([255, 255, 255])
            }
        });
        encode_png(&image)
    }

    /// A paginated listing page holding one anchor per `(title, href)`.
    pub fn listing_page(items: &[(&str, &str)]) -> String {
        let links: String = items
            .iter()
            .map(|(title, href)| {
                format!(
                    "<li class=\"product\"><a href=\"{}\">{}</a></li>",
                    escape(href),
                    escape(title)
                )
            })
            .collect();
        format!(
            "<html><body><div id=\"content\"><ul id=\"innerlist\">{}</ul></div></body></html>",
            links
        )
    }

    /// A product detail page. The primary photo sits in the second slot of
    /// the gallery; `None` renders the `<img>` without a `src`.
    pub fn detail_page(title: &str, image_src: Option<&str>) -> String {
        let img = match image_src {
            Some(src) => format!("<img src=\"{}\" alt=\"\">", escape(src)),
            None => "<img alt=\"\">".to_string(),
        };
        format!(
            "<html><body><div id=\"pdm\">\
             <div class=\"product-detail-title\"><span>{}</span></div>\
             <ul class=\"cloud_small\">\
             <li><a href=\"/zoom\"><img src=\"/img/thumb.jpg\" alt=\"\"></a></li>\
             <li><a href=\"/zoom/1\">{}</a></li>\
             </ul></div></body></html>",
            escape(title),
            img
        )
    }

    /// A product detail page with a title but an empty gallery.
    pub fn detail_page_without_image(title: &str) -> String {
        format!(
            "<html><body><div id=\"pdm\">\
             <div class=\"product-detail-title\"><span>{}</span></div>\
             <ul class=\"cloud_small\"></ul>\
             </div></body></html>",
            escape(title)
        )
    }
}
