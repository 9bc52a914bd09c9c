//! Page images for the viewer.
//!
//! The overlay never renders document content; it only needs a page count and
//! a raster per page. [`ImageDirectory`] serves pre-rendered page images from
//! a folder.

mod directory;

pub use directory::ImageDirectory;

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while opening or rendering pages.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("no page images found in {0}")]
    Empty(PathBuf),

    #[error("page {page} out of range (document has {count} pages)")]
    OutOfRange { page: u32, count: u32 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// An RGBA8 raster of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Source of rendered pages. Page numbers are 1-indexed.
pub trait PageSource: Send + Sync {
    fn page_count(&self) -> u32;

    /// Render `page_number` scaled to `width_px` (aspect ratio preserved).
    fn render_page(&self, page_number: u32, width_px: u32) -> Result<RenderedPage, PageError>;

    /// Human-readable name of a page (e.g. its file name).
    fn page_label(&self, page_number: u32) -> Option<String>;
}
