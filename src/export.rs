//! Multi-page export.
//!
//! An export is planned first: page one shows the current configuration and
//! every further page the same shape and algorithm with a fresh seed. Each
//! page carries the share link that reproduces it. The planned pages are then
//! rendered and handed to a [`DocumentSink`]. If any page fails, the sink
//! and everything it collected are dropped.
//!
//! Notes:
//! - Planning works on all targets.
//! - [`PngPageSink`] is available on native targets only.

use crate::codec;
use crate::constants::MAX_EXPORT_PAGES;
use crate::render::{MazeGenerator, RenderError};
use crate::seed::SeedSource;
use crate::types::{Configuration, Svg};
use std::fmt;

/// One planned page of an export.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    /// 1-based page number
    pub page: u32,
    /// Configuration rendered on this page
    pub configuration: Configuration,
    /// Canonical fragment of `configuration`
    pub fragment: String,
    /// Link that opens this exact maze
    pub link: String,
}

/// Why an export produced no document.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportError {
    /// Zero pages were requested
    NoPages,
    /// More pages were requested than a single export allows
    TooManyPages {
        /// Pages requested
        requested: u32,
        /// Upper bound
        max: u32,
    },
    /// Rendering a page failed
    Render {
        /// 1-based page number
        page: u32,
        /// Underlying failure
        source: RenderError,
    },
    /// The sink rejected a page
    Sink {
        /// 1-based page number
        page: u32,
        /// Sink's description of the problem
        message: String,
    },
    /// The sink could not assemble the final document
    Finish(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::NoPages => f.write_str("an export needs at least one page"),
            ExportError::TooManyPages { requested, max } => {
                write!(f, "{requested} pages requested, at most {max} allowed")
            }
            ExportError::Render { page, source } => write!(f, "page {page}: {source}"),
            ExportError::Sink { page, message } => write!(f, "page {page}: {message}"),
            ExportError::Finish(message) => write!(f, "could not finish document: {message}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Render { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Collects rendered pages into a document.
pub trait DocumentSink {
    /// The finished document.
    type Document;

    /// Adds one page. An error aborts the export.
    fn append_page(&mut self, plan: &PagePlan, artifact: &Svg) -> Result<(), String>;

    /// Assembles the document from the pages added so far.
    fn finish(self) -> Result<Self::Document, String>;
}

/// Share link for `fragment`, replacing any fragment already on `base_url`.
pub fn share_link(base_url: &str, fragment: &str) -> String {
    let base = base_url.split('#').next().unwrap_or(base_url);
    format!("{base}#{fragment}")
}

/// Plans `pages` pages starting from `configuration`.
///
/// # Arguments
///
/// * `configuration` - Shown on the first page; later pages reuse everything but the seed
/// * `pages` - Number of pages, between 1 and [`MAX_EXPORT_PAGES`]
/// * `base_url` - Page address the share links are built on
/// * `seeds` - Source of the seeds for pages after the first
pub fn plan_pages(
    configuration: &Configuration,
    pages: u32,
    base_url: &str,
    seeds: &mut impl SeedSource,
) -> Result<Vec<PagePlan>, ExportError> {
    if pages == 0 {
        return Err(ExportError::NoPages);
    }
    if pages > MAX_EXPORT_PAGES {
        return Err(ExportError::TooManyPages {
            requested: pages,
            max: MAX_EXPORT_PAGES,
        });
    }

    let mut plans = Vec::with_capacity(pages as usize);
    let mut current = configuration.clone();
    for page in 1..=pages {
        if page > 1 {
            current = Configuration {
                seed: seeds.fresh_seed(),
                ..current
            };
        }
        let fragment = codec::encode(&current);
        plans.push(PagePlan {
            page,
            link: share_link(base_url, &fragment),
            fragment,
            configuration: current.clone(),
        });
    }
    Ok(plans)
}

/// Renders every planned page into `sink` and returns the finished document.
///
/// Nothing partial is ever returned: on the first failure the sink is dropped
/// along with the pages it holds.
pub fn export_document<G, D>(
    plans: &[PagePlan],
    generator: &G,
    mut sink: D,
) -> Result<D::Document, ExportError>
where
    G: MazeGenerator + ?Sized,
    D: DocumentSink,
{
    if plans.is_empty() {
        return Err(ExportError::NoPages);
    }
    for plan in plans {
        let artifact = generator
            .generate(&plan.configuration)
            .map_err(|err| ExportError::Render {
                page: plan.page,
                source: RenderError::Generator(err),
            })?;
        sink.append_page(plan, &artifact)
            .map_err(|message| ExportError::Sink {
                page: plan.page,
                message,
            })?;
        log::debug!("exported page {} ({})", plan.page, plan.fragment);
    }
    sink.finish().map_err(ExportError::Finish)
}

#[cfg(not(target_arch = "wasm32"))]
pub use raster::{PngPage, PngPageSink};

#[cfg(not(target_arch = "wasm32"))]
mod raster {
    use super::{DocumentSink, PagePlan};
    use crate::constants::PNG_EXPORT_SCALE;
    use crate::types::Svg;
    use std::sync::Arc;
    use tiny_skia::Pixmap;

    /// One rasterised page.
    #[derive(Debug, Clone)]
    pub struct PngPage {
        /// Link printed alongside the page
        pub link: String,
        /// PNG-encoded image
        pub png: Vec<u8>,
    }

    /// Rasterises each page's SVG to PNG.
    pub struct PngPageSink {
        options: usvg::Options<'static>,
        scale: f32,
        pages: Vec<PngPage>,
    }

    impl PngPageSink {
        /// Creates a sink that resolves text against the system's fonts.
        pub fn new() -> Self {
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            Self::with_fonts(db)
        }

        /// Creates a sink using the given font database.
        pub fn with_fonts(db: fontdb::Database) -> Self {
            let mut options = usvg::Options::default();
            options.fontdb = Arc::new(db);
            Self {
                options,
                scale: PNG_EXPORT_SCALE,
                pages: Vec::new(),
            }
        }

        /// Sets the raster scale, clamped to a sensible range.
        pub fn with_scale(mut self, scale: f32) -> Self {
            self.scale = scale.clamp(0.25, 8.0);
            self
        }
    }

    impl Default for PngPageSink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl DocumentSink for PngPageSink {
        type Document = Vec<PngPage>;

        fn append_page(&mut self, plan: &PagePlan, artifact: &Svg) -> Result<(), String> {
            let tree = usvg::Tree::from_data(artifact.0.as_bytes(), &self.options)
                .map_err(|e| format!("invalid SVG: {e}"))?;

            let size = tree.size();
            let out_w = (size.width() * self.scale).round().max(1.0) as u32;
            let out_h = (size.height() * self.scale).round().max(1.0) as u32;
            let mut pixmap = Pixmap::new(out_w, out_h)
                .ok_or_else(|| format!("cannot allocate a {out_w}x{out_h} page"))?;

            pixmap.fill(tiny_skia::Color::WHITE);
            let transform = tiny_skia::Transform::from_scale(self.scale, self.scale);
            resvg::render(&tree, transform, &mut pixmap.as_mut());

            let png = pixmap
                .encode_png()
                .map_err(|e| format!("PNG encoding failed: {e}"))?;
            self.pages.push(PngPage {
                link: plan.link.clone(),
                png,
            });
            Ok(())
        }

        fn finish(self) -> Result<Self::Document, String> {
            Ok(self.pages)
        }
    }
}
