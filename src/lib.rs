//! Brand discovery engine: crawl a website, classify its assets, and
//! synthesize a Brand Kit.
//!
//! The pipeline is a bounded breadth-first crawl through a headless browser
//! (`renderer::chrome`), per-page extraction of content, images, colors, and
//! typography (`extraction`), pure-function classification (`classify`), and
//! final aggregation into a [`types::BrandKit`] (`synthesis`). Jobs are
//! orchestrated by [`crawl::run_job`].

pub mod classify;
pub mod config;
pub mod crawl;
pub mod error;
pub mod extraction;
pub mod renderer;
pub mod retry;
pub mod synthesis;
pub mod types;

pub use config::CrawlLimits;
pub use crawl::{run_job, InMemoryJobStore, JobRequest, JobStatus, JobStore};
pub use error::{EngineError, Result};
pub use renderer::chrome::ChromeRenderer;
pub use renderer::{RenderContext, Renderer};
pub use synthesis::{HttpTextGenerator, NullTextGenerator, TextGenerator};
pub use types::BrandKit;
