//! Engine error type.
//!
//! Only `Renderer` is fatal to a whole job — it means the headless browser
//! could not be started or was lost. Everything else is page-scoped or
//! collaborator-scoped and is logged and absorbed by the caller.

use thiserror::Error;

/// Errors produced by the brand discovery engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The headless browser could not be launched or its connection was lost.
    /// Fatal to the job.
    #[error("render engine unavailable: {0}")]
    Renderer(String),

    /// Navigation or page load failed (timeout, network error). Page-scoped.
    #[error("page load failed for {url}: {reason}")]
    PageLoad { url: String, reason: String },

    /// An in-page extraction step threw or returned malformed data.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The text-generation collaborator failed or returned unparseable output.
    /// Never surfaced to the caller — always replaced by a deterministic fallback.
    #[error("text generation unavailable: {0}")]
    Collaborator(String),

    /// robots.txt could not be fetched or parsed. Treated as allow-all.
    #[error("robots.txt fetch failed: {0}")]
    Robots(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
