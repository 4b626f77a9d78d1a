//! Rendering seam: navigation, in-page extraction, and screenshots behind
//! narrow traits.
//!
//! The crawler and every classifier depend only on `Renderer` /
//! `RenderContext`, so classification and frontier logic are testable with a
//! stub context and no browser. `chrome` provides the chromiumoxide-backed
//! implementation.

pub mod chrome;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identifier for one of the embedded in-page extractor scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractorId {
    /// Title, meta description, headings, stripped body text, links, Open Graph.
    Content,
    /// Image candidates from every source with ancestor context.
    Images,
    /// Weighted UI color votes.
    UiColors,
    /// Font family tallies for headings and body elements.
    Typography,
}

impl ExtractorId {
    pub fn name(self) -> &'static str {
        match self {
            ExtractorId::Content => "content",
            ExtractorId::Images => "images",
            ExtractorId::UiColors => "ui_colors",
            ExtractorId::Typography => "typography",
        }
    }
}

/// Outcome of a successful navigation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationResult {
    /// URL after redirects.
    pub final_url: String,
    pub load_time_ms: u64,
}

/// Owns the underlying browser process and hands out page contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open a fresh page context. Each crawl job owns its contexts exclusively.
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
}

/// One rendered page: navigate once, then extract.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate with a timeout, wait for a settled state, and install the
    /// helper shim.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<NavigationResult>;

    /// Run one extractor in page context, returning plain JSON data.
    async fn extract(&self, extractor: ExtractorId) -> Result<serde_json::Value>;

    /// Capture a full-viewport PNG screenshot.
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// Close the underlying page. Dropping a context without calling this
    /// still releases the page, but `close` is the deterministic path.
    async fn close(self: Box<Self>) -> Result<()>;
}
