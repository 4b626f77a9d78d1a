//! Per-page extraction pipeline.
//!
//! Runs every extractor against a rendered page and assembles a `PageRecord`.
//! Each step is caught independently: a throwing extractor defaults to empty
//! output and the page continues. Only navigation failures are surfaced to
//! the frontier (which retries them).

use std::hash::Hasher;

use fnv::FnvHasher;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::classify::colors::{
    self, append_screenshot_votes, filter_and_rank, quantize_screenshot, MIN_PALETTE,
};
use crate::classify::images::{build_candidates, infer_brand_name, RawImage};
use crate::classify::typography::detect_typography;
use crate::renderer::{ExtractorId, RenderContext};
use crate::types::{OpenGraph, PageKind, PageRecord};

/// Cap on headlines carried per page.
const MAX_HEADLINES: usize = 10;

/// Raw content extractor output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawContent {
    pub title: String,
    pub meta_description: String,
    pub h1s: Vec<String>,
    pub h2s: Vec<String>,
    pub h3s: Vec<String>,
    pub body_text: String,
    pub links: Vec<String>,
    pub open_graph: RawOpenGraph,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOpenGraph {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub site_name: Option<String>,
}

/// One extracted page plus the outbound links for the frontier.
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub record: PageRecord,
    pub links: Vec<String>,
}

/// Deterministic fnv64 digest of extracted body text.
pub fn content_hash(body_text: &str) -> String {
    let mut hasher = FnvHasher::default();
    hasher.write(body_text.as_bytes());
    format!("{:016x}", hasher.finish())
}

/// Runs all extractors against a rendered page.
pub struct PageExtractor {
    brand_hint: Option<String>,
}

impl PageExtractor {
    pub fn new(brand_hint: Option<String>) -> Self {
        Self { brand_hint }
    }

    /// Extract a full `PageRecord`. Individual extractor failures degrade to
    /// empty sections; this never fails as a whole.
    pub async fn extract_page(
        &self,
        context: &dyn RenderContext,
        url: &Url,
        depth: u32,
    ) -> ExtractedPage {
        let content = match context.extract(ExtractorId::Content).await {
            Ok(value) => serde_json::from_value::<RawContent>(value).unwrap_or_else(|e| {
                warn!(%url, error = %e, "content extractor returned malformed data");
                RawContent::default()
            }),
            Err(e) => {
                warn!(%url, error = %e, "content extraction failed");
                RawContent::default()
            }
        };

        let brand_name = self.brand_hint.clone().or_else(|| {
            infer_brand_name(
                content.open_graph.site_name.as_deref(),
                &content.title,
                &content.h1s,
            )
        });
        let page_kind = PageKind::from_path(url.path());

        let images = match context.extract(ExtractorId::Images).await {
            Ok(value) => {
                let raw = serde_json::from_value::<Vec<RawImage>>(value).unwrap_or_default();
                build_candidates(raw, url, brand_name.as_deref(), page_kind)
            }
            Err(e) => {
                warn!(%url, error = %e, "image extraction failed");
                Vec::new()
            }
        };

        let mut color_votes = match context.extract(ExtractorId::UiColors).await {
            Ok(value) => colors::votes_from_ui(&value),
            Err(e) => {
                warn!(%url, error = %e, "ui color extraction failed");
                Vec::new()
            }
        };

        // Screenshot quantization is a fallback pass: only taken when the UI
        // pass cannot fill a minimal palette on its own.
        if filter_and_rank(color_votes.clone()).len() < MIN_PALETTE {
            match context.screenshot().await {
                Ok(png) => match quantize_screenshot(&png) {
                    Ok(swatches) => append_screenshot_votes(&mut color_votes, swatches),
                    Err(e) => debug!(%url, error = %e, "screenshot quantization failed"),
                },
                Err(e) => debug!(%url, error = %e, "screenshot capture failed"),
            }
        }

        let typography = match context.extract(ExtractorId::Typography).await {
            Ok(value) => detect_typography(&value),
            Err(e) => {
                warn!(%url, error = %e, "typography extraction failed");
                Default::default()
            }
        };

        let headlines = collect_headlines(&content.h1s, &content.h2s);
        let hash = content_hash(&content.body_text);

        let record = PageRecord {
            url: url.to_string(),
            depth,
            title: content.title,
            meta_description: content.meta_description,
            h1s: content.h1s,
            h2s: content.h2s,
            h3s: content.h3s,
            body_text: content.body_text,
            content_hash: hash,
            images,
            headlines,
            color_votes,
            typography,
            open_graph: OpenGraph {
                title: content.open_graph.title,
                description: content.open_graph.description,
                image: content.open_graph.image,
                site_name: content.open_graph.site_name,
            },
        };

        ExtractedPage {
            record,
            links: content.links,
        }
    }
}

/// Headlines: H1s first, then H2s, deduplicated, capped.
fn collect_headlines(h1s: &[String], h2s: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for headline in h1s.iter().chain(h2s.iter()) {
        let trimmed = headline.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !out.iter().any(|h| h == trimmed) {
            out.push(trimmed.to_string());
        }
        if out.len() >= MAX_HEADLINES {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_deterministic() {
        let a = content_hash("Acme makes widgets for the modern web.");
        let b = content_hash("Acme makes widgets for the modern web.");
        let c = content_hash("Different text entirely.");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_collect_headlines_dedup_and_cap() {
        let h1s = vec!["Welcome".to_string(), "Welcome".to_string()];
        let h2s: Vec<String> = (0..20).map(|i| format!("Section {i}")).collect();
        let headlines = collect_headlines(&h1s, &h2s);
        assert_eq!(headlines.len(), MAX_HEADLINES);
        assert_eq!(headlines[0], "Welcome");
        assert_eq!(headlines[1], "Section 0");
    }

    #[test]
    fn test_raw_content_deserializes_camel_case() {
        let value = serde_json::json!({
            "title": "Acme",
            "metaDescription": "Widgets",
            "h1s": ["Hello"],
            "bodyText": "text",
            "links": ["https://example.com/a"],
            "openGraph": {"siteName": "Acme"}
        });
        let content: RawContent = serde_json::from_value(value).unwrap();
        assert_eq!(content.meta_description, "Widgets");
        assert_eq!(content.open_graph.site_name.as_deref(), Some("Acme"));
        assert_eq!(content.h2s.len(), 0);
    }
}
