//! Brand Kit assembly from crawled pages.
//!
//! Aggregation is deterministic; only the voice/about copy goes through the
//! text-generation collaborator, and every collaborator failure degrades to
//! fixed fallback text tagged with `voice_source: fallback`.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::classify::colors::build_palette;
use crate::classify::images::infer_brand_name;
use crate::classify::logo::select_logo;
use crate::synthesis::keywords::keyword_themes;
use crate::synthesis::textgen::{
    blurb_prompt, parse_voice_profile, voice_prompt, TextGenerator, VoiceProfile,
};
use crate::types::{BrandKit, ImageCandidate, PageRecord, TypographyResult, VoiceSource};

/// Keyword themes carried on the kit.
const MAX_KEYWORDS: usize = 8;
/// Headlines carried on the kit.
const MAX_HEADLINES: usize = 10;
/// Images carried on the kit, priority-sorted across all pages.
const MAX_KIT_IMAGES: usize = 15;
/// Combined page text passed to the collaborator and keyword extraction.
const COMBINED_TEXT_CAP: usize = 12_000;
/// Blurbs shorter than this trigger the quality-gate re-invocation.
const MIN_BLURB_LEN: usize = 40;
/// Generic phrase used when no meta description exists anywhere.
const GENERIC_BLURB: &str = "A company offering products and services.";
const FALLBACK_TONE: &str = "professional";
const FALLBACK_PERSONALITY: &[&str] = &["professional", "reliable", "approachable"];
const FALLBACK_VOICE_SUMMARY: &str =
    "A straightforward, professional voice focused on its products and customers.";

/// Assemble the final Brand Kit from extracted pages.
///
/// Never fails: an empty page list yields a kit built entirely from
/// fallbacks, and collaborator errors are absorbed.
pub async fn build_brand_kit(
    pages: &[PageRecord],
    brand_hint: Option<&str>,
    industry_hint: Option<&str>,
    generator: &dyn TextGenerator,
) -> BrandKit {
    let pages = dedup_by_content_hash(pages);

    let brand_name = brand_hint.map(str::to_string).or_else(|| {
        pages.first().and_then(|p| {
            infer_brand_name(p.open_graph.site_name.as_deref(), &p.title, &p.h1s)
        })
    });

    let combined_text = combine_text(&pages);
    let themes = keyword_themes(&combined_text, MAX_KEYWORDS);

    let all_votes: Vec<_> = pages
        .iter()
        .flat_map(|p| p.color_votes.iter().cloned())
        .collect();
    let palette = build_palette(all_votes);

    let all_images: Vec<ImageCandidate> = pages
        .iter()
        .flat_map(|p| p.images.iter().cloned())
        .collect();
    let (logo, logo_alternates) = select_logo(&all_images);

    let mut images = all_images;
    images.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    images.truncate(MAX_KIT_IMAGES);

    let typography = pages
        .iter()
        .map(|p| p.typography.clone())
        .find(|t| t.heading_font.is_some() || t.body_font.is_some())
        .unwrap_or_else(TypographyResult::default);

    let headlines = aggregate_headlines(&pages);
    let source_urls: Vec<String> = pages.iter().map(|p| p.url.clone()).collect();

    let (voice, voice_source) = resolve_voice(
        &pages,
        brand_name.as_deref(),
        industry_hint,
        &combined_text,
        generator,
    )
    .await;

    info!(
        pages = pages.len(),
        images = images.len(),
        colors = palette.colors.len(),
        has_logo = logo.is_some(),
        ?voice_source,
        "brand kit assembled"
    );

    BrandKit {
        brand_name,
        voice_summary: voice.voice_summary,
        tone: voice.tone,
        personality: voice.personality,
        keyword_themes: themes,
        about_blurb: voice.about_blurb,
        about_long: voice.about_long,
        palette,
        typography,
        source_urls,
        logo,
        logo_alternates,
        headlines,
        images,
        voice_source,
    }
}

/// First occurrence wins; later pages with identical body text are dropped.
fn dedup_by_content_hash(pages: &[PageRecord]) -> Vec<PageRecord> {
    let mut seen: HashSet<&str> = HashSet::new();
    pages
        .iter()
        .filter(|p| seen.insert(p.content_hash.as_str()))
        .cloned()
        .collect()
}

fn combine_text(pages: &[PageRecord]) -> String {
    let mut text = String::new();
    for page in pages {
        for part in [&page.title, &page.meta_description] {
            if !part.is_empty() {
                text.push_str(part);
                text.push('\n');
            }
        }
        for headline in &page.headlines {
            text.push_str(headline);
            text.push('\n');
        }
        text.push_str(&page.body_text);
        text.push('\n');
        if text.len() >= COMBINED_TEXT_CAP {
            break;
        }
    }
    if text.len() > COMBINED_TEXT_CAP {
        // Truncate on a char boundary.
        let mut cut = COMBINED_TEXT_CAP;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

fn aggregate_headlines(pages: &[PageRecord]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for page in pages {
        for headline in &page.headlines {
            if !out.iter().any(|h| h == headline) {
                out.push(headline.clone());
            }
            if out.len() >= MAX_HEADLINES {
                return out;
            }
        }
    }
    out
}

/// Collaborator-first voice resolution with deterministic fallback and a
/// one-shot quality gate on the about blurb.
async fn resolve_voice(
    pages: &[PageRecord],
    brand_name: Option<&str>,
    industry_hint: Option<&str>,
    combined_text: &str,
    generator: &dyn TextGenerator,
) -> (VoiceProfile, VoiceSource) {
    let (mut voice, source) = match generator
        .generate(&voice_prompt(brand_name, industry_hint, combined_text))
        .await
        .and_then(|raw| parse_voice_profile(&raw))
    {
        Ok(profile) => (profile, VoiceSource::Generated),
        Err(e) => {
            debug!(error = %e, "voice generation unavailable, using fallback");
            (fallback_voice(pages), VoiceSource::Fallback)
        }
    };

    if voice.about_blurb.trim().len() < MIN_BLURB_LEN || voice.about_blurb == GENERIC_BLURB {
        match generator
            .generate(&blurb_prompt(brand_name, combined_text))
            .await
        {
            Ok(blurb) if blurb.trim().len() >= MIN_BLURB_LEN => {
                voice.about_blurb = blurb.trim().to_string();
            }
            Ok(_) | Err(_) => {
                debug!("blurb re-generation did not improve on fallback");
            }
        }
    }

    (voice, source)
}

/// Deterministic voice: best available meta description, fixed tone and
/// personality.
fn fallback_voice(pages: &[PageRecord]) -> VoiceProfile {
    let blurb = pages
        .iter()
        .map(|p| p.meta_description.trim())
        .find(|d| !d.is_empty())
        .map(truncate_sentence)
        .unwrap_or_else(|| GENERIC_BLURB.to_string());

    VoiceProfile {
        voice_summary: FALLBACK_VOICE_SUMMARY.to_string(),
        tone: FALLBACK_TONE.to_string(),
        personality: FALLBACK_PERSONALITY.iter().map(|s| s.to_string()).collect(),
        about_blurb: blurb,
        about_long: None,
    }
}

/// Cap a description at roughly two sentences / 240 chars.
fn truncate_sentence(text: &str) -> String {
    const CAP: usize = 240;
    if text.len() <= CAP {
        return text.to_string();
    }
    let head = &text[..floor_char_boundary(text, CAP)];
    match head.rfind(". ") {
        Some(idx) => head[..idx + 1].to_string(),
        None => format!("{}…", head.trim_end()),
    }
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
