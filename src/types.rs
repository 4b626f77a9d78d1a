//! Shared data model: per-page records, image candidates, and the Brand Kit.
//!
//! These are the shapes that cross module boundaries. Everything is plain
//! serde data; classification and scoring over these types are pure functions
//! living in `classify` and `synthesis`.

use serde::{Deserialize, Serialize};

/// Where an image candidate was discovered.
///
/// Variant order is the logo-merge priority order: inline SVG beats CSS
/// backgrounds, which beat `<img>` tags; Open Graph and favicon entries are
/// only considered when nothing better exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    InlineSvg,
    CssBackground,
    HtmlImg,
    OpenGraph,
    Favicon,
}

impl SourceType {
    /// Rank for logo merging; lower is stronger.
    pub fn merge_rank(self) -> u8 {
        match self {
            SourceType::InlineSvg => 0,
            SourceType::CssBackground => 1,
            SourceType::HtmlImg => 2,
            SourceType::OpenGraph => 3,
            SourceType::Favicon => 4,
        }
    }

    /// Open Graph and favicon candidates are fallback-only sources.
    pub fn is_fallback_source(self) -> bool {
        matches!(self, SourceType::OpenGraph | SourceType::Favicon)
    }
}

/// Semantic category assigned to an extracted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageRole {
    Logo,
    SocialIcon,
    PlatformLogo,
    PartnerLogo,
    Team,
    Subject,
    Hero,
    Photo,
    UiIcon,
    Other,
}

impl ImageRole {
    /// Relative weight for priority scoring. Only the ordering matters:
    /// logo > team > subject > hero > everything else.
    pub fn weight(self) -> f32 {
        match self {
            ImageRole::Logo => 10.0,
            ImageRole::Team => 8.0,
            ImageRole::Subject => 6.0,
            ImageRole::Hero => 4.0,
            ImageRole::Photo => 2.0,
            ImageRole::PartnerLogo | ImageRole::PlatformLogo => 1.0,
            ImageRole::SocialIcon | ImageRole::UiIcon | ImageRole::Other => 0.5,
        }
    }
}

/// Coarse page category used for priority bonuses during image scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Main,
    TeamOrAbout,
    Other,
}

impl PageKind {
    /// Classify a URL path into a page kind.
    pub fn from_path(path: &str) -> Self {
        let path = path.to_lowercase();
        if path == "/" || path.is_empty() {
            return PageKind::Main;
        }
        if path.contains("about") || path.contains("team") || path.contains("people") {
            return PageKind::TeamOrAbout;
        }
        PageKind::Other
    }

    pub fn bonus(self) -> f32 {
        match self {
            PageKind::Main => 2.0,
            PageKind::TeamOrAbout => 1.0,
            PageKind::Other => 0.0,
        }
    }
}

/// A single image discovered on a page, with context flags and scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageCandidate {
    /// Absolute, normalized URL.
    pub url: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub title: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub source: SourceType,
    /// Ancestor chain includes a header or nav element.
    #[serde(default)]
    pub in_header_or_nav: bool,
    /// Ancestor chain includes a footer element.
    #[serde(default)]
    pub in_footer: bool,
    /// Ancestor text/attributes match partner/sponsor vocabulary.
    #[serde(default)]
    pub in_partner_section: bool,
    /// Bounding box starts above the fold.
    #[serde(default)]
    pub in_hero: bool,
    /// Count of textual signals tying the image to the brand name.
    #[serde(default)]
    pub brand_match_score: u32,
    pub role: ImageRole,
    pub priority: f32,
}

impl ImageCandidate {
    /// Largest known dimension, if any dimension is known.
    pub fn max_dimension(&self) -> Option<u32> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(w.max(h)),
            (Some(w), None) => Some(w),
            (None, Some(h)) => Some(h),
            (None, None) => None,
        }
    }

    /// Pixel area, when both dimensions are known.
    pub fn area(&self) -> Option<u64> {
        Some(self.width? as u64 * self.height? as u64)
    }
}

/// Origin of a color vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorOrigin {
    /// Computed style of a UI element (header, button, badge, gradient stop).
    Ui,
    /// Quantized from the full-viewport screenshot.
    Screenshot,
}

/// A weighted vote for one normalized color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorCandidate {
    /// Normalized 6-digit hex, uppercase, leading `#`.
    pub hex: String,
    pub weight: f32,
    pub origin: ColorOrigin,
}

/// Whether a resolved font family is served by a known hosted font service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontSource {
    KnownService,
    Custom,
}

/// Detected typography for a page (or the synthesized kit).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypographyResult {
    pub heading_font: Option<String>,
    pub body_font: Option<String>,
    pub source: FontSource,
}

impl Default for TypographyResult {
    fn default() -> Self {
        Self {
            heading_font: None,
            body_font: None,
            source: FontSource::Custom,
        }
    }
}

/// Open Graph metadata lifted from a page head.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenGraph {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub site_name: Option<String>,
}

/// Everything extracted from one rendered page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub depth: u32,
    pub title: String,
    pub meta_description: String,
    pub h1s: Vec<String>,
    pub h2s: Vec<String>,
    pub h3s: Vec<String>,
    pub body_text: String,
    /// fnv64 digest of `body_text`, used for cross-page dedup.
    pub content_hash: String,
    /// Filtered, priority-sorted image candidates (capped at 15).
    pub images: Vec<ImageCandidate>,
    pub headlines: Vec<String>,
    pub color_votes: Vec<ColorCandidate>,
    pub typography: TypographyResult,
    pub open_graph: OpenGraph,
}

/// Final color palette (≤6 colors, ranked).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Palette {
    /// Ranked colors; positions 0–2 are primary, 3–5 secondary.
    pub colors: Vec<String>,
    pub primary: String,
    pub secondary: Option<String>,
    pub accent: Option<String>,
    /// True when the fixed neutral fallback palette was substituted.
    pub fallback: bool,
}

/// The logo picked during job-level synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedLogo {
    pub url: String,
    pub score: f32,
    /// True when no candidate passed the filters and the best raw candidate
    /// was substituted.
    pub fallback: bool,
}

/// How the voice/about copy was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceSource {
    Generated,
    Fallback,
}

/// The synthesized Brand Kit returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandKit {
    pub brand_name: Option<String>,
    pub voice_summary: String,
    pub tone: String,
    pub personality: Vec<String>,
    pub keyword_themes: Vec<String>,
    pub about_blurb: String,
    pub about_long: Option<String>,
    pub palette: Palette,
    pub typography: TypographyResult,
    pub source_urls: Vec<String>,
    pub logo: Option<SelectedLogo>,
    /// Runner-up logo URLs, strongest first.
    pub logo_alternates: Vec<String>,
    pub headlines: Vec<String>,
    pub images: Vec<ImageCandidate>,
    pub voice_source: VoiceSource,
}
