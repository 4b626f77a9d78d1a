//! Image candidate construction, role classification, and priority scoring.
//!
//! Role assignment and priority are pure functions of the candidate fields:
//! the same input always yields the same role and score. Thresholds are
//! empirically tuned constants, not semantic requirements.

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::classify::keywords::{
    matches_any, ICON_PACK_PATHS, LOGO_TERMS, PARTNER_TERMS, PEOPLE_TERMS, PLACEHOLDER_PATHS,
    PLATFORM_VENDORS, PRODUCT_TERMS, SOCIAL_NETWORKS, UI_ICON_TERMS,
};
use crate::types::{ImageCandidate, ImageRole, PageKind, SourceType};

/// Either dimension above this is "oversized" and never a logo.
pub const OVERSIZE_DIM: u32 = 400;
/// Pixel area above this is likewise oversized.
pub const OVERSIZE_AREA: u64 = 200_000;
/// Platform badges above this size are treated as ordinary content.
pub const PLATFORM_LARGE_DIM: u32 = 300;
/// Below this, a partner-keyword match alone marks a partner logo.
pub const PARTNER_SMALL_DIM: u32 = 120;
/// Small images matching UI-icon vocabulary get overridden to `ui_icon`.
pub const UI_ICON_DIM: u32 = 100;
/// Images with both dimensions known and under this are dropped as noise.
pub const MIN_KEPT_DIM: u32 = 50;
/// Per-page output cap, priority-sorted.
pub const MAX_IMAGES_PER_PAGE: usize = 15;

/// Raw image data as emitted by the in-page extractor script.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawImage {
    pub url: String,
    pub alt: String,
    pub title: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub source_type: Option<SourceType>,
    pub in_header: bool,
    pub in_footer: bool,
    pub ancestor_text: String,
    pub ancestor_attrs: String,
    pub top: Option<f64>,
    pub viewport_height: Option<f64>,
}

/// Infer the brand name from page signals when the caller supplied none:
/// og:site_name, then the page title prefix, then the first H1.
pub fn infer_brand_name(
    og_site_name: Option<&str>,
    title: &str,
    h1s: &[String],
) -> Option<String> {
    if let Some(name) = og_site_name {
        let name = name.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    let prefix = title
        .split(['|', '–', '—'])
        .next()
        .map(|s| s.split(" - ").next().unwrap_or(s).trim())
        .unwrap_or("");
    if !prefix.is_empty() {
        return Some(prefix.to_string());
    }
    h1s.first()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
}

/// Lowercased alphanumeric form used for brand matching in URLs.
fn slug(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Build classified candidates for one page from the raw extractor output.
///
/// Resolves URLs against the page URL, computes context flags and brand-match
/// scores, assigns roles and priorities, collapses exact-URL duplicates, then
/// filters and caps the result.
pub fn build_candidates(
    raw: Vec<RawImage>,
    page_url: &Url,
    brand_name: Option<&str>,
    page_kind: PageKind,
) -> Vec<ImageCandidate> {
    let mut candidates: Vec<ImageCandidate> = Vec::new();

    for item in raw {
        let Some(url) = resolve_url(&item.url, page_url) else {
            continue;
        };
        let source = item.source_type.unwrap_or(SourceType::HtmlImg);

        let in_hero = match (item.top, item.viewport_height) {
            (Some(top), Some(vh)) if vh > 0.0 => top >= 0.0 && top < vh,
            _ => false,
        };
        let partner_context = matches_any(&item.ancestor_text, PARTNER_TERMS)
            || matches_any(&item.ancestor_attrs, PARTNER_TERMS);
        let brand_match_score = brand_match(&url, &item.alt, &item.title, brand_name);

        let mut candidate = ImageCandidate {
            url,
            alt: item.alt,
            title: item.title,
            width: item.width.filter(|w| *w > 0),
            height: item.height.filter(|h| *h > 0),
            source,
            in_header_or_nav: item.in_header,
            in_footer: item.in_footer,
            in_partner_section: partner_context,
            in_hero,
            brand_match_score,
            role: ImageRole::Other,
            priority: 0.0,
        };
        candidate.role = classify_role(&candidate, page_kind, &item.ancestor_attrs);
        candidate.priority = priority_score(&candidate, page_kind);
        candidates.push(candidate);
    }

    let merged = merge_duplicates(candidates);
    let mut kept: Vec<ImageCandidate> = merged
        .into_iter()
        .filter(|c| keep_candidate(c))
        .collect();
    kept.sort_by(|a, b| {
        b.priority
            .partial_cmp(&a.priority)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    kept.truncate(MAX_IMAGES_PER_PAGE);
    kept
}

/// +1 if the alt/title text contains the brand name, +1 if the filename/path
/// does. Only the URL path counts, so a brand-named hostname does not mark
/// every image on the site.
pub fn brand_match(url: &str, alt: &str, title: &str, brand_name: Option<&str>) -> u32 {
    let Some(brand) = brand_name else { return 0 };
    let brand_lower = brand.trim().to_lowercase();
    if brand_lower.len() < 2 {
        return 0;
    }
    let mut score = 0;
    let text = format!("{} {}", alt.to_lowercase(), title.to_lowercase());
    if text.contains(&brand_lower) {
        score += 1;
    }
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    let brand_slug = slug(brand);
    if !brand_slug.is_empty() && slug(&path).contains(&brand_slug) {
        score += 1;
    }
    score
}

/// Role classification: rules applied first-match-wins, then the UI-icon
/// override on top.
///
/// A small image matching generic icon vocabulary or a known icon-pack path
/// becomes `ui_icon` even when the primary rules called it a logo (a nav-bar
/// search or cart glyph satisfies the header test), unless a logo keyword or
/// brand match says otherwise. More specific roles (social, platform,
/// partner, team) are left alone.
pub fn classify_role(c: &ImageCandidate, page_kind: PageKind, ancestor_attrs: &str) -> ImageRole {
    let url_lower = c.url.to_lowercase();
    let text = format!("{} {} {}", c.alt, c.title, ancestor_attrs).to_lowercase();
    let max_dim = c.max_dimension();
    let has_logo_term = matches_any(&url_lower, LOGO_TERMS) || matches_any(&text, LOGO_TERMS);
    let icon_like =
        matches_any(&url_lower, UI_ICON_TERMS) || matches_any(&url_lower, ICON_PACK_PATHS);

    let role = primary_role(c, page_kind, &url_lower, &text, has_logo_term, icon_like);

    let small_icon = max_dim.map_or(true, |d| d < UI_ICON_DIM);
    if small_icon
        && icon_like
        && !has_logo_term
        && c.brand_match_score == 0
        && matches!(role, ImageRole::Logo | ImageRole::Other)
    {
        return ImageRole::UiIcon;
    }
    role
}

/// Primary rules, first match wins.
fn primary_role(
    c: &ImageCandidate,
    page_kind: PageKind,
    url_lower: &str,
    text: &str,
    has_logo_term: bool,
    icon_like: bool,
) -> ImageRole {
    let max_dim = c.max_dimension();
    let area = c.area();

    // 1. Oversized images are never logos.
    let oversized = max_dim.is_some_and(|d| d > OVERSIZE_DIM)
        || area.is_some_and(|a| a > OVERSIZE_AREA);
    if oversized {
        let role = if c.in_hero {
            ImageRole::Hero
        } else {
            ImageRole::Photo
        };
        return role;
    }

    // 2. Social network icons.
    if matches_any(url_lower, SOCIAL_NETWORKS) || matches_any(text, SOCIAL_NETWORKS) {
        return ImageRole::SocialIcon;
    }

    // 3. Platform vendor badges, unless large enough to be real content.
    let platform = matches_any(url_lower, PLATFORM_VENDORS);
    let platform_large = max_dim.is_some_and(|d| d > PLATFORM_LARGE_DIM);
    if platform && has_logo_term && !platform_large {
        return ImageRole::PlatformLogo;
    }

    // 4. Partner/sponsor logos.
    let partner_term = matches_any(text, PARTNER_TERMS) || matches_any(url_lower, PARTNER_TERMS);
    let small_partner = max_dim.is_some_and(|d| d < PARTNER_SMALL_DIM) && partner_term;
    if c.in_partner_section || small_partner {
        return ImageRole::PartnerLogo;
    }

    // 5. The brand's own logo: small plus a logo signal. Unknown dimensions
    //    pass the size gate (rule 1 could not prove oversize).
    let small_enough = max_dim.map_or(true, |d| d < OVERSIZE_DIM);
    if small_enough && (c.in_header_or_nav || has_logo_term || c.brand_match_score > 0) {
        return ImageRole::Logo;
    }

    // 6. Team portraits on team/about pages.
    if page_kind == PageKind::TeamOrAbout
        && (matches_any(text, PEOPLE_TERMS) || matches_any(url_lower, PEOPLE_TERMS))
    {
        return ImageRole::Team;
    }

    // 7. Product/service subjects.
    if matches_any(text, PRODUCT_TERMS) || matches_any(url_lower, PRODUCT_TERMS) {
        return ImageRole::Subject;
    }

    // 8. Sizeable content images.
    if let Some(a) = area {
        if a >= 40_000 && !icon_like {
            return if c.in_hero && a >= 120_000 {
                ImageRole::Hero
            } else {
                ImageRole::Photo
            };
        }
    }

    ImageRole::Other
}

/// Weighted priority: role weight + page-type bonus + size-tier bonus.
pub fn priority_score(c: &ImageCandidate, page_kind: PageKind) -> f32 {
    let size_bonus = match c.max_dimension() {
        Some(d) if d >= 600 => 1.5,
        Some(d) if d >= 200 => 1.0,
        Some(d) if d >= 80 => 0.5,
        _ => 0.0,
    };
    c.role.weight() + page_kind.bonus() + size_bonus
}

/// Collapse exact-URL duplicates, keeping the richer candidate and OR-merging
/// context flags.
pub fn merge_duplicates(candidates: Vec<ImageCandidate>) -> Vec<ImageCandidate> {
    let mut merged: Vec<ImageCandidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if let Some(existing) = merged.iter_mut().find(|m| m.url == candidate.url) {
            let replace = richness(&candidate) > richness(existing)
                || (richness(&candidate) == richness(existing)
                    && candidate.source.merge_rank() < existing.source.merge_rank());
            let flags = (
                existing.in_header_or_nav || candidate.in_header_or_nav,
                existing.in_footer || candidate.in_footer,
                existing.in_partner_section || candidate.in_partner_section,
                existing.in_hero || candidate.in_hero,
            );
            let brand = existing.brand_match_score.max(candidate.brand_match_score);
            if replace {
                *existing = candidate;
            }
            existing.in_header_or_nav = flags.0;
            existing.in_footer = flags.1;
            existing.in_partner_section = flags.2;
            existing.in_hero = flags.3;
            existing.brand_match_score = brand;
        } else {
            merged.push(candidate);
        }
    }
    merged
}

fn richness(c: &ImageCandidate) -> u32 {
    let mut score = 0;
    if !c.alt.is_empty() {
        score += 1;
    }
    if c.width.is_some() && c.height.is_some() {
        score += 1;
    }
    score
}

/// Final per-page filter: drop data URIs (inline SVG excepted — it is the
/// strongest logo source and only exists as serialized markup), placeholder
/// paths, and images known to be under 50×50.
fn keep_candidate(c: &ImageCandidate) -> bool {
    if c.url.starts_with("data:") && c.source != SourceType::InlineSvg {
        debug!(url = %c.url.chars().take(40).collect::<String>(), "dropping data-uri image");
        return false;
    }
    if matches_any(&c.url, PLACEHOLDER_PATHS) {
        return false;
    }
    if let (Some(w), Some(h)) = (c.width, c.height) {
        if w < MIN_KEPT_DIM && h < MIN_KEPT_DIM && c.role != ImageRole::Logo {
            return false;
        }
    }
    true
}

fn resolve_url(raw: &str, base: &Url) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with("data:") {
        return Some(trimmed.to_string());
    }
    base.join(trimmed).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(url: &str, width: Option<u32>, height: Option<u32>) -> ImageCandidate {
        ImageCandidate {
            url: url.to_string(),
            alt: String::new(),
            title: String::new(),
            width,
            height,
            source: SourceType::HtmlImg,
            in_header_or_nav: false,
            in_footer: false,
            in_partner_section: false,
            in_hero: false,
            brand_match_score: 0,
            role: ImageRole::Other,
            priority: 0.0,
        }
    }

    #[test]
    fn test_oversized_never_logo() {
        let mut c = candidate("https://example.com/header-logo.png", Some(800), Some(600));
        c.in_header_or_nav = true;
        c.brand_match_score = 2;
        let role = classify_role(&c, PageKind::Main, "");
        assert_ne!(role, ImageRole::Logo);
        assert_eq!(role, ImageRole::Photo);
    }

    #[test]
    fn test_oversized_in_hero_is_hero() {
        let mut c = candidate("https://example.com/banner.jpg", Some(1200), Some(800));
        c.in_hero = true;
        assert_eq!(classify_role(&c, PageKind::Main, ""), ImageRole::Hero);
    }

    #[test]
    fn test_header_logo() {
        let mut c = candidate("https://example.com/logo.png", Some(120), Some(40));
        c.in_header_or_nav = true;
        c.alt = "Acme Logo".into();
        assert_eq!(classify_role(&c, PageKind::Main, ""), ImageRole::Logo);
    }

    #[test]
    fn test_social_icon() {
        let c = candidate("https://example.com/icons/facebook.svg", Some(32), Some(32));
        assert_eq!(classify_role(&c, PageKind::Main, ""), ImageRole::SocialIcon);
    }

    #[test]
    fn test_platform_badge_small_vs_large() {
        let small = candidate("https://cdn.shopify.com/powered-by-badge.png", Some(90), Some(30));
        assert_eq!(
            classify_role(&small, PageKind::Main, ""),
            ImageRole::PlatformLogo
        );
        // Large CDN-served image with a logo-ish name is ordinary content.
        let large = candidate("https://cdn.shopify.com/brand-logo.png", Some(380), Some(380));
        let role = classify_role(&large, PageKind::Main, "");
        assert_ne!(role, ImageRole::PlatformLogo);
    }

    #[test]
    fn test_partner_section() {
        let mut c = candidate("https://example.com/other.png", Some(100), Some(100));
        c.in_partner_section = true;
        assert_eq!(classify_role(&c, PageKind::Main, ""), ImageRole::PartnerLogo);
    }

    #[test]
    fn test_team_page_portrait() {
        let mut c = candidate("https://example.com/people/jane.jpg", Some(300), Some(300));
        c.alt = "Jane, founder".into();
        assert_eq!(
            classify_role(&c, PageKind::TeamOrAbout, ""),
            ImageRole::Team
        );
    }

    #[test]
    fn test_ui_icon_override() {
        let c = candidate("https://example.com/img/search.svg", Some(24), Some(24));
        assert_eq!(classify_role(&c, PageKind::Main, ""), ImageRole::UiIcon);
        // A logo keyword suppresses the override.
        let c2 = candidate("https://example.com/img/search-logo.svg", Some(24), Some(24));
        assert_eq!(classify_role(&c2, PageKind::Main, ""), ImageRole::Logo);
    }

    #[test]
    fn test_nav_ui_icon_never_logo() {
        // Nav-bar utility glyphs satisfy the header test but must stay icons.
        for name in ["search.svg", "cart.svg", "hamburger.svg"] {
            let mut c = candidate(&format!("https://example.com/icons/{name}"), Some(24), Some(24));
            c.in_header_or_nav = true;
            assert_eq!(
                classify_role(&c, PageKind::Main, ""),
                ImageRole::UiIcon,
                "{name} in nav"
            );
        }
        // A brand match keeps a small header image a logo.
        let mut branded = candidate("https://example.com/icons/acme-mark.svg", Some(24), Some(24));
        branded.in_header_or_nav = true;
        branded.brand_match_score = 1;
        assert_eq!(classify_role(&branded, PageKind::Main, ""), ImageRole::Logo);
    }

    #[test]
    fn test_brand_hostname_does_not_match_every_image() {
        assert_eq!(
            brand_match("https://acme.test/photos/office.jpg", "", "", Some("Acme")),
            0
        );
        assert_eq!(
            brand_match("https://acme.test/acme-logo.svg", "", "", Some("Acme")),
            1
        );
    }

    #[test]
    fn test_classification_is_pure() {
        let mut c = candidate("https://example.com/logo.svg", Some(200), Some(80));
        c.in_header_or_nav = true;
        let a = classify_role(&c, PageKind::Main, "");
        let b = classify_role(&c, PageKind::Main, "");
        assert_eq!(a, b);
        assert_eq!(
            priority_score(&c, PageKind::Main),
            priority_score(&c, PageKind::Main)
        );
    }

    #[test]
    fn test_brand_match_score() {
        assert_eq!(
            brand_match(
                "https://example.com/assets/acme-logo.png",
                "Acme Logo",
                "",
                Some("Acme")
            ),
            2
        );
        assert_eq!(
            brand_match("https://example.com/photo.jpg", "", "", Some("Acme")),
            0
        );
        assert_eq!(brand_match("https://example.com/a.png", "Acme", "", None), 0);
    }

    #[test]
    fn test_infer_brand_name_order() {
        assert_eq!(
            infer_brand_name(Some("Acme Inc"), "ignored", &[]),
            Some("Acme Inc".into())
        );
        assert_eq!(
            infer_brand_name(None, "Acme | Home of Widgets", &[]),
            Some("Acme".into())
        );
        assert_eq!(
            infer_brand_name(None, "", &["Welcome to Acme".to_string()]),
            Some("Welcome to Acme".into())
        );
        assert_eq!(infer_brand_name(None, "", &[]), None);
    }

    #[test]
    fn test_merge_duplicates_keeps_richer() {
        let mut a = candidate("https://example.com/logo.png", None, None);
        a.source = SourceType::CssBackground;
        let mut b = candidate("https://example.com/logo.png", Some(120), Some(40));
        b.alt = "Acme".into();
        b.in_header_or_nav = true;
        let merged = merge_duplicates(vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].alt, "Acme");
        assert!(merged[0].in_header_or_nav);
        assert_eq!(merged[0].width, Some(120));
    }

    #[test]
    fn test_header_logo_with_hero_images_end_to_end() {
        // Typical landing page: one small branded header image, two large
        // hero shots. The full pipeline must yield exactly one logo, at
        // least one hero, and pick the header image as the logo.
        use crate::classify::logo::select_logo;

        let base = Url::parse("https://acme.test/").unwrap();
        let raw = vec![
            RawImage {
                url: "/logo.png".into(),
                alt: "Acme Logo".into(),
                width: Some(140),
                height: Some(48),
                source_type: Some(SourceType::HtmlImg),
                in_header: true,
                ..Default::default()
            },
            RawImage {
                url: "/img/hero-1.jpg".into(),
                width: Some(1200),
                height: Some(800),
                source_type: Some(SourceType::HtmlImg),
                top: Some(120.0),
                viewport_height: Some(900.0),
                ..Default::default()
            },
            RawImage {
                url: "/img/hero-2.jpg".into(),
                width: Some(1200),
                height: Some(800),
                source_type: Some(SourceType::HtmlImg),
                top: Some(400.0),
                viewport_height: Some(900.0),
                ..Default::default()
            },
        ];

        let candidates = build_candidates(raw, &base, Some("Acme"), PageKind::Main);
        let logos: Vec<_> = candidates
            .iter()
            .filter(|c| c.role == ImageRole::Logo)
            .collect();
        assert_eq!(logos.len(), 1);
        assert!(logos[0].url.ends_with("/logo.png"));
        assert!(candidates.iter().any(|c| c.role == ImageRole::Hero));

        let (selected, _) = select_logo(&candidates);
        let selected = selected.unwrap();
        assert_eq!(selected.url, "https://acme.test/logo.png");
        assert!(!selected.fallback);
    }

    #[test]
    fn test_build_candidates_filters_and_caps() {
        let base = Url::parse("https://example.com/").unwrap();
        let mut raw = vec![
            RawImage {
                url: "/tiny.png".into(),
                width: Some(10),
                height: Some(10),
                source_type: Some(SourceType::HtmlImg),
                ..Default::default()
            },
            RawImage {
                url: "/assets/placeholder.png".into(),
                width: Some(400),
                height: Some(300),
                source_type: Some(SourceType::HtmlImg),
                ..Default::default()
            },
        ];
        for i in 0..20 {
            raw.push(RawImage {
                url: format!("/photos/shot-{i}.jpg"),
                width: Some(640),
                height: Some(480),
                source_type: Some(SourceType::HtmlImg),
                ..Default::default()
            });
        }
        let out = build_candidates(raw, &base, None, PageKind::Main);
        assert_eq!(out.len(), MAX_IMAGES_PER_PAGE);
        assert!(out.iter().all(|c| !c.url.contains("tiny.png")));
        assert!(out.iter().all(|c| !c.url.contains("placeholder")));
    }
}
