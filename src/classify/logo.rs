//! Job-level logo selection.
//!
//! Runs once per job over every page's candidates. Primary sources (inline
//! SVG, CSS backgrounds, `<img>`) are preferred; Open Graph and favicon
//! candidates only enter the pool when no primary logo-role candidate exists.

use tracing::debug;

use crate::types::{ImageCandidate, ImageRole, SelectedLogo, SourceType};

/// Candidates under this max dimension are too small to be a usable logo.
pub const MIN_LOGO_DIM: u32 = 40;
/// Upper bound of the size band that earns a positive size score.
pub const IDEAL_LOGO_MAX_DIM: u32 = 500;
/// How many ranked logos to keep (best + alternates).
pub const MAX_SELECTED: usize = 2;

/// Score one candidate for logo selection.
pub fn logo_score(c: &ImageCandidate) -> f32 {
    let mut score = 0.0;
    if c.in_header_or_nav {
        score += 4.0;
    }
    if c.in_hero {
        score += 2.0;
    }
    score += 2.0 * c.brand_match_score as f32;
    if c.role == ImageRole::Logo {
        score += 2.0;
    }
    if c.in_partner_section {
        score -= 5.0;
    }
    match c.max_dimension() {
        Some(d) if d < MIN_LOGO_DIM => score -= 2.0,
        Some(d) if d <= IDEAL_LOGO_MAX_DIM => score += 1.0,
        _ => {}
    }
    if is_vector(c) {
        score += 1.0;
    }
    if c.source == SourceType::CssBackground {
        score += 0.5;
    }
    score
}

fn is_vector(c: &ImageCandidate) -> bool {
    c.source == SourceType::InlineSvg
        || c.url.to_lowercase().split('?').next().is_some_and(|p| p.ends_with(".svg"))
        || c.url.starts_with("data:image/svg")
}

/// Select the best logo (and up to one alternate) across all pages.
///
/// Returns `None` only when there were no candidates at all. When every
/// candidate fails the filters, the single best raw candidate is returned
/// flagged as a fallback selection.
pub fn select_logo(all_images: &[ImageCandidate]) -> (Option<SelectedLogo>, Vec<String>) {
    let primary_pool: Vec<&ImageCandidate> = all_images
        .iter()
        .filter(|c| c.role == ImageRole::Logo && !c.source.is_fallback_source())
        .collect();
    let pool: Vec<&ImageCandidate> = if primary_pool.is_empty() {
        all_images
            .iter()
            .filter(|c| c.role == ImageRole::Logo && c.source.is_fallback_source())
            .collect()
    } else {
        primary_pool
    };

    let mut filtered: Vec<(&ImageCandidate, f32)> = pool
        .iter()
        .filter(|c| {
            !matches!(
                c.role,
                ImageRole::PartnerLogo | ImageRole::PlatformLogo | ImageRole::SocialIcon
            ) && !c.in_partner_section
        })
        .filter(|c| c.max_dimension().map_or(true, |d| d >= MIN_LOGO_DIM))
        .map(|c| (*c, logo_score(c)))
        .collect();

    filtered.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    if let Some((best, score)) = filtered.first() {
        let alternates = filtered
            .iter()
            .skip(1)
            .take(MAX_SELECTED - 1)
            .map(|(c, _)| c.url.clone())
            .collect();
        return (
            Some(SelectedLogo {
                url: best.url.clone(),
                score: *score,
                fallback: false,
            }),
            alternates,
        );
    }

    // Nothing passed the filters. Fall back to the single best raw candidate
    // so downstream consumers still get something, flagged as degraded.
    let fallback = all_images
        .iter()
        .max_by(|a, b| {
            logo_score(a)
                .partial_cmp(&logo_score(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|c| {
            debug!(url = %c.url, "no logo passed filters, using fallback selection");
            SelectedLogo {
                url: c.url.clone(),
                score: logo_score(c),
                fallback: true,
            }
        });
    (fallback, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageKind;

    fn candidate(url: &str, width: u32, height: u32) -> ImageCandidate {
        ImageCandidate {
            url: url.to_string(),
            alt: String::new(),
            title: String::new(),
            width: Some(width),
            height: Some(height),
            source: SourceType::HtmlImg,
            in_header_or_nav: false,
            in_footer: false,
            in_partner_section: false,
            in_hero: false,
            brand_match_score: 0,
            role: ImageRole::Logo,
            priority: ImageRole::Logo.weight() + PageKind::Main.bonus(),
        }
    }

    #[test]
    fn test_header_brand_candidate_beats_partner_candidate() {
        let mut a = candidate("https://example.com/logo.png", 120, 40);
        a.in_header_or_nav = true;
        a.brand_match_score = 2;
        let mut b = candidate("https://example.com/partner.png", 100, 100);
        b.in_partner_section = true;
        let (selected, _) = select_logo(&[b, a]);
        let selected = selected.unwrap();
        assert_eq!(selected.url, "https://example.com/logo.png");
        assert!(!selected.fallback);
    }

    #[test]
    fn test_vector_bonus() {
        let png = candidate("https://example.com/logo.png", 120, 40);
        let svg = candidate("https://example.com/logo.svg", 120, 40);
        assert!(logo_score(&svg) > logo_score(&png));
    }

    #[test]
    fn test_tiny_candidates_filtered_then_fallback() {
        let tiny = candidate("https://example.com/mini-logo.png", 16, 16);
        let (selected, alternates) = select_logo(&[tiny]);
        let selected = selected.unwrap();
        assert!(selected.fallback);
        assert!(alternates.is_empty());
    }

    #[test]
    fn test_favicon_used_only_without_primary() {
        let mut favicon = candidate("https://example.com/favicon.png", 180, 180);
        favicon.source = SourceType::Favicon;
        let header = {
            let mut c = candidate("https://example.com/logo.svg", 140, 48);
            c.in_header_or_nav = true;
            c
        };
        let (with_primary, _) = select_logo(&[favicon.clone(), header]);
        assert_eq!(with_primary.unwrap().url, "https://example.com/logo.svg");

        let (without_primary, _) = select_logo(&[favicon]);
        let sel = without_primary.unwrap();
        assert_eq!(sel.url, "https://example.com/favicon.png");
        assert!(!sel.fallback);
    }

    #[test]
    fn test_no_candidates() {
        let (selected, alternates) = select_logo(&[]);
        assert!(selected.is_none());
        assert!(alternates.is_empty());
    }
}
