//! Typography detection from computed font-family tallies.

use std::collections::HashMap;

use serde::Deserialize;

use crate::types::{FontSource, TypographyResult};

/// Generic CSS fallback keywords that are never a real brand font.
const GENERIC_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
    "ui-sans-serif",
    "ui-serif",
    "ui-monospace",
    "-apple-system",
    "blinkmacsystemfont",
    "inherit",
    "initial",
    "unset",
];

/// Families commonly served by hosted font services (Google Fonts, Adobe
/// Fonts, Bunny). Matching one of these marks the typography source as a
/// known service.
const KNOWN_HOSTED_FAMILIES: &[&str] = &[
    "inter",
    "roboto",
    "open sans",
    "lato",
    "montserrat",
    "poppins",
    "raleway",
    "nunito",
    "playfair display",
    "merriweather",
    "source sans pro",
    "source sans 3",
    "work sans",
    "oswald",
    "dm sans",
    "rubik",
    "karla",
    "manrope",
    "mulish",
    "quicksand",
    "josefin sans",
    "libre franklin",
    "figtree",
    "outfit",
    "space grotesk",
];

/// Raw tallies from the in-page typography extractor.
#[derive(Debug, Default, Deserialize)]
pub struct RawTypography {
    #[serde(default)]
    pub headings: HashMap<String, u32>,
    #[serde(default)]
    pub body: HashMap<String, u32>,
}

/// Resolve the typography result from raw tallies: most frequent non-generic
/// family per group, cross-filled when one group is empty.
pub fn detect_typography(raw: &serde_json::Value) -> TypographyResult {
    let raw: RawTypography = serde_json::from_value(raw.clone()).unwrap_or_default();

    let mut heading = top_family(&raw.headings);
    let mut body = top_family(&raw.body);

    // Cross-fill: a site with only one detectable family uses it everywhere.
    if heading.is_none() {
        heading = body.clone();
    }
    if body.is_none() {
        body = heading.clone();
    }

    let source = match (&heading, &body) {
        (Some(h), _) if is_known_service(h) => FontSource::KnownService,
        (_, Some(b)) if is_known_service(b) => FontSource::KnownService,
        _ => FontSource::Custom,
    };

    TypographyResult {
        heading_font: heading,
        body_font: body,
        source,
    }
}

fn top_family(tally: &HashMap<String, u32>) -> Option<String> {
    tally
        .iter()
        .filter(|(family, _)| !is_generic(family))
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(family, _)| family.clone())
}

fn is_generic(family: &str) -> bool {
    let lower = family.trim().to_lowercase();
    lower.is_empty() || GENERIC_FAMILIES.contains(&lower.as_str())
}

fn is_known_service(family: &str) -> bool {
    let lower = family.trim().to_lowercase();
    KNOWN_HOSTED_FAMILIES.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_most_frequent_per_group() {
        let raw = json!({
            "headings": {"Playfair Display": 3, "Georgia": 1},
            "body": {"Inter": 10, "Arial": 2}
        });
        let result = detect_typography(&raw);
        assert_eq!(result.heading_font.as_deref(), Some("Playfair Display"));
        assert_eq!(result.body_font.as_deref(), Some("Inter"));
        assert_eq!(result.source, FontSource::KnownService);
    }

    #[test]
    fn test_generic_families_excluded() {
        let raw = json!({
            "headings": {"sans-serif": 9, "Custom Grotesk": 1},
            "body": {"system-ui": 5}
        });
        let result = detect_typography(&raw);
        assert_eq!(result.heading_font.as_deref(), Some("Custom Grotesk"));
        // Body had only generic families, so it cross-fills from headings.
        assert_eq!(result.body_font.as_deref(), Some("Custom Grotesk"));
        assert_eq!(result.source, FontSource::Custom);
    }

    #[test]
    fn test_cross_fill_headings_from_body() {
        let raw = json!({
            "headings": {},
            "body": {"Roboto": 4}
        });
        let result = detect_typography(&raw);
        assert_eq!(result.heading_font.as_deref(), Some("Roboto"));
        assert_eq!(result.body_font.as_deref(), Some("Roboto"));
    }

    #[test]
    fn test_empty_input() {
        let result = detect_typography(&json!({}));
        assert!(result.heading_font.is_none());
        assert!(result.body_font.is_none());
        assert_eq!(result.source, FontSource::Custom);
    }

    #[test]
    fn test_malformed_input_degrades() {
        let result = detect_typography(&json!("nonsense"));
        assert!(result.heading_font.is_none());
    }
}
