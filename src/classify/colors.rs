//! Color palette extraction: UI-first weighted votes, screenshot
//! quantization fallback, perceptual filtering, and ranking.
//!
//! All numeric cutoffs here are tuned heuristics. Only the relative ordering
//! of vote weights is meaningful.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::types::{ColorCandidate, ColorOrigin, Palette};

/// Votes closer than this (euclidean RGB) merge into one candidate.
pub const MERGE_DISTANCE: f32 = 15.0;
/// Average channel value below this is near-black.
pub const NEAR_BLACK: u32 = 15;
/// Average channel value above this is near-white.
pub const NEAR_WHITE: u32 = 245;
/// Final palette size cap.
pub const MAX_PALETTE: usize = 6;
/// Minimum colors a palette must carry; padded from the fallback if short.
pub const MIN_PALETTE: usize = 3;

/// Neutral fallback palette used when extraction yields nothing usable.
pub const FALLBACK_PALETTE: [&str; 3] = ["#334155", "#64748B", "#94A3B8"];

#[derive(Debug, Deserialize)]
struct RawVote {
    value: String,
    #[serde(default = "default_weight")]
    weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

/// Parse the UI extractor output into normalized weighted votes.
pub fn votes_from_ui(raw: &serde_json::Value) -> Vec<ColorCandidate> {
    let Ok(votes) = serde_json::from_value::<Vec<RawVote>>(raw.clone()) else {
        return Vec::new();
    };
    votes
        .into_iter()
        .filter_map(|v| {
            let hex = normalize_color(&v.value)?;
            Some(ColorCandidate {
                hex,
                weight: v.weight.max(0.1),
                origin: ColorOrigin::Ui,
            })
        })
        .collect()
}

/// Normalize a CSS color value to uppercase `#RRGGBB`.
///
/// Handles 3/6/8-digit hex (alpha stripped) and `rgb()`/`rgba()`; fully
/// transparent values and anything else return `None`.
pub fn normalize_color(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(hex) = value.strip_prefix('#') {
        let hex = hex.trim();
        return match hex.len() {
            3 => {
                let expanded: String = hex
                    .chars()
                    .flat_map(|c| [c, c])
                    .collect();
                valid_hex(&expanded)
            }
            6 => valid_hex(hex),
            8 => valid_hex(&hex[..6]),
            _ => None,
        };
    }

    static RGB_RE: OnceLock<Regex> = OnceLock::new();
    let re = RGB_RE.get_or_init(|| {
        Regex::new(r"(?i)rgba?\(\s*(\d+)[,\s]+(\d+)[,\s]+(\d+)(?:[,\s/]+([0-9.]+%?))?\s*\)")
            .expect("rgb regex")
    });
    let caps = re.captures(value)?;
    let r: u32 = caps[1].parse().ok()?;
    let g: u32 = caps[2].parse().ok()?;
    let b: u32 = caps[3].parse().ok()?;
    if r > 255 || g > 255 || b > 255 {
        return None;
    }
    if let Some(alpha) = caps.get(4) {
        let a = alpha.as_str().trim_end_matches('%');
        if let Ok(a) = a.parse::<f32>() {
            let a = if alpha.as_str().ends_with('%') { a / 100.0 } else { a };
            if a < 0.1 {
                return None;
            }
        }
    }
    Some(format!("#{r:02X}{g:02X}{b:02X}"))
}

fn valid_hex(hex: &str) -> Option<String> {
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("#{}", hex.to_uppercase()))
    } else {
        None
    }
}

fn rgb_of(hex: &str) -> (u32, u32, u32) {
    let h = hex.trim_start_matches('#');
    let r = u32::from_str_radix(&h[0..2], 16).unwrap_or(0);
    let g = u32::from_str_radix(&h[2..4], 16).unwrap_or(0);
    let b = u32::from_str_radix(&h[4..6], 16).unwrap_or(0);
    (r, g, b)
}

fn distance(a: &str, b: &str) -> f32 {
    let (r1, g1, b1) = rgb_of(a);
    let (r2, g2, b2) = rgb_of(b);
    let dr = r1 as f32 - r2 as f32;
    let dg = g1 as f32 - g2 as f32;
    let db = b1 as f32 - b2 as f32;
    (dr * dr + dg * dg + db * db).sqrt()
}

fn brightness(hex: &str) -> u32 {
    let (r, g, b) = rgb_of(hex);
    (r + g + b) / 3
}

fn saturation(hex: &str) -> f32 {
    let (r, g, b) = rgb_of(hex);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max == 0 {
        0.0
    } else {
        (max - min) as f32 / max as f32
    }
}

/// Warm brown/beige tones typical of icon-pack fills: descending red > green
/// > blue channels within a moderate spread.
fn is_brownish(hex: &str) -> bool {
    let (r, g, b) = rgb_of(hex);
    r > g && g > b && r >= 120 && r <= 235 && (r - b) >= 30 && (r - b) <= 130
}

/// Colors that usually come from photo content rather than brand UI:
/// skin tones, sky blues, and over-saturated clothing hues.
fn is_photo_artifact(hex: &str) -> bool {
    let (r, g, b) = rgb_of(hex);
    let skin = r > 180 && g > 130 && b > 100 && r > g && g > b && (r - b) < 90;
    let sky = b > 190 && g > 170 && r < 160;
    let oversaturated = saturation(hex) > 0.92 && (60..=200).contains(&brightness(hex));
    skin || sky || oversaturated
}

/// Colors excluded unconditionally.
fn hard_excluded(hex: &str) -> bool {
    let bright = brightness(hex);
    if bright < NEAR_BLACK || bright > NEAR_WHITE {
        return true;
    }
    // Low-saturation mid-brightness grays.
    if saturation(hex) < 0.10 && (30..=225).contains(&bright) {
        return true;
    }
    is_brownish(hex)
}

/// Merge nearby candidates, filter, and rank by total vote weight.
pub fn filter_and_rank(votes: Vec<ColorCandidate>) -> Vec<String> {
    // Aggregate identical hexes first.
    let mut by_hex: HashMap<String, f32> = HashMap::new();
    for vote in &votes {
        *by_hex.entry(vote.hex.clone()).or_insert(0.0) += vote.weight;
    }
    let mut aggregated: Vec<(String, f32)> = by_hex.into_iter().collect();
    aggregated.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    // Greedy merge: a candidate within MERGE_DISTANCE of a stronger one
    // contributes its weight to that one.
    let mut merged: Vec<(String, f32)> = Vec::new();
    for (hex, weight) in aggregated {
        if let Some(existing) = merged
            .iter_mut()
            .find(|(kept, _)| distance(kept, &hex) <= MERGE_DISTANCE)
        {
            existing.1 += weight;
        } else {
            merged.push((hex, weight));
        }
    }
    merged.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    let mut accepted: Vec<String> = Vec::new();
    for (hex, _) in merged {
        if hard_excluded(&hex) {
            continue;
        }
        if accepted.len() >= MIN_PALETTE && is_photo_artifact(&hex) {
            continue;
        }
        accepted.push(hex);
    }
    accepted
}

/// Build the final palette. Never returns fewer than `MIN_PALETTE` colors:
/// fallback neutrals pad any shortfall, and the palette is flagged when they
/// do.
pub fn build_palette(votes: Vec<ColorCandidate>) -> Palette {
    let mut colors = filter_and_rank(votes);
    let mut fallback = false;
    if colors.len() < MIN_PALETTE {
        debug!(found = colors.len(), "padding palette from fallback neutrals");
        fallback = true;
        for neutral in FALLBACK_PALETTE {
            if colors.len() >= MIN_PALETTE {
                break;
            }
            if !colors.iter().any(|c| c == neutral) {
                colors.push(neutral.to_string());
            }
        }
    }
    colors.truncate(MAX_PALETTE);

    Palette {
        primary: colors[0].clone(),
        secondary: colors.get(1).cloned(),
        accent: colors.get(2).cloned(),
        colors,
        fallback,
    }
}

/// Quantize a full-viewport PNG screenshot into representative swatches:
/// dominant, vibrant, muted, dark, and light.
pub fn quantize_screenshot(png: &[u8]) -> Result<Vec<ColorCandidate>> {
    let img = image::load_from_memory(png)
        .map_err(|e| EngineError::Extraction(format!("screenshot decode: {e}")))?;
    let thumb = img.thumbnail(64, 64).to_rgba8();

    // Bucket into 4 bits per channel.
    let mut bins: HashMap<(u8, u8, u8), (u64, u64, u64, u64)> = HashMap::new();
    for pixel in thumb.pixels() {
        let [r, g, b, a] = pixel.0;
        if a < 128 {
            continue;
        }
        let key = (r >> 4, g >> 4, b >> 4);
        let entry = bins.entry(key).or_insert((0, 0, 0, 0));
        entry.0 += 1;
        entry.1 += r as u64;
        entry.2 += g as u64;
        entry.3 += b as u64;
    }
    if bins.is_empty() {
        return Err(EngineError::Extraction("screenshot had no opaque pixels".into()));
    }

    let mut swatches: Vec<(String, u64)> = bins
        .into_values()
        .map(|(count, r, g, b)| {
            let hex = format!(
                "#{:02X}{:02X}{:02X}",
                (r / count) as u8,
                (g / count) as u8,
                (b / count) as u8
            );
            (hex, count)
        })
        .collect();
    swatches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let pick = |pred: &dyn Fn(&str) -> bool| -> Option<String> {
        swatches
            .iter()
            .find(|(hex, _)| pred(hex))
            .map(|(hex, _)| hex.clone())
    };

    let dominant = swatches.first().map(|(hex, _)| hex.clone());
    let vibrant = pick(&|hex| saturation(hex) > 0.5 && (80..=210).contains(&brightness(hex)));
    let muted = pick(&|hex| {
        let s = saturation(hex);
        s > 0.1 && s < 0.4 && (70..=200).contains(&brightness(hex))
    });
    let dark = pick(&|hex| (NEAR_BLACK..76).contains(&brightness(hex)));
    let light = pick(&|hex| (205..=NEAR_WHITE).contains(&brightness(hex)));

    let weighted = [
        (dominant, 2.0f32),
        (vibrant, 1.5),
        (muted, 1.0),
        (dark, 0.8),
        (light, 0.8),
    ];
    let mut out: Vec<ColorCandidate> = Vec::new();
    for (swatch, weight) in weighted {
        if let Some(hex) = swatch {
            if !out.iter().any(|c| c.hex == hex) {
                out.push(ColorCandidate {
                    hex,
                    weight,
                    origin: ColorOrigin::Screenshot,
                });
            }
        }
    }
    Ok(out)
}

/// Append screenshot swatches to UI votes, skipping hexes already voted for.
pub fn append_screenshot_votes(votes: &mut Vec<ColorCandidate>, swatches: Vec<ColorCandidate>) {
    for swatch in swatches {
        if !votes.iter().any(|v| v.hex == swatch.hex) {
            votes.push(swatch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui(hex: &str, weight: f32) -> ColorCandidate {
        ColorCandidate {
            hex: hex.to_string(),
            weight,
            origin: ColorOrigin::Ui,
        }
    }

    #[test]
    fn test_normalize_color_forms() {
        assert_eq!(normalize_color("#1e40af"), Some("#1E40AF".into()));
        assert_eq!(normalize_color("#abc"), Some("#AABBCC".into()));
        assert_eq!(normalize_color("#1E40AFCC"), Some("#1E40AF".into()));
        assert_eq!(normalize_color("rgb(30, 64, 175)"), Some("#1E40AF".into()));
        assert_eq!(
            normalize_color("rgba(30, 64, 175, 0.8)"),
            Some("#1E40AF".into())
        );
        assert_eq!(normalize_color("rgba(0, 0, 0, 0)"), None);
        assert_eq!(normalize_color("transparent"), None);
        assert_eq!(normalize_color(""), None);
    }

    #[test]
    fn test_filtering_excludes_black_white_and_merges_blues() {
        let votes = vec![
            ui("#000000", 5.0),
            ui("#FFFFFF", 5.0),
            ui("#1E40AF", 3.0),
            ui("#1E41B0", 2.0),
        ];
        let ranked = filter_and_rank(votes);
        assert_eq!(ranked, vec!["#1E40AF".to_string()]);
    }

    #[test]
    fn test_gray_and_brown_excluded() {
        let votes = vec![ui("#808080", 5.0), ui("#A67B4F", 5.0), ui("#E11D48", 1.0)];
        let ranked = filter_and_rank(votes);
        assert_eq!(ranked, vec!["#E11D48".to_string()]);
    }

    #[test]
    fn test_photo_artifacts_dropped_only_after_three_kept() {
        // Sky blue is kept while fewer than three colors are retained.
        let few = vec![ui("#1E40AF", 5.0), ui("#9BD7F5", 2.0)];
        let ranked = filter_and_rank(few);
        assert!(ranked.contains(&"#9BD7F5".to_string()));

        let many = vec![
            ui("#1E40AF", 9.0),
            ui("#E11D48", 8.0),
            ui("#047857", 7.0),
            ui("#9BD7F5", 1.0),
        ];
        let ranked = filter_and_rank(many);
        assert_eq!(ranked.len(), 3);
        assert!(!ranked.contains(&"#9BD7F5".to_string()));
    }

    #[test]
    fn test_palette_never_empty() {
        let palette = build_palette(Vec::new());
        assert!(palette.fallback);
        assert!(palette.colors.len() >= MIN_PALETTE);
        assert_eq!(palette.primary, FALLBACK_PALETTE[0]);
    }

    #[test]
    fn test_palette_slots_from_positions() {
        let votes = vec![
            ui("#1E40AF", 9.0),
            ui("#E11D48", 8.0),
            ui("#047857", 7.0),
            ui("#7C3AED", 6.0),
        ];
        let palette = build_palette(votes);
        assert!(!palette.fallback);
        assert_eq!(palette.primary, "#1E40AF");
        assert_eq!(palette.secondary.as_deref(), Some("#E11D48"));
        assert_eq!(palette.accent.as_deref(), Some("#047857"));
        assert!(palette.colors.len() <= MAX_PALETTE);
    }

    #[test]
    fn test_quantize_rejects_garbage() {
        assert!(quantize_screenshot(b"not a png").is_err());
    }

    #[test]
    fn test_quantize_single_color_image() {
        use image::{ImageBuffer, Rgba};
        let img = ImageBuffer::from_pixel(32, 32, Rgba([30u8, 64, 175, 255]));
        let mut png = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut png),
            image::ImageFormat::Png,
        )
        .unwrap();
        let swatches = quantize_screenshot(&png).unwrap();
        assert!(!swatches.is_empty());
        assert_eq!(swatches[0].hex, "#1E40AF");
        assert_eq!(swatches[0].origin, ColorOrigin::Screenshot);
    }

    #[test]
    fn test_append_screenshot_votes_skips_existing() {
        let mut votes = vec![ui("#1E40AF", 5.0)];
        append_screenshot_votes(
            &mut votes,
            vec![
                ColorCandidate {
                    hex: "#1E40AF".into(),
                    weight: 2.0,
                    origin: ColorOrigin::Screenshot,
                },
                ColorCandidate {
                    hex: "#E11D48".into(),
                    weight: 2.0,
                    origin: ColorOrigin::Screenshot,
                },
            ],
        );
        assert_eq!(votes.len(), 2);
    }
}
