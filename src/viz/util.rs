//! Utility functions for visualization: palettes, color resolution, unit conversion, tick labels.

use crate::error::{PlotError, Result};
use crate::models::{CategoryColors, Rgb8};
use num_format::{Locale, ToFormattedString};

use super::text::estimate_text_width_px;
use super::types::Palette;

/// Output resolution: figure sizes are given in inches, fonts and widths in points.
pub const DPI: f64 = 100.0;

/// Muted "deep" palette.
const DEEP10: [Rgb8; 10] = [
    Rgb8::new(76, 114, 176),  // blue   (#4C72B0)
    Rgb8::new(221, 132, 82),  // orange (#DD8452)
    Rgb8::new(85, 168, 104),  // green  (#55A868)
    Rgb8::new(196, 78, 82),   // red    (#C44E52)
    Rgb8::new(129, 114, 179), // purple (#8172B3)
    Rgb8::new(147, 120, 96),  // brown  (#937860)
    Rgb8::new(218, 139, 195), // pink   (#DA8BC3)
    Rgb8::new(140, 140, 140), // gray   (#8C8C8C)
    Rgb8::new(204, 185, 116), // olive  (#CCB974)
    Rgb8::new(100, 181, 205), // cyan   (#64B5CD)
];

/// Microsoft Office (2013+) chart series palette.
/// Order: Blue, Orange, Gray, Gold, Light Blue, Green, Dark Blue, Dark Orange, Dark Gray, Brownish Gold.
const OFFICE10: [Rgb8; 10] = [
    Rgb8::new(68, 114, 196),  // blue      (#4472C4)
    Rgb8::new(237, 125, 49),  // orange    (#ED7D31)
    Rgb8::new(165, 165, 165), // gray      (#A5A5A5)
    Rgb8::new(255, 192, 0),   // gold      (#FFC000)
    Rgb8::new(91, 155, 213),  // light blue(#5B9BD5)
    Rgb8::new(112, 173, 71),  // green     (#70AD47)
    Rgb8::new(38, 68, 120),   // dark blue (#264478)
    Rgb8::new(158, 72, 14),   // dark org. (#9E480E)
    Rgb8::new(99, 99, 99),    // dark gray (#636363)
    Rgb8::new(153, 115, 0),   // brownish  (#997300)
];

/// Get a color from a palette; indices wrap around.
#[inline]
pub fn palette_color(palette: Palette, idx: usize) -> Rgb8 {
    let colors: &[Rgb8] = match palette {
        Palette::Deep => &DEEP10,
        Palette::Office => &OFFICE10,
    };
    colors[idx % colors.len()]
}

/// Resolve one color per category, in category order.
///
/// Explicit colors must cover every category; otherwise categories are zipped
/// with the palette by position, so the same order always yields the same colors.
pub fn resolve_category_colors(
    categories: &[String],
    explicit: Option<&CategoryColors>,
    palette: Palette,
) -> Result<Vec<Rgb8>> {
    match explicit {
        Some(map) => categories
            .iter()
            .map(|c| {
                map.get(c).ok_or_else(|| {
                    PlotError::validation(format!("no color given for category '{c}'"))
                })
            })
            .collect(),
        None => Ok((0..categories.len())
            .map(|i| palette_color(palette, i))
            .collect()),
    }
}

/// Points (1/72 inch) to pixels at [`DPI`].
#[inline]
pub fn pt_to_px(pt: f64) -> f64 {
    pt * DPI / 72.0
}

/// Marker radius in pixels for a marker *area* given in points squared.
#[inline]
pub fn marker_radius_px(area_pt2: f64) -> f64 {
    pt_to_px(area_pt2.max(0.0).sqrt() / 2.0)
}

/// Map a user-provided locale tag to a `num_format::Locale` and its decimal separator char.
///
/// Supported tags (case-insensitive): `en`, `us`, `en_US`, `de`, `de_DE`, `german`,
/// `fr`, `es`, `it`, `pt`, `nl`. Defaults to English.
pub fn map_locale(tag: &str) -> (&'static Locale, char) {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => (&Locale::de, ','),
        "fr" | "fr_fr" => (&Locale::fr, ','),
        "es" | "es_es" => (&Locale::es, ','),
        "it" | "it_it" => (&Locale::it, ','),
        "pt" | "pt_pt" | "pt_br" => (&Locale::pt, ','),
        "nl" | "nl_nl" => (&Locale::nl, ','),
        _ => (&Locale::en, '.'), // default
    }
}

/// X tick label: x keys are years or bins, so no digit grouping.
pub fn format_x_tick(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        (v.round() as i64).to_string()
    } else {
        trim_decimals(format!("{v:.2}"))
    }
}

/// Y tick label with locale-aware digit grouping (`30,000` vs `30.000`).
///
/// Two decimals at or above 1, four below, trailing zeros trimmed.
pub fn format_y_tick(v: f64, locale_tag: &str) -> String {
    let (locale, dec_sep) = map_locale(locale_tag);
    if (v - v.round()).abs() < 1e-9 && v.abs() < 1e15 {
        return (v.round() as i64).to_formatted_string(locale);
    }
    let prec = if v.abs() >= 1.0 { 2 } else { 4 };
    let text = trim_decimals(format!("{:.*}", prec, v.abs()));
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let grouped = int_part
        .parse::<i64>()
        .map(|i| i.to_formatted_string(locale))
        .unwrap_or_else(|_| int_part.to_string());
    let sign = if v < 0.0 { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}{dec_sep}{frac_part}")
    }
}

fn trim_decimals(s: String) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Width of the left label area (in pixels) for the given Y tick labels,
/// plus room for a rotated axis title when present.
///
/// Returns a width clamped to a sensible range to avoid extremes.
pub fn compute_left_label_area_px(labels: &[String], font_px: u32, axis_title_px: Option<u32>) -> u32 {
    let max_px = labels
        .iter()
        .map(|s| estimate_text_width_px(s, font_px))
        .max()
        .unwrap_or(0);
    // Tick marks & a little breathing room.
    let ticks = max_px.saturating_add(14).clamp(32, 180);
    match axis_title_px {
        Some(px) => ticks + px + 10,
        None => ticks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_order_is_stable_and_wraps() {
        assert_eq!(palette_color(Palette::Deep, 0).to_hex(), "#4C72B0");
        assert_eq!(palette_color(Palette::Deep, 10), palette_color(Palette::Deep, 0));
        assert_eq!(palette_color(Palette::Office, 1).to_hex(), "#ED7D31");
    }

    #[test]
    fn explicit_colors_must_cover_categories() {
        let cats = vec!["A".to_string(), "B".to_string()];
        let mut map = CategoryColors::default();
        map.insert("A", Rgb8::BLACK);
        let e = resolve_category_colors(&cats, Some(&map), Palette::Deep).unwrap_err();
        assert!(e.is_validation());
        map.insert("B", Rgb8::WHITE);
        let colors = resolve_category_colors(&cats, Some(&map), Palette::Deep).unwrap();
        assert_eq!(colors, vec![Rgb8::BLACK, Rgb8::WHITE]);
    }

    #[test]
    fn tick_labels() {
        assert_eq!(format_x_tick(2020.0), "2020");
        assert_eq!(format_x_tick(2020.5), "2020.5");
        assert_eq!(format_y_tick(30000.0, "en"), "30,000");
        assert_eq!(format_y_tick(30000.0, "de"), "30.000");
        assert_eq!(format_y_tick(1234.5, "de"), "1.234,5");
        assert_eq!(format_y_tick(-0.25, "en"), "-0.25");
        assert_eq!(format_y_tick(12.345, "en"), "12.35");
        assert_eq!(format_y_tick(0.0025, "en"), "0.0025");
        assert_eq!(format_y_tick(0.125, "de"), "0,125");
    }

    #[test]
    fn unit_conversions() {
        assert!((pt_to_px(72.0) - 100.0).abs() < 1e-9);
        assert!((marker_radius_px(36.0) - pt_to_px(3.0)).abs() < 1e-9);
    }
}
