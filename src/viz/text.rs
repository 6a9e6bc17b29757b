//! Text measurement and truncation.

/// Heuristic: estimate pixel width of text (Plotters has no built-in text measuring).
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as u32
}

/// Truncate to fit `max_px` and add a single ellipsis if needed.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        out.push(ch);
        if estimate_text_width_px(&out, font_px) > max_px {
            out.pop();
            break;
        }
    }
    // Make room for the ellipsis.
    while !out.is_empty() && estimate_text_width_px(&format!("{out}…"), font_px) > max_px {
        out.pop();
    }
    if out.is_empty() {
        return text.chars().take(1).collect();
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_scales_with_length_and_size() {
        assert_eq!(estimate_text_width_px("", 14), 0);
        assert!(estimate_text_width_px("abcd", 14) > estimate_text_width_px("ab", 14));
        assert!(estimate_text_width_px("abcd", 20) > estimate_text_width_px("abcd", 10));
    }

    #[test]
    fn truncation_adds_ellipsis_only_when_needed() {
        assert_eq!(truncate_to_width("short", 10, 500), "short");
        let t = truncate_to_width("a considerably longer category name", 10, 60);
        assert!(t.ends_with('…'));
        assert!(estimate_text_width_px(&t, 10) <= 60);
    }
}
