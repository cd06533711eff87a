//! Right-to-left script shaping
//!
//! Converts Arabic text from logical order into the visual, contextually
//! joined form a left-to-right glyph placer needs. Built without the
//! `shaping` feature the shaper is the identity, which renders readable but
//! unjoined, logically ordered text.

/// Whether this build actually shapes right-to-left text.
pub const SHAPING_AVAILABLE: bool = cfg!(feature = "shaping");

/// Shape `text` for visual placement. Empty input is returned as-is.
pub fn shape_rtl(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    shape_impl(text)
}

#[cfg(feature = "shaping")]
fn shape_impl(text: &str) -> String {
    // Joining picks presentation forms in logical order; bidi then flips it.
    let joined = ar_reshaper::reshape_line(text);
    reorder(&joined)
}

#[cfg(not(feature = "shaping"))]
fn shape_impl(text: &str) -> String {
    text.to_string()
}

#[cfg(feature = "shaping")]
fn reorder(text: &str) -> String {
    use unicode_bidi::BidiInfo;

    let info = BidiInfo::new(text, None);
    let mut out = String::with_capacity(text.len());
    for para in &info.paragraphs {
        let line = para.range.clone();
        out.push_str(&info.reorder_line(para, line));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stays_empty() {
        assert_eq!(shape_rtl(""), "");
    }

    #[cfg(feature = "shaping")]
    #[test]
    fn test_shaped_is_visual_order() {
        // seen, lam-alef ligature, final meem; reversed for left-to-right placement
        let shaped = shape_rtl("\u{0633}\u{0644}\u{0627}\u{0645}");
        let expected: String = ['\u{FEE1}', '\u{FEFC}', '\u{FEB3}'].iter().collect();
        assert_eq!(shaped, expected);
        assert!(SHAPING_AVAILABLE);
    }

    #[cfg(feature = "shaping")]
    #[test]
    fn test_joined_letters_leave_base_block() {
        let shaped = shape_rtl("\u{0641}\u{0644}\u{0627}\u{0641}\u{0644}");
        assert!(shaped.chars().all(|c| !('\u{0600}'..='\u{06FF}').contains(&c)));
    }

    #[cfg(feature = "shaping")]
    #[test]
    fn test_latin_passes_through_bidi() {
        assert_eq!(shape_rtl("Hummus"), "Hummus");
    }

    #[cfg(not(feature = "shaping"))]
    #[test]
    fn test_degraded_mode_is_identity() {
        let text = "\u{0633}\u{0644}\u{0627}\u{0645}";
        assert_eq!(shape_rtl(text), text);
        assert!(!SHAPING_AVAILABLE);
    }
}
