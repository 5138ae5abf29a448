//! Ayu color theme and styling functions for essence CLI output.
//!
//! Uses the Ayu Dark color palette. Color source:
//! <https://github.com/ayu-theme/ayu-colors>
//!
//! Only states that call for a decision get color: absolute
//! contraindications, exceeded exposure ratios, CMR and phototoxic flags.
//! Small Unicode symbols for icons, NOT emoji blobs.

use essence_core::enums::ContraindicationKind;
use owo_colors::OwoColorize;

use crate::terminal::supports_color;

// ---------------------------------------------------------------------------
// Ayu Dark color palette (RGB values)
// ---------------------------------------------------------------------------

const PASS: (u8, u8, u8) = (0xc2, 0xd9, 0x4c); // #c2d94c - bright green
const WARN: (u8, u8, u8) = (0xff, 0xb4, 0x54); // #ffb454 - bright yellow
const FAIL: (u8, u8, u8) = (0xf0, 0x71, 0x78); // #f07178 - bright red
const MUTED: (u8, u8, u8) = (0x6c, 0x76, 0x80); // #6c7680 - muted gray
const ACCENT: (u8, u8, u8) = (0x59, 0xc2, 0xff); // #59c2ff - bright blue
const FLAG: (u8, u8, u8) = (0xd2, 0xa6, 0xff); // #d2a6ff - purple

// ---------------------------------------------------------------------------
// Icons
// ---------------------------------------------------------------------------

pub const ICON_PASS: &str = "\u{2713}"; // ✓
pub const ICON_WARN: &str = "\u{26A0}"; // ⚠
pub const ICON_FAIL: &str = "\u{2716}"; // ✖
pub const ICON_INFO: &str = "\u{2139}"; // ℹ

/// Wizard step markers.
pub const STEP_DONE: &str = "\u{25CF}"; // ●
pub const STEP_CURRENT: &str = "\u{25D0}"; // ◐
pub const STEP_TODO: &str = "\u{25CB}"; // ○

pub const TREE_CHILD: &str = "\u{23BF} "; // ⎿
pub const TREE_INDENT: &str = "  ";

pub const SEPARATOR_LIGHT: &str = "\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}";

// ---------------------------------------------------------------------------
// Helper: apply truecolor only when color is supported
// ---------------------------------------------------------------------------

fn color_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).to_string()
    } else {
        s.to_string()
    }
}

fn color_bold_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).bold().to_string()
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Core semantic render helpers
// ---------------------------------------------------------------------------

pub fn render_pass(s: &str) -> String {
    color_str(s, PASS)
}

pub fn render_warn(s: &str) -> String {
    color_str(s, WARN)
}

pub fn render_fail(s: &str) -> String {
    color_str(s, FAIL)
}

pub fn render_muted(s: &str) -> String {
    color_str(s, MUTED)
}

pub fn render_accent(s: &str) -> String {
    color_str(s, ACCENT)
}

pub fn render_bold(s: &str) -> String {
    if supports_color() {
        s.bold().to_string()
    } else {
        s.to_string()
    }
}

/// Renders a category header in uppercase with accent color and bold.
pub fn render_category(s: &str) -> String {
    color_bold_str(&s.to_uppercase(), ACCENT)
}

/// Renders the light separator line in muted color.
pub fn render_separator() -> String {
    render_muted(SEPARATOR_LIGHT)
}

pub fn render_pass_icon() -> String {
    color_str(ICON_PASS, PASS)
}

pub fn render_warn_icon() -> String {
    color_str(ICON_WARN, WARN)
}

pub fn render_fail_icon() -> String {
    color_str(ICON_FAIL, FAIL)
}

pub fn render_info_icon() -> String {
    color_str(ICON_INFO, ACCENT)
}

// ---------------------------------------------------------------------------
// Domain renderers
// ---------------------------------------------------------------------------

/// Renders a contraindication severity. Absolute is bold red.
pub fn render_contraindication_kind(kind: ContraindicationKind) -> String {
    match kind {
        ContraindicationKind::Absolute => color_bold_str(kind.label(), FAIL),
        ContraindicationKind::Relative => color_str(kind.label(), WARN),
    }
}

/// Renders an exposure ratio (SED/AEL, budget share) against the limit 1.
///
/// At or above 1 is red, from 0.8 yellow, below that green.
pub fn render_ratio(ratio: f64) -> String {
    let text = format!("{:.2}", ratio);
    if ratio >= 1.0 {
        color_bold_str(&text, FAIL)
    } else if ratio >= 0.8 {
        color_str(&text, WARN)
    } else {
        color_str(&text, PASS)
    }
}

/// Renders a hazard flag (CMR, phototoxic).
pub fn render_flag(s: &str) -> String {
    color_str(s, FLAG)
}

/// Renders one entry of the wizard progress line.
pub fn render_step_marker(number: u8, label: &str, current: u8) -> String {
    let text = format!("{} {}", number, label);
    if number < current {
        format!("{} {}", color_str(STEP_DONE, PASS), render_muted(&text))
    } else if number == current {
        format!("{} {}", color_str(STEP_CURRENT, ACCENT), render_bold(&text))
    } else {
        format!("{} {}", render_muted(STEP_TODO), render_muted(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_keeps_two_decimals() {
        assert!(render_ratio(0.456).contains("0.46"));
        assert!(render_ratio(1.2).contains("1.20"));
    }

    #[test]
    fn contraindication_kind_contains_label() {
        assert!(render_contraindication_kind(ContraindicationKind::Absolute).contains("Absolute"));
        assert!(render_contraindication_kind(ContraindicationKind::Relative).contains("Relative"));
    }

    #[test]
    fn step_marker_uses_state_icons() {
        assert!(render_step_marker(1, "Subject", 2).contains(STEP_DONE));
        assert!(render_step_marker(2, "Oil", 2).contains(STEP_CURRENT));
        assert!(render_step_marker(3, "Application", 2).contains(STEP_TODO));
    }

    #[test]
    fn category_is_uppercased() {
        assert!(render_category("warnings").contains("WARNINGS"));
    }
}
