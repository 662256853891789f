//! Deterministic headline decoration for rapid CTR testing.
//!
//! Pure string templates, no learned model; the same base string always
//! produces the same variant set.

use crate::types::Variant;
use chrono::{Datelike, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaitTemplate {
    EmojiPrefix,
    BracketTag,
    YearPrefix,
    UrgencySuffix,
}

impl BaitTemplate {
    pub const ALL: [BaitTemplate; 4] = [
        Self::EmojiPrefix,
        Self::BracketTag,
        Self::YearPrefix,
        Self::UrgencySuffix,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmojiPrefix => "emoji_prefix",
            Self::BracketTag => "bracket_tag",
            Self::YearPrefix => "year_prefix",
            Self::UrgencySuffix => "urgency_suffix",
        }
    }

    #[must_use]
    pub fn apply(&self, base: &str, year: i32) -> String {
        match self {
            Self::EmojiPrefix => format!("\u{1F525} {base}"),
            Self::BracketTag => format!("[Guide] {base}"),
            Self::YearPrefix => format!("{year}: {base}"),
            Self::UrgencySuffix => format!("{base} - Book Today!"),
        }
    }
}

/// Build a labeled variant set for a headline test: the unchanged control
/// plus one variant per template, weights split evenly to sum to 100.
#[must_use]
pub fn generate_bait_variants(base: &str) -> Vec<Variant> {
    let year = Utc::now().year();
    let count = BaitTemplate::ALL.len() + 1;
    let weight = (100 / count) as u8;
    let remainder = (100 % count) as u8;

    // Control absorbs the rounding remainder so the sum stays exactly 100.
    let mut variants = vec![Variant::new("control", "Original", weight + remainder)];
    for template in BaitTemplate::ALL {
        variants.push(
            Variant::new(template.as_str(), template.as_str(), weight)
                .with_text(template.apply(base, year)),
        );
    }
    variants
}

/// Text to serve for a variant: its replacement, or the original unchanged.
#[must_use]
pub fn generate_optimized_content(variant: &Variant, original: &str) -> String {
    variant
        .replacement_text
        .clone()
        .unwrap_or_else(|| original.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn templates_decorate_deterministically() {
        let base = "Crane Rental in Hamburg";
        assert_eq!(
            BaitTemplate::EmojiPrefix.apply(base, 2024),
            "\u{1F525} Crane Rental in Hamburg"
        );
        assert_eq!(
            BaitTemplate::BracketTag.apply(base, 2024),
            "[Guide] Crane Rental in Hamburg"
        );
        assert_eq!(
            BaitTemplate::YearPrefix.apply(base, 2024),
            "2024: Crane Rental in Hamburg"
        );
        assert_eq!(
            BaitTemplate::UrgencySuffix.apply(base, 2024),
            "Crane Rental in Hamburg - Book Today!"
        );
    }

    #[test]
    fn bait_variant_weights_sum_to_exactly_100() {
        let variants = generate_bait_variants("Tower Crane Hire");
        assert_eq!(variants.len(), 5);
        let sum: u32 = variants.iter().map(|v| u32::from(v.weight)).sum();
        assert_eq!(sum, 100);
        assert!(variants[0].replacement_text.is_none());
        assert!(variants[1..].iter().all(|v| v.replacement_text.is_some()));
    }

    #[test]
    fn optimized_content_falls_back_to_original() {
        let control = Variant::new("control", "Original", 50);
        assert_eq!(
            generate_optimized_content(&control, "Old Title"),
            "Old Title"
        );

        let decorated = Variant::new("v1", "Challenger", 50).with_text("New Title");
        assert_eq!(
            generate_optimized_content(&decorated, "Old Title"),
            "New Title"
        );
    }
}
