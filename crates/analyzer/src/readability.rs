use crate::text::{count_syllables, sentences, tokenize};

/// Flesch Reading Ease, clamped to [0, 100]. Empty or word-free text
/// scores 0 rather than erroring.
///
/// `206.835 - 1.015 * (words / sentences) - 84.6 * (syllables / words)`
#[must_use]
pub fn flesch_reading_ease(text: &str) -> f64 {
    let words = tokenize(text);
    if words.is_empty() {
        return 0.0;
    }
    let sentence_count = sentences(text).len().max(1) as f64;
    let word_count = words.len() as f64;
    let syllable_count: usize = words.iter().map(|w| count_syllables(w)).sum();

    let score = 206.835
        - 1.015 * (word_count / sentence_count)
        - 84.6 * (syllable_count as f64 / word_count);
    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_text_scores_zero() {
        assert_eq!(flesch_reading_ease(""), 0.0);
        assert_eq!(flesch_reading_ease("   \n\t "), 0.0);
    }

    #[test]
    fn simple_prose_reads_easier_than_jargon() {
        let simple = "We rent cranes. You call us. We help you fast.";
        let dense = "Institutionalized counterbalancing methodologies necessitate \
                     comprehensively recalibrated organizational infrastructures.";
        assert!(flesch_reading_ease(simple) > flesch_reading_ease(dense));
    }

    #[test]
    fn degenerate_repetition_stays_clamped() {
        let stuffed = "crane ".repeat(1000);
        let score = flesch_reading_ease(&stuffed);
        assert!((0.0..=100.0).contains(&score));
    }

    proptest! {
        #[test]
        fn score_is_always_clamped(text in ".{0,400}") {
            let score = flesch_reading_ease(&text);
            prop_assert!((0.0..=100.0).contains(&score));
        }
    }
}
