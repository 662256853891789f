use once_cell::sync::Lazy;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

static STOP_EN: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the", "and", "or", "but", "if", "then", "else", "for", "of", "on", "in",
        "to", "from", "by", "with", "without", "at", "as", "is", "are", "was", "were", "be",
        "been", "being", "it", "its", "this", "that", "these", "those", "we", "you", "your",
        "our", "their", "they", "he", "she", "his", "her", "i", "me", "my", "us", "them",
        "will", "would", "can", "could", "should", "shall", "may", "might", "must", "do",
        "does", "did", "have", "has", "had", "not", "no", "so", "too", "very", "more", "most",
        "other", "some", "any", "all", "each", "also", "than", "into", "about", "over",
        "under", "after", "before", "between", "out", "up", "down", "only", "own", "same",
        "such", "both", "there", "here", "when", "where", "why", "how", "what", "which",
        "who", "whom",
    ]
    .into_iter()
    .collect()
});

static STOP_DE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "der", "die", "das", "den", "dem", "des", "ein", "eine", "einen", "einem", "einer",
        "eines", "und", "oder", "aber", "wenn", "dann", "sonst", "für", "von", "auf", "in",
        "an", "zu", "aus", "mit", "ohne", "bei", "als", "ist", "sind", "war", "waren", "sein",
        "es", "sie", "er", "wir", "ihr", "ich", "mich", "mir", "uns", "ihnen", "wird",
        "werden", "kann", "können", "soll", "sollen", "muss", "müssen", "nicht", "kein",
        "keine", "auch", "nur", "sehr", "mehr", "alle", "jede", "jeder", "jedes", "dass",
        "noch", "schon", "hier", "dort", "wie", "was", "wer", "wo", "warum", "über", "unter",
        "nach", "vor", "zwischen", "durch", "um", "am", "im", "zum", "zur", "beim", "vom",
    ]
    .into_iter()
    .collect()
});

/// Lower-cased word tokens, split on non-word boundaries.
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(|w| w.to_lowercase()).collect()
}

/// Stop-word check for a language tag. Unknown tags fall back to English.
pub fn is_stop_word(word: &str, language: &str) -> bool {
    let table = match language.split(['-', '_']).next().unwrap_or("en") {
        "de" => &*STOP_DE,
        _ => &*STOP_EN,
    };
    table.contains(word)
}

/// Tokens with stop words removed.
pub fn content_tokens(text: &str, language: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|w| !is_stop_word(w, language))
        .collect()
}

/// Sentences with their byte offsets into the original text.
/// Splits on `.`, `!` and `?`; text without terminators is one sentence.
pub fn sentences(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            let raw = &text[start..idx];
            push_sentence(&mut out, start, raw);
            start = idx + ch.len_utf8();
        }
    }
    push_sentence(&mut out, start, &text[start..]);
    out
}

fn push_sentence<'a>(out: &mut Vec<(usize, &'a str)>, start: usize, raw: &'a str) {
    let trimmed = raw.trim_start();
    if trimmed.trim_end().is_empty() {
        return;
    }
    let offset = start + (raw.len() - trimmed.len());
    out.push((offset, trimmed.trim_end()));
}

/// Syllable estimate by vowel-group counting. A silent final "e" is
/// discounted unless it is the only vowel group. Never returns 0 for a
/// word containing letters.
pub fn count_syllables(word: &str) -> usize {
    let lower = word.to_lowercase();
    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y' | 'ä' | 'ö' | 'ü');

    let mut groups = 0usize;
    let mut in_group = false;
    for ch in lower.chars() {
        if is_vowel(ch) {
            if !in_group {
                groups += 1;
                in_group = true;
            }
        } else {
            in_group = false;
        }
    }

    if groups > 1 && lower.ends_with('e') && !lower.ends_with("le") {
        groups -= 1;
    }
    groups.max(if lower.chars().any(|c| c.is_alphabetic()) { 1 } else { 0 })
}

/// Non-overlapping occurrences of a token phrase inside a token stream.
pub fn count_phrase(tokens: &[String], phrase: &[String]) -> usize {
    if phrase.is_empty() || tokens.len() < phrase.len() {
        return 0;
    }
    let mut count = 0;
    let mut i = 0;
    while i + phrase.len() <= tokens.len() {
        if tokens[i..i + phrase.len()] == *phrase {
            count += 1;
            i += phrase.len();
        } else {
            i += 1;
        }
    }
    count
}
