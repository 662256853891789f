use siteiq_analyzer::{is_stop_word, sentences, tokenize};
use unicode_segmentation::UnicodeSegmentation;

/// A keyword occurrence inside the scanned content, expanded to a short
/// noun-phrase window so the anchor reads naturally.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkablePhrase {
    /// Anchor text exactly as it appears in the content.
    pub text: String,

    /// Byte offset of the anchor in the full content.
    pub position: usize,

    /// The sentence the anchor sits in, trimmed.
    pub sentence: String,
}

/// Locate every occurrence of `keyword` in `content`, one sentence at a
/// time. A match never crosses a sentence boundary. Each match is widened
/// by up to `window` neighbouring words: preceding words when they look
/// like capitalized qualifiers ("Liebherr tower crane"), then following
/// words as long as they are not stop words.
#[must_use]
pub fn find_phrase_occurrences(
    content: &str,
    keyword: &str,
    language: &str,
    window: usize,
) -> Vec<LinkablePhrase> {
    let keyword_words = tokenize(keyword);
    if keyword_words.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    for (sentence_offset, sentence) in sentences(content) {
        let words: Vec<(usize, &str)> = sentence
            .split_word_bound_indices()
            .filter(|(_, w)| w.chars().any(char::is_alphanumeric))
            .collect();
        if words.len() < keyword_words.len() {
            continue;
        }

        for start in 0..=(words.len() - keyword_words.len()) {
            let hit = keyword_words
                .iter()
                .enumerate()
                .all(|(k, kw)| words[start + k].1.to_lowercase() == *kw);
            if !hit {
                continue;
            }

            let (begin, end) = expand(&words, start, start + keyword_words.len() - 1, language, window);
            let anchor_start = words[begin].0;
            let anchor_end = words[end].0 + words[end].1.len();
            out.push(LinkablePhrase {
                text: sentence[anchor_start..anchor_end].to_string(),
                position: sentence_offset + anchor_start,
                sentence: sentence.to_string(),
            });
        }
    }
    out
}

/// Widen `[start, end]` by at most `window` words total. Leftward growth
/// only takes capitalized non-stop words (brand or model qualifiers) and
/// runs first; rightward growth stops at the first stop word.
fn expand(
    words: &[(usize, &str)],
    start: usize,
    end: usize,
    language: &str,
    window: usize,
) -> (usize, usize) {
    let mut begin = start;
    let mut end = end;
    let mut taken = 0;

    while taken < window && begin > 0 {
        let prev = words[begin - 1].1;
        let capitalized = prev.chars().next().is_some_and(char::is_uppercase);
        if !capitalized || is_stop_word(&prev.to_lowercase(), language) {
            break;
        }
        begin -= 1;
        taken += 1;
    }

    while taken < window && end + 1 < words.len() {
        let next = words[end + 1].1;
        if is_stop_word(&next.to_lowercase(), language) {
            break;
        }
        end += 1;
        taken += 1;
    }

    (begin, end)
}
