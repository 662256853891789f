use crate::text::{is_stop_word, tokenize};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// A term judged semantically related to a target keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedTerm {
    pub term: String,
    /// Similarity in [0, 1].
    pub similarity: f64,
    pub source: RelatedTermSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelatedTermSource {
    /// Fixed domain thesaurus entry.
    Thesaurus,
    /// Mined from a token window around keyword occurrences in the document.
    Context,
}

/// Fixed domain thesaurus: keyword → related phrases, plus the controlled
/// vocabulary and topic clusters used for scoring and labeling.
#[derive(Debug, Clone)]
pub struct Thesaurus {
    entries: HashMap<String, Vec<String>>,
    vocabulary: HashSet<String>,
    clusters: Vec<(String, HashSet<String>)>,
}

impl Thesaurus {
    /// Built-in thesaurus for the construction-equipment domain.
    #[must_use]
    pub fn construction_domain() -> Self {
        let mut thesaurus = Self {
            entries: HashMap::new(),
            vocabulary: [
                "crane", "cranes", "kran", "safety", "construction", "rental", "hire",
                "tower", "mobile", "hoist", "lifting", "rigging", "operator", "transport",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            clusters: Vec::new(),
        };

        thesaurus.insert_entry(
            "crane",
            &["mobile crane", "tower crane", "crane rental", "crane operator", "hoist"],
        );
        thesaurus.insert_entry(
            "crane rental",
            &["rent a crane", "crane hire", "mobile crane rental", "crane service"],
        );
        thesaurus.insert_entry(
            "tower crane",
            &["luffing crane", "self-erecting crane", "tower crane rental", "crane assembly"],
        );
        thesaurus.insert_entry(
            "mobile crane",
            &["all-terrain crane", "truck crane", "mobile crane rental", "telescopic crane"],
        );
        thesaurus.insert_entry(
            "safety",
            &["crane safety", "safety inspection", "load limits", "certification"],
        );
        thesaurus.insert_entry(
            "construction",
            &["construction site", "building project", "site logistics", "heavy lifting"],
        );
        thesaurus.insert_entry(
            "transport",
            &["heavy transport", "crane transport", "special haulage", "escort vehicle"],
        );
        thesaurus.insert_entry(
            "operator",
            &["crane operator", "certified operator", "operator training"],
        );

        thesaurus.insert_cluster(
            "rental",
            &["rental", "hire", "rent", "leasing", "mieten"],
        );
        thesaurus.insert_cluster(
            "safety",
            &["safety", "inspection", "certification", "regulations", "limits"],
        );
        thesaurus.insert_cluster(
            "equipment",
            &["crane", "cranes", "hoist", "telescopic", "luffing", "jib", "ballast"],
        );
        thesaurus.insert_cluster(
            "logistics",
            &["transport", "haulage", "delivery", "assembly", "escort"],
        );

        thesaurus
    }

    pub fn insert_entry(&mut self, keyword: &str, related: &[&str]) {
        self.entries.insert(
            keyword.to_lowercase(),
            related.iter().map(|s| s.to_string()).collect(),
        );
    }

    pub fn insert_cluster(&mut self, label: &str, words: &[&str]) {
        self.clusters.push((
            label.to_string(),
            words.iter().map(|s| s.to_string()).collect(),
        ));
    }

    #[must_use]
    pub fn related(&self, keyword: &str) -> Option<&[String]> {
        self.entries.get(&keyword.to_lowercase()).map(Vec::as_slice)
    }

    #[must_use]
    pub fn in_vocabulary(&self, word: &str) -> bool {
        self.vocabulary.contains(word)
    }

    fn phrase_in_vocabulary(&self, phrase: &str) -> bool {
        tokenize(phrase).iter().any(|w| self.in_vocabulary(w))
    }

    /// Topic labels for a set of top terms: every cluster hit by at least
    /// two distinct terms contributes its label.
    #[must_use]
    pub fn topics(&self, terms: &[String]) -> Vec<String> {
        let term_set: HashSet<&str> = terms.iter().map(String::as_str).collect();
        self.clusters
            .iter()
            .filter(|(_, words)| {
                words.iter().filter(|w| term_set.contains(w.as_str())).count() >= 2
            })
            .map(|(label, _)| label.clone())
            .collect()
    }
}

impl Default for Thesaurus {
    fn default() -> Self {
        Self::construction_domain()
    }
}

const THESAURUS_BASE: f64 = 0.2;
const OVERLAP_WEIGHT: f64 = 0.5;
const VOCABULARY_BONUS: f64 = 0.3;
const CONTEXT_BASE: f64 = 0.3;
const CONTEXT_FREQ_WEIGHT: f64 = 0.2;

/// Related-term (LSI) generation for one target keyword.
///
/// Thesaurus candidates are scored by shared-word overlap between the two
/// phrases plus a bonus when both contain controlled-vocabulary words.
/// Additional candidates are mined from a token window around each keyword
/// occurrence inside `text`.
pub fn related_terms(
    keyword: &str,
    text: &str,
    language: &str,
    thesaurus: &Thesaurus,
    window: usize,
    limit: usize,
) -> Vec<RelatedTerm> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Vec::new();
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<RelatedTerm> = Vec::new();

    if let Some(candidates) = thesaurus.related(keyword) {
        for candidate in candidates {
            if !seen.insert(candidate.to_lowercase()) {
                continue;
            }
            out.push(RelatedTerm {
                term: candidate.clone(),
                similarity: phrase_similarity(keyword, candidate, thesaurus),
                source: RelatedTermSource::Thesaurus,
            });
        }
    }

    for (term, count) in mine_context(keyword, text, language, window) {
        if seen.contains(&term) || term == keyword.to_lowercase() {
            continue;
        }
        seen.insert(term.clone());
        let similarity =
            (CONTEXT_BASE + CONTEXT_FREQ_WEIGHT * (count as f64).ln_1p() / 3.0_f64.ln_1p())
                .min(1.0);
        out.push(RelatedTerm {
            term,
            similarity,
            source: RelatedTermSource::Context,
        });
    }

    out.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.term.cmp(&b.term))
    });
    out.truncate(limit);
    out
}

/// Shared-word overlap over the union of the two phrases' word sets, plus
/// the controlled-vocabulary bonus. Clamped to [0, 1].
#[must_use]
pub fn phrase_similarity(a: &str, b: &str, thesaurus: &Thesaurus) -> f64 {
    let words_a: HashSet<String> = tokenize(a).into_iter().collect();
    let words_b: HashSet<String> = tokenize(b).into_iter().collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let shared = words_a.intersection(&words_b).count() as f64;
    let union = words_a.union(&words_b).count() as f64;
    let overlap = shared / union;

    let vocab_bonus = if thesaurus.phrase_in_vocabulary(a) && thesaurus.phrase_in_vocabulary(b) {
        VOCABULARY_BONUS
    } else {
        0.0
    };

    (THESAURUS_BASE + OVERLAP_WEIGHT * overlap + vocab_bonus).min(1.0)
}

/// Co-occurring content words within ±window tokens of each keyword
/// occurrence, with their counts.
fn mine_context(
    keyword: &str,
    text: &str,
    language: &str,
    window: usize,
) -> Vec<(String, usize)> {
    let tokens = tokenize(text);
    let phrase = tokenize(keyword);
    if phrase.is_empty() || tokens.len() < phrase.len() {
        return Vec::new();
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    let phrase_words: HashSet<&String> = phrase.iter().collect();

    let mut i = 0;
    while i + phrase.len() <= tokens.len() {
        if tokens[i..i + phrase.len()] == *phrase {
            let start = i.saturating_sub(window);
            let end = (i + phrase.len() + window).min(tokens.len());
            for token in &tokens[start..end] {
                if phrase_words.contains(token) || is_stop_word(token, language) {
                    continue;
                }
                *counts.entry(token.clone()).or_insert(0) += 1;
            }
            i += phrase.len();
        } else {
            i += 1;
        }
    }

    let mut mined: Vec<(String, usize)> = counts.into_iter().collect();
    mined.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    mined
}
