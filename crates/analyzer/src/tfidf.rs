use crate::corpus::{DocumentCorpus, RarityEstimator};
use crate::text::is_stop_word;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Scoring result for one term of one document. Computed fresh on every
/// analysis call, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermScore {
    pub term: String,
    /// Frequency normalized by document length.
    pub tf: f64,
    /// Corpus IDF, or the rarity-table fallback before a corpus exists.
    pub idf: f64,
    pub tf_idf: f64,
    /// TF-IDF blended with first-occurrence position and capped repetition.
    pub relevance: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RelevanceWeights {
    /// Bonus scale for terms appearing early in the document.
    pub early: f64,
    /// Bonus scale for moderate repetition.
    pub repeat: f64,
    /// Repetition counts above this cap earn nothing extra.
    pub repeat_cap: usize,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            early: 0.3,
            repeat: 0.2,
            repeat_cap: 6,
        }
    }
}

/// Score every non-stop term of a tokenized document, best first.
///
/// The repetition bonus grows logarithmically and is capped, so keyword
/// stuffing stops paying off after a handful of mentions.
pub fn score_terms(
    tokens: &[String],
    language: &str,
    corpus: &DocumentCorpus,
    fallback: &dyn RarityEstimator,
    weights: RelevanceWeights,
) -> Vec<TermScore> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let total = tokens.len() as f64;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (pos, token) in tokens.iter().enumerate() {
        if is_stop_word(token, language) {
            continue;
        }
        *counts.entry(token).or_insert(0) += 1;
        first_seen.entry(token).or_insert(pos);
    }

    let repeat_norm = (1.0 + weights.repeat_cap as f64).ln();
    let mut scores: Vec<TermScore> = counts
        .into_iter()
        .map(|(term, count)| {
            let tf = count as f64 / total;
            let idf = if corpus.document_count() > 0 {
                corpus.idf(term)
            } else {
                fallback.rarity(term)
            };
            let tf_idf = tf * idf;

            let early = 1.0 - first_seen[term] as f64 / total;
            let repeat = (1.0 + count.min(weights.repeat_cap) as f64).ln() / repeat_norm;
            let relevance = tf_idf * (1.0 + weights.early * early + weights.repeat * repeat);

            TermScore {
                term: term.to_string(),
                tf,
                idf,
                tf_idf,
                relevance,
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.term.cmp(&b.term))
    });
    scores
}
