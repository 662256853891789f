use std::collections::{HashMap, HashSet};

/// Accumulated document-frequency corpus for IDF.
///
/// Starts empty; `absorb` feeds it one document at a time. Scoring switches
/// from the rarity-table fallback to corpus IDF as soon as one document has
/// been absorbed.
#[derive(Debug, Clone, Default)]
pub struct DocumentCorpus {
    documents: usize,
    doc_frequency: HashMap<String, usize>,
}

impl DocumentCorpus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one document's distinct terms into the corpus.
    pub fn absorb<'a>(&mut self, tokens: impl Iterator<Item = &'a str>) {
        let distinct: HashSet<&str> = tokens.collect();
        if distinct.is_empty() {
            return;
        }
        for term in distinct {
            *self.doc_frequency.entry(term.to_string()).or_insert(0) += 1;
        }
        self.documents += 1;
    }

    #[must_use]
    pub fn document_count(&self) -> usize {
        self.documents
    }

    #[must_use]
    pub fn containing(&self, term: &str) -> usize {
        self.doc_frequency.get(term).copied().unwrap_or(0)
    }

    /// Smoothed inverse document frequency: `ln(N / (df + 1) + 1)`.
    /// Monotone decreasing in df, strictly positive, finite for df = 0.
    #[must_use]
    pub fn idf(&self, term: &str) -> f64 {
        let n = self.documents as f64;
        let df = self.containing(term) as f64;
        (n / (df + 1.0) + 1.0).ln()
    }
}

/// Term-rarity fallback used before any corpus exists. Deliberately
/// pluggable: the built-in table is a deterministic heuristic, not a trained
/// artifact, and hosts replace it once they have better priors.
pub trait RarityEstimator: Send + Sync {
    /// IDF-equivalent weight for a term. Higher = rarer.
    fn rarity(&self, term: &str) -> f64;
}

/// Hand-tuned rarity table for the construction-equipment domain.
///
/// Common domain nouns score low (they appear on nearly every page), rare
/// technical vocabulary scores high, everything else gets a neutral default.
#[derive(Debug, Clone)]
pub struct DomainRarityTable {
    entries: HashMap<String, f64>,
    default_rarity: f64,
}

impl DomainRarityTable {
    const DEFAULT_RARITY: f64 = 1.5;

    #[must_use]
    pub fn construction() -> Self {
        let entries = [
            // Ubiquitous domain nouns.
            ("crane", 0.4),
            ("cranes", 0.4),
            ("kran", 0.4),
            ("rental", 0.6),
            ("hire", 0.6),
            ("service", 0.5),
            ("services", 0.5),
            ("construction", 0.5),
            ("site", 0.6),
            ("project", 0.6),
            ("company", 0.5),
            ("equipment", 0.7),
            ("contact", 0.4),
            ("offer", 0.5),
            ("price", 0.6),
            ("prices", 0.6),
            // Mid-frequency domain terms.
            ("tower", 1.0),
            ("mobile", 1.0),
            ("safety", 1.1),
            ("operator", 1.2),
            ("transport", 1.1),
            ("assembly", 1.3),
            ("maintenance", 1.2),
            ("inspection", 1.4),
            // Rare technical vocabulary.
            ("telescopic", 2.2),
            ("luffing", 3.0),
            ("slewing", 2.8),
            ("lattice", 2.4),
            ("ballast", 2.4),
            ("outrigger", 2.7),
            ("jib", 2.3),
            ("counterweight", 2.5),
            ("tonnage", 2.1),
            ("derrick", 2.6),
        ]
        .into_iter()
        .map(|(term, rarity)| (term.to_string(), rarity))
        .collect();

        Self {
            entries,
            default_rarity: Self::DEFAULT_RARITY,
        }
    }

    /// Custom table for hosts in another domain.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, f64)>,
        default_rarity: f64,
    ) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            default_rarity,
        }
    }
}

impl Default for DomainRarityTable {
    fn default() -> Self {
        Self::construction()
    }
}

impl RarityEstimator for DomainRarityTable {
    fn rarity(&self, term: &str) -> f64 {
        self.entries
            .get(term)
            .copied()
            .unwrap_or(self.default_rarity)
    }
}
