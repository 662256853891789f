use crate::corpus::{DocumentCorpus, DomainRarityTable, RarityEstimator};
use crate::entities::{extract_entities, Entity};
use crate::lsi::{related_terms, RelatedTerm, Thesaurus};
use crate::readability::flesch_reading_ease;
use crate::text::{count_phrase, tokenize};
use crate::tfidf::{score_terms, RelevanceWeights, TermScore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Language tag driving stop-word selection.
    pub language: String,
    /// How many scored terms to report.
    pub top_terms: usize,
    /// Related-term cap per analysis.
    pub related_limit: usize,
    /// Token window for context mining around keyword occurrences.
    pub context_window: usize,
    /// Keyword density band (percent) considered healthy.
    pub min_density: f64,
    pub max_density: f64,
    /// Readability floor below which a recommendation fires.
    pub min_readability: f64,
    /// Body word count below which content counts as thin.
    pub thin_content_words: usize,
    pub weights: RelevanceWeights,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            top_terms: 10,
            related_limit: 10,
            context_window: 5,
            min_density: 0.5,
            max_density: 3.0,
            min_readability: 40.0,
            thin_content_words: 150,
            weights: RelevanceWeights::default(),
        }
    }
}

/// Full result of analyzing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentAnalysis {
    /// Character length of the trimmed input; 0 for empty input.
    pub content_length: usize,
    /// Word-token count of the document.
    pub word_count: usize,
    pub top_terms: Vec<TermScore>,
    pub related_terms: Vec<RelatedTerm>,
    pub topics: Vec<String>,
    /// Percent density per target keyword.
    pub keyword_density: BTreeMap<String, f64>,
    pub readability: f64,
    pub entities: Vec<Entity>,
    pub recommendations: Vec<String>,
}

/// Term-relevance analyzer: TF-IDF scoring, LSI suggestions, readability,
/// entities and actionable recommendations over raw page text.
///
/// Construct one per engine; it owns the accumulated IDF corpus and the
/// domain thesaurus. Analysis itself is pure; only [`absorb`] mutates.
///
/// [`absorb`]: ContentAnalyzer::absorb
pub struct ContentAnalyzer {
    config: AnalyzerConfig,
    thesaurus: Thesaurus,
    corpus: DocumentCorpus,
    fallback: Box<dyn RarityEstimator>,
}

impl ContentAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self {
            config,
            thesaurus: Thesaurus::construction_domain(),
            corpus: DocumentCorpus::new(),
            fallback: Box::new(DomainRarityTable::construction()),
        }
    }

    /// Swap the pre-corpus rarity fallback.
    #[must_use]
    pub fn with_estimator(mut self, estimator: Box<dyn RarityEstimator>) -> Self {
        self.fallback = estimator;
        self
    }

    #[must_use]
    pub fn with_thesaurus(mut self, thesaurus: Thesaurus) -> Self {
        self.thesaurus = thesaurus;
        self
    }

    #[must_use]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    #[must_use]
    pub fn corpus_documents(&self) -> usize {
        self.corpus.document_count()
    }

    /// Feed one document into the IDF corpus. Scoring switches from the
    /// rarity fallback to corpus IDF once at least one document is in.
    pub fn absorb(&mut self, text: &str) {
        let tokens = tokenize(text);
        self.corpus.absorb(tokens.iter().map(String::as_str));
    }

    /// Analyze one document against a target keyword list.
    ///
    /// Empty or whitespace-only input yields a well-formed zero result.
    /// Empty target keywords are silently ignored.
    #[must_use]
    pub fn analyze(&self, text: &str, target_keywords: &[String]) -> ContentAnalysis {
        let tokens = tokenize(text);
        let targets: Vec<&str> = target_keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();

        if tokens.is_empty() {
            log::debug!("Analyzing empty document ({} targets)", targets.len());
            return ContentAnalysis {
                content_length: 0,
                word_count: 0,
                top_terms: Vec::new(),
                related_terms: Vec::new(),
                topics: Vec::new(),
                keyword_density: targets.iter().map(|k| (k.to_string(), 0.0)).collect(),
                readability: 0.0,
                entities: Vec::new(),
                recommendations: vec!["Content is empty".to_string()],
            };
        }

        let mut top_terms = score_terms(
            &tokens,
            &self.config.language,
            &self.corpus,
            self.fallback.as_ref(),
            self.config.weights,
        );
        top_terms.truncate(self.config.top_terms);

        let mut related = Vec::new();
        for keyword in &targets {
            related.extend(related_terms(
                keyword,
                text,
                &self.config.language,
                &self.thesaurus,
                self.config.context_window,
                self.config.related_limit,
            ));
        }
        related.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        related.dedup_by(|a, b| a.term == b.term);
        related.truncate(self.config.related_limit);

        let term_names: Vec<String> = top_terms.iter().map(|t| t.term.clone()).collect();
        let topics = self.thesaurus.topics(&term_names);

        let keyword_density = self.density_map(&tokens, &targets);
        let readability = flesch_reading_ease(text);
        let entities = extract_entities(text, tokens.len());

        let recommendations =
            self.recommendations(tokens.len(), &keyword_density, readability);

        ContentAnalysis {
            content_length: text.trim().len(),
            word_count: tokens.len(),
            top_terms,
            related_terms: related,
            topics,
            keyword_density,
            readability,
            entities,
            recommendations,
        }
    }

    fn density_map(&self, tokens: &[String], targets: &[&str]) -> BTreeMap<String, f64> {
        let total = tokens.len() as f64;
        targets
            .iter()
            .map(|keyword| {
                let phrase = tokenize(keyword);
                let count = count_phrase(tokens, &phrase);
                (keyword.to_string(), count as f64 / total * 100.0)
            })
            .collect()
    }

    fn recommendations(
        &self,
        word_count: usize,
        density: &BTreeMap<String, f64>,
        readability: f64,
    ) -> Vec<String> {
        let mut out = Vec::new();

        if word_count < self.config.thin_content_words {
            out.push(format!(
                "Content is thin ({word_count} words); aim for at least {}",
                self.config.thin_content_words
            ));
        }
        for (keyword, pct) in density {
            if *pct == 0.0 {
                out.push(format!("Target keyword \"{keyword}\" does not appear in the content"));
            } else if *pct < self.config.min_density {
                out.push(format!(
                    "Keyword \"{keyword}\" density {pct:.1}% is below the {:.1}% floor",
                    self.config.min_density
                ));
            } else if *pct > self.config.max_density {
                out.push(format!(
                    "Keyword \"{keyword}\" density {pct:.1}% looks like stuffing (cap {:.1}%)",
                    self.config.max_density
                ));
            }
        }
        if readability < self.config.min_readability {
            out.push(format!(
                "Readability {readability:.0} is low; shorten sentences and simplify wording"
            ));
        }
        out
    }
}

impl Default for ContentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "Tower crane rental for demanding construction sites. \
        Our tower crane fleet is inspected, certified and delivered on time. \
        Call us for crane rental quotes, crane transport and experienced operators. \
        Safety inspection reports come with every crane.";

    #[test]
    fn empty_input_yields_wellformed_zero_result() {
        let analyzer = ContentAnalyzer::new();
        let analysis = analyzer.analyze("", &[]);
        assert_eq!(analysis.content_length, 0);
        assert_eq!(analysis.word_count, 0);
        assert!(analysis.top_terms.is_empty());
        assert!(analysis.related_terms.is_empty());
        assert_eq!(analysis.readability, 0.0);

        let analysis = analyzer.analyze("   \n ", &["crane".to_string()]);
        assert_eq!(analysis.content_length, 0);
        assert_eq!(analysis.keyword_density.get("crane"), Some(&0.0));
    }

    #[test]
    fn empty_target_keywords_are_ignored() {
        let analyzer = ContentAnalyzer::new();
        let analysis = analyzer.analyze(
            SAMPLE,
            &["".to_string(), "  ".to_string(), "crane rental".to_string()],
        );
        assert_eq!(analysis.keyword_density.len(), 1);
        assert!(analysis.keyword_density.contains_key("crane rental"));
    }

    #[test]
    fn analysis_populates_all_sections() {
        let analyzer = ContentAnalyzer::new();
        let analysis = analyzer.analyze(SAMPLE, &["tower crane".to_string()]);

        assert!(analysis.content_length > 0);
        assert!(analysis.word_count > 0);
        assert!(!analysis.top_terms.is_empty());
        assert!(!analysis.related_terms.is_empty());
        assert!(analysis.keyword_density["tower crane"] > 0.0);
        assert!((0.0..=100.0).contains(&analysis.readability));
        // "crane" plus another equipment-cluster word should label a topic.
        assert!(analysis.topics.iter().any(|t| t == "equipment") || analysis.topics.is_empty());
    }

    #[test]
    fn missing_keyword_triggers_recommendation() {
        let analyzer = ContentAnalyzer::new();
        let analysis = analyzer.analyze(SAMPLE, &["excavator".to_string()]);
        assert!(analysis
            .recommendations
            .iter()
            .any(|r| r.contains("excavator")));
    }

    #[test]
    fn corpus_absorption_changes_idf_source() {
        let mut analyzer = ContentAnalyzer::new();
        let before = analyzer.analyze(SAMPLE, &[]);
        analyzer.absorb("A totally different page about crane transport.");
        let after = analyzer.analyze(SAMPLE, &[]);

        assert_eq!(analyzer.corpus_documents(), 1);
        let idf_of = |a: &ContentAnalysis, term: &str| {
            a.top_terms.iter().find(|t| t.term == term).map(|t| t.idf)
        };
        // "crane" was table-scored before, corpus-scored after.
        if let (Some(b), Some(a)) = (idf_of(&before, "crane"), idf_of(&after, "crane")) {
            assert_ne!(b, a);
        }
    }

    #[test]
    fn analysis_serializes_to_json() {
        let analyzer = ContentAnalyzer::new();
        let analysis = analyzer.analyze(SAMPLE, &["crane rental".to_string()]);
        let json = serde_json::to_string(&analysis).unwrap();
        let back: ContentAnalysis = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content_length, analysis.content_length);
    }
}
