//! Term-relevance analysis for SiteIQ.
//!
//! Pure text computation: TF-IDF with a domain rarity fallback, LSI-style
//! related terms, Flesch readability, entity extraction and per-keyword
//! density checks. No IO; the engine feeds pages in and persists nothing here.

mod analyzer;
mod corpus;
mod entities;
mod lsi;
mod readability;
mod text;
mod tfidf;

pub use analyzer::{AnalyzerConfig, ContentAnalysis, ContentAnalyzer};
pub use corpus::{DocumentCorpus, DomainRarityTable, RarityEstimator};
pub use entities::{extract_entities, Entity, EntityKind};
pub use lsi::{phrase_similarity, related_terms, RelatedTerm, RelatedTermSource, Thesaurus};
pub use readability::flesch_reading_ease;
pub use text::{content_tokens, count_phrase, count_syllables, is_stop_word, sentences, tokenize};
pub use tfidf::{score_terms, RelevanceWeights, TermScore};
