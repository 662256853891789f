//! Keyword cannibalization detection for SiteIQ.
//!
//! Scans the catalogue's keyword index for pages competing over the same or
//! nearly the same keywords, grades each conflict, recommends a resolution
//! and can apply the top recommendations back to the catalogue.

mod consolidate;
mod detector;
mod recommend;
mod types;

pub use consolidate::apply_batch;
pub use detector::{ConflictDetector, DetectorConfig};
pub use recommend::{build_recommendation, content_score};
pub use types::{
    CannibalizationReport, ConflictRecommendation, ConflictSummary, ConflictType,
    ConsolidationItem, ConsolidationOutcome, KeywordConflict, RecommendedAction, Severity,
};
