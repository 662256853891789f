use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    ExactMatch,
    PartialOverlap,
    SemanticSimilarity,
}

impl ConflictType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactMatch => "exact_match",
            Self::PartialOverlap => "partial_overlap",
            Self::SemanticSimilarity => "semantic_similarity",
        }
    }
}

/// Ordered so that `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    Merge,
    Canonical,
    Differentiate,
    Redirect,
    Noindex,
}

impl RecommendedAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Canonical => "canonical",
            Self::Differentiate => "differentiate",
            Self::Redirect => "redirect",
            Self::Noindex => "noindex",
        }
    }
}

/// What to do about one conflict: keep `primary_page`, apply `action` to the
/// `secondary_pages`. `priority` ranks recommendations for consolidation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecommendation {
    pub primary_page: String,
    pub secondary_pages: Vec<String>,
    pub action: RecommendedAction,
    pub justification: String,
    pub priority: f64,
}

/// One detected keyword conflict. `related_keyword` is set for pairwise
/// semantic conflicts between two distinct keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordConflict {
    pub keyword: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_keyword: Option<String>,
    pub conflict_type: ConflictType,
    pub severity: Severity,
    /// Composite weighted score the severity was derived from.
    pub impact_score: u32,
    pub pages: Vec<String>,
    pub recommendation: ConflictRecommendation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictSummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CannibalizationReport {
    pub generated_at: DateTime<Utc>,
    pub catalogue_version: u64,
    pub keywords_checked: usize,
    /// Sorted by severity, then impact, then keyword.
    pub conflicts: Vec<KeywordConflict>,
    pub summary: ConflictSummary,
}

impl CannibalizationReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Per-item outcome of a consolidation batch. A failed item never hides
/// behind the successes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationItem {
    pub keyword: String,
    pub action: String,
    pub success: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationOutcome {
    pub processed: usize,
    pub items: Vec<ConsolidationItem>,
}

impl ConsolidationOutcome {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.success).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.items.iter().filter(|item| !item.success).count()
    }
}
