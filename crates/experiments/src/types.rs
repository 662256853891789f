use crate::error::{ExperimentError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SIGNIFICANCE_THRESHOLD: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    MetaDescription,
    Title,
    Headline,
    CtrBait,
}

impl TestType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MetaDescription => "meta_description",
            Self::Title => "title",
            Self::Headline => "headline",
            Self::CtrBait => "ctr_bait",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalMetric {
    Ctr,
    Conversions,
    TimeOnPage,
    BounceRate,
}

impl GoalMetric {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ctr => "ctr",
            Self::Conversions => "conversions",
            Self::TimeOnPage => "time_on_page",
            Self::BounceRate => "bounce_rate",
        }
    }
}

/// Lifecycle of a test. Only `Active` hands out new assignments; `Paused`
/// keeps existing ones; `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Created,
    Active,
    Paused,
    Completed,
}

impl TestStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    #[must_use]
    pub fn can_transition_to(&self, next: TestStatus) -> bool {
        matches!(
            (self, next),
            (Self::Created, TestStatus::Active)
                | (Self::Active, TestStatus::Paused | TestStatus::Completed)
                | (Self::Paused, TestStatus::Active | TestStatus::Completed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    pub name: String,
    /// Text substituted for the tested element; `None` keeps the original.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement_text: Option<String>,
    /// Share of assigned traffic, percent. Weights across a test sum to 100.
    pub weight: u8,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl Variant {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, weight: u8) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            replacement_text: None,
            weight,
            active: true,
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.replacement_text = Some(text.into());
        self
    }
}

/// Caller-facing definition used to create a test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestDefinition {
    pub id: String,
    pub name: String,
    pub test_type: TestType,
    /// Page the test runs on; `None` applies site-wide.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_page: Option<String>,
    pub variants: Vec<Variant>,
    /// Percent of eligible visitors entered into the test.
    pub traffic_split: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub goal_metric: GoalMetric,
}

impl TestDefinition {
    /// Creation-time invariants. Violations are surfaced, never corrected.
    pub fn validate(&self) -> Result<()> {
        if self.variants.len() < 2 {
            return Err(ExperimentError::Configuration(format!(
                "test {} needs at least 2 variants, got {}",
                self.id,
                self.variants.len()
            )));
        }
        let weight_sum: u32 = self.variants.iter().map(|v| u32::from(v.weight)).sum();
        if weight_sum != 100 {
            return Err(ExperimentError::Configuration(format!(
                "variant weights for test {} sum to {weight_sum}, expected 100",
                self.id
            )));
        }
        if self.traffic_split > 100 {
            return Err(ExperimentError::Configuration(format!(
                "traffic split {}% for test {} exceeds 100",
                self.traffic_split, self.id
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for variant in &self.variants {
            if !seen.insert(variant.id.as_str()) {
                return Err(ExperimentError::Configuration(format!(
                    "duplicate variant id {} in test {}",
                    variant.id, self.id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    pub name: String,
    pub test_type: TestType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_page: Option<String>,
    pub variants: Vec<Variant>,
    pub traffic_split: u8,
    pub start_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub goal_metric: GoalMetric,
    pub status: TestStatus,
}

impl Experiment {
    #[must_use]
    pub fn from_definition(def: TestDefinition, now: DateTime<Utc>) -> Self {
        Self {
            id: def.id,
            name: def.name,
            test_type: def.test_type,
            target_page: def.target_page,
            variants: def.variants,
            traffic_split: def.traffic_split,
            start_date: now,
            end_date: def.end_date,
            goal_metric: def.goal_metric,
            status: TestStatus::Created,
        }
    }

    /// Whether the test accepts new assignments for `page` at `now`.
    #[must_use]
    pub fn accepts_assignments(&self, page: &str, now: DateTime<Utc>) -> bool {
        if self.status != TestStatus::Active {
            return false;
        }
        if let Some(end) = self.end_date {
            if now > end {
                return false;
            }
        }
        match &self.target_page {
            Some(target) => target == page,
            None => true,
        }
    }

    pub fn variant(&self, variant_id: &str) -> Result<&Variant> {
        self.variants
            .iter()
            .find(|v| v.id == variant_id)
            .ok_or_else(|| ExperimentError::UnknownVariant {
                test: self.id.clone(),
                variant: variant_id.to_string(),
            })
    }
}

/// Per-variant tracking counters with derived ratios.
///
/// `ctr` and `conversion_rate` are recomputed on every increment so they can
/// never drift from the raw counters. `confidence` and `is_winner` are filled
/// in lazily when a report is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantResult {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub ctr: f64,
    pub conversion_rate: f64,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub is_winner: bool,
    #[serde(default = "default_threshold")]
    pub significance_threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_SIGNIFICANCE_THRESHOLD
}

impl Default for VariantResult {
    fn default() -> Self {
        Self {
            impressions: 0,
            clicks: 0,
            conversions: 0,
            ctr: 0.0,
            conversion_rate: 0.0,
            confidence: 0.0,
            is_winner: false,
            significance_threshold: DEFAULT_SIGNIFICANCE_THRESHOLD,
        }
    }
}

impl VariantResult {
    pub fn record_impression(&mut self) {
        self.impressions += 1;
        self.recompute_rates();
    }

    pub fn record_click(&mut self) {
        self.clicks += 1;
        self.recompute_rates();
    }

    pub fn record_conversion(&mut self) {
        self.conversions += 1;
        self.recompute_rates();
    }

    fn recompute_rates(&mut self) {
        if self.impressions > 0 {
            self.ctr = self.clicks as f64 / self.impressions as f64;
            self.conversion_rate = self.conversions as f64 / self.impressions as f64;
        } else {
            self.ctr = 0.0;
            self.conversion_rate = 0.0;
        }
    }
}

/// Snapshot of one variant inside a [`TestReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantReport {
    pub variant_id: String,
    pub variant_name: String,
    pub result: VariantResult,
}

/// Read-side report for a test: variants in definition order, first is control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    pub test_id: String,
    pub test_name: String,
    pub status: TestStatus,
    pub goal_metric: GoalMetric,
    pub variants: Vec<VariantReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}
