use crate::bait;
use crate::error::{ExperimentError, Result};
use crate::stats::two_proportion_confidence;
use crate::types::{
    Experiment, TestDefinition, TestReport, TestStatus, Variant, VariantReport, VariantResult,
};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use siteiq_catalogue::{AnalyticsEvent, AnalyticsSink, EventKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-test counters keyed `test id -> variant id`.
pub type ResultMap = HashMap<String, HashMap<String, VariantResult>>;

/// Sticky visitor assignments keyed `test id -> user id -> variant id`.
pub type AssignmentMap = HashMap<String, HashMap<String, String>>;

/// A/B test engine: test lifecycle, sticky visitor assignment, tracking
/// counters and lazy significance reports.
///
/// All state is in memory; [`crate::persist`] snapshots it through the
/// host-provided `StateStore`.
pub struct ExperimentEngine {
    experiments: HashMap<String, Experiment>,
    results: ResultMap,
    assignments: AssignmentMap,
    rng: StdRng,
    sink: Option<Arc<dyn AnalyticsSink>>,
}

impl ExperimentEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic engine for reproducible assignment sequences.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            experiments: HashMap::new(),
            results: HashMap::new(),
            assignments: HashMap::new(),
            rng,
            sink: None,
        }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn AnalyticsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Create a test from a validated definition. New tests start `Created`
    /// and assign no traffic until started.
    pub fn create_test(&mut self, def: TestDefinition) -> Result<&Experiment> {
        def.validate()?;
        if self.experiments.contains_key(&def.id) {
            return Err(ExperimentError::Configuration(format!(
                "test id {} already exists",
                def.id
            )));
        }
        let experiment = Experiment::from_definition(def, Utc::now());
        let counters = self.results.entry(experiment.id.clone()).or_default();
        for variant in &experiment.variants {
            counters.insert(variant.id.clone(), VariantResult::default());
        }
        log::info!(
            "Created test {} ({}) with {} variants",
            experiment.id,
            experiment.test_type.as_str(),
            experiment.variants.len()
        );
        let id = experiment.id.clone();
        self.experiments.insert(id.clone(), experiment);
        Ok(&self.experiments[&id])
    }

    pub fn start(&mut self, test_id: &str) -> Result<()> {
        self.transition(test_id, TestStatus::Active)
    }

    pub fn pause(&mut self, test_id: &str) -> Result<()> {
        self.transition(test_id, TestStatus::Paused)
    }

    pub fn resume(&mut self, test_id: &str) -> Result<()> {
        self.transition(test_id, TestStatus::Active)
    }

    pub fn complete(&mut self, test_id: &str) -> Result<()> {
        self.transition(test_id, TestStatus::Completed)
    }

    fn transition(&mut self, test_id: &str, next: TestStatus) -> Result<()> {
        let experiment = self
            .experiments
            .get_mut(test_id)
            .ok_or_else(|| ExperimentError::UnknownTest(test_id.to_string()))?;
        if !experiment.status.can_transition_to(next) {
            return Err(ExperimentError::InvalidTransition {
                from: experiment.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        log::info!(
            "Test {test_id}: {} -> {}",
            experiment.status.as_str(),
            next.as_str()
        );
        experiment.status = next;
        Ok(())
    }

    /// Resolve the variant a visitor sees on `page`, or `None` to serve the
    /// original content.
    ///
    /// The sticky prior assignment is read before anything is written, so a
    /// returning visitor gets the same variant back without a new impression.
    /// Unassigned visitors pass a Bernoulli gate against the traffic split
    /// (failing it records nothing), then a weighted draw over active
    /// variants; the assignment is stored and one impression counted.
    pub async fn get_variant_for_user(
        &mut self,
        test_id: &str,
        user_id: &str,
        page: &str,
    ) -> Option<Variant> {
        let experiment = self.experiments.get(test_id)?.clone();
        if !experiment.accepts_assignments(page, Utc::now()) {
            return None;
        }

        if let Some(variant_id) = self
            .assignments
            .get(test_id)
            .and_then(|users| users.get(user_id))
        {
            return experiment.variant(variant_id).ok().cloned();
        }

        let roll = self.rng.gen_range(0..100u8);
        if roll >= experiment.traffic_split {
            return None;
        }

        let variant = Self::weighted_draw(&experiment.variants, &mut self.rng)?.clone();

        self.assignments
            .entry(test_id.to_string())
            .or_default()
            .insert(user_id.to_string(), variant.id.clone());
        self.results
            .entry(test_id.to_string())
            .or_default()
            .entry(variant.id.clone())
            .or_default()
            .record_impression();
        log::debug!(
            "Assigned user {user_id} to variant {} of test {test_id}",
            variant.id
        );
        self.emit(test_id, &variant.id, EventKind::Impression).await;
        Some(variant)
    }

    fn weighted_draw<'a>(variants: &'a [Variant], rng: &mut StdRng) -> Option<&'a Variant> {
        let active: Vec<&Variant> = variants.iter().filter(|v| v.active).collect();
        let total: u32 = active.iter().map(|v| u32::from(v.weight)).sum();
        if total == 0 {
            return None;
        }
        let mut roll = rng.gen_range(0..total);
        for variant in active {
            let weight = u32::from(variant.weight);
            if roll < weight {
                return Some(variant);
            }
            roll -= weight;
        }
        None
    }

    pub async fn track_impression(&mut self, test_id: &str, variant_id: &str) -> Result<()> {
        self.track(test_id, variant_id, EventKind::Impression).await
    }

    pub async fn track_click(&mut self, test_id: &str, variant_id: &str) -> Result<()> {
        self.track(test_id, variant_id, EventKind::Click).await
    }

    pub async fn track_conversion(&mut self, test_id: &str, variant_id: &str) -> Result<()> {
        self.track(test_id, variant_id, EventKind::Conversion).await
    }

    /// Counters always increment; deduplication is the caller's job.
    async fn track(&mut self, test_id: &str, variant_id: &str, kind: EventKind) -> Result<()> {
        let experiment = self
            .experiments
            .get(test_id)
            .ok_or_else(|| ExperimentError::UnknownTest(test_id.to_string()))?;
        experiment.variant(variant_id)?;

        let counters = self
            .results
            .entry(test_id.to_string())
            .or_default()
            .entry(variant_id.to_string())
            .or_default();
        match kind {
            EventKind::Impression => counters.record_impression(),
            EventKind::Click => counters.record_click(),
            EventKind::Conversion => counters.record_conversion(),
        }
        self.emit(test_id, variant_id, kind).await;
        Ok(())
    }

    async fn emit(&self, test_id: &str, variant_id: &str, kind: EventKind) {
        if let Some(sink) = &self.sink {
            let event = AnalyticsEvent {
                test_id: test_id.to_string(),
                variant_id: variant_id.to_string(),
                kind,
            };
            if let Err(err) = sink.record(&event).await {
                log::warn!("Analytics sink rejected event for test {test_id}: {err}");
            }
        }
    }

    /// Report with per-variant significance against the first variant
    /// (control). Confidence and winner flags are computed here, on read.
    pub fn results(&self, test_id: &str) -> Result<TestReport> {
        let experiment = self
            .experiments
            .get(test_id)
            .ok_or_else(|| ExperimentError::UnknownTest(test_id.to_string()))?;
        let empty = HashMap::new();
        let stored = self.results.get(test_id).unwrap_or(&empty);

        let control = &experiment.variants[0];
        let control_result = stored.get(&control.id).cloned().unwrap_or_default();

        let mut variants = Vec::with_capacity(experiment.variants.len());
        for (position, variant) in experiment.variants.iter().enumerate() {
            let mut result = stored.get(&variant.id).cloned().unwrap_or_default();
            if position == 0 {
                result.confidence = 0.0;
                result.is_winner = false;
            } else {
                result.confidence = two_proportion_confidence(
                    control_result.clicks,
                    control_result.impressions,
                    result.clicks,
                    result.impressions,
                );
                result.is_winner = result.confidence >= result.significance_threshold
                    && result.ctr > control_result.ctr;
            }
            variants.push(VariantReport {
                variant_id: variant.id.clone(),
                variant_name: variant.name.clone(),
                result,
            });
        }

        let winner = variants
            .iter()
            .filter(|report| report.result.is_winner)
            .max_by(|a, b| {
                a.result
                    .ctr
                    .partial_cmp(&b.result.ctr)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|report| report.variant_id.clone());

        Ok(TestReport {
            test_id: experiment.id.clone(),
            test_name: experiment.name.clone(),
            status: experiment.status,
            goal_metric: experiment.goal_metric,
            variants,
            winner,
        })
    }

    /// Serve-side text for a variant of a test.
    pub fn generate_optimized_content(
        &self,
        test_id: &str,
        variant_id: &str,
        original: &str,
    ) -> Result<String> {
        let experiment = self
            .experiments
            .get(test_id)
            .ok_or_else(|| ExperimentError::UnknownTest(test_id.to_string()))?;
        let variant = experiment.variant(variant_id)?;
        Ok(bait::generate_optimized_content(variant, original))
    }

    pub fn experiment(&self, test_id: &str) -> Result<&Experiment> {
        self.experiments
            .get(test_id)
            .ok_or_else(|| ExperimentError::UnknownTest(test_id.to_string()))
    }

    pub fn experiments(&self) -> impl Iterator<Item = &Experiment> {
        self.experiments.values()
    }

    #[must_use]
    pub fn results_map(&self) -> &ResultMap {
        &self.results
    }

    #[must_use]
    pub fn assignments_map(&self) -> &AssignmentMap {
        &self.assignments
    }

    /// Replace in-memory state wholesale, e.g. after loading a snapshot.
    pub fn restore(
        &mut self,
        experiments: Vec<Experiment>,
        results: ResultMap,
        assignments: AssignmentMap,
    ) {
        self.experiments = experiments
            .into_iter()
            .map(|e| (e.id.clone(), e))
            .collect();
        self.results = results;
        self.assignments = assignments;
    }
}

impl Default for ExperimentEngine {
    fn default() -> Self {
        Self::new()
    }
}
