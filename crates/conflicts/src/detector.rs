use crate::consolidate;
use crate::recommend::build_recommendation;
use crate::types::{
    CannibalizationReport, ConflictSummary, ConflictType, ConsolidationOutcome, KeywordConflict,
    Severity,
};
use chrono::Utc;
use siteiq_analyzer::tokenize;
use siteiq_catalogue::{normalize_keyword, Catalogue, Page};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Word-overlap ratio two distinct keywords must reach to count as
    /// semantically cannibalizing.
    pub semantic_threshold: f64,
    /// Average-search-volume tier boundaries.
    pub volume_high: u32,
    pub volume_mid: u32,
    /// Base weights per conflict type.
    pub exact_weight: u32,
    pub partial_weight: u32,
    pub semantic_weight: u32,
    /// Default batch size for automatic consolidation.
    pub max_auto_actions: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            semantic_threshold: 0.7,
            volume_high: 1000,
            volume_mid: 100,
            exact_weight: 3,
            partial_weight: 2,
            semantic_weight: 1,
            max_auto_actions: 5,
        }
    }
}

/// Keyword cannibalization detector over the shared catalogue.
///
/// Reports are cached against the catalogue's mutation epoch: any catalogue
/// change invalidates the cache on the next read, and an unchanged catalogue
/// returns the identical report without rescanning.
pub struct ConflictDetector {
    config: DetectorConfig,
    cache: Option<(u64, CannibalizationReport)>,
}

impl ConflictDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    #[must_use]
    pub fn with_config(config: DetectorConfig) -> Self {
        Self {
            config,
            cache: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Scan the keyword index for pages competing over the same or nearly
    /// the same keywords.
    pub fn detect_cannibalization(&mut self, catalogue: &Catalogue) -> CannibalizationReport {
        if let Some((epoch, report)) = &self.cache {
            if *epoch == catalogue.version() {
                log::debug!("Serving conflict report from cache (epoch {epoch})");
                return report.clone();
            }
        }

        let report = self.compute_report(catalogue);
        log::info!(
            "Conflict scan over {} keywords found {} conflicts",
            report.keywords_checked,
            report.conflicts.len()
        );
        self.cache = Some((catalogue.version(), report.clone()));
        report
    }

    /// Apply the top-ranked recommendations to the catalogue, best-effort.
    /// `top_n` defaults to the configured batch size.
    pub fn auto_consolidate(
        &mut self,
        catalogue: &mut Catalogue,
        top_n: Option<usize>,
    ) -> ConsolidationOutcome {
        let report = self.detect_cannibalization(catalogue);
        let limit = top_n.unwrap_or(self.config.max_auto_actions);
        consolidate::apply_batch(catalogue, &report.conflicts, limit)
    }

    fn compute_report(&self, catalogue: &Catalogue) -> CannibalizationReport {
        let mut conflicts = Vec::new();

        // 1. Keywords claimed by more than one live page.
        for (keyword, urls) in catalogue.keyword_index().iter() {
            if urls.len() < 2 {
                continue;
            }
            let pages: Vec<&Page> = urls.iter().filter_map(|url| catalogue.page(url)).collect();
            if pages.len() < 2 {
                continue;
            }

            let title_hits = pages
                .iter()
                .filter(|page| page.title_or_heading_contains(keyword))
                .count();
            let conflict_type = self.classify(keyword, &pages, title_hits);
            let avg_volume = average_volume(&pages);
            let impact = self.composite_score(conflict_type, pages.len(), avg_volume, title_hits);
            let severity = severity_for(impact);

            conflicts.push(KeywordConflict {
                keyword: keyword.clone(),
                related_keyword: None,
                conflict_type,
                severity,
                impact_score: impact,
                pages: urls.iter().cloned().collect(),
                recommendation: build_recommendation(keyword, &pages, severity, impact, avg_volume),
            });
        }

        // 2. Distinct keyword pairs that are nearly the same phrase and
        //    compete on at least one shared page.
        let keywords: Vec<&String> = catalogue.keyword_index().keywords().collect();
        for (i, first) in keywords.iter().enumerate() {
            for second in &keywords[i + 1..] {
                let ratio = word_overlap(first, second);
                if ratio < self.config.semantic_threshold {
                    continue;
                }
                let (Some(pages_a), Some(pages_b)) = (
                    catalogue.keyword_index().pages_for(first),
                    catalogue.keyword_index().pages_for(second),
                ) else {
                    continue;
                };
                if pages_a.is_disjoint(pages_b) {
                    continue;
                }

                let union: BTreeSet<&String> = pages_a.iter().chain(pages_b.iter()).collect();
                let pages: Vec<&Page> = union
                    .iter()
                    .filter_map(|url| catalogue.page(url))
                    .collect();
                if pages.is_empty() {
                    continue;
                }

                let title_hits = pages
                    .iter()
                    .filter(|page| {
                        page.title_or_heading_contains(first)
                            || page.title_or_heading_contains(second)
                    })
                    .count();
                let avg_volume = average_volume(&pages);
                let impact = self.composite_score(
                    ConflictType::SemanticSimilarity,
                    pages.len(),
                    avg_volume,
                    title_hits,
                );
                let severity = severity_for(impact);

                conflicts.push(KeywordConflict {
                    keyword: (*first).clone(),
                    related_keyword: Some((*second).clone()),
                    conflict_type: ConflictType::SemanticSimilarity,
                    severity,
                    impact_score: impact,
                    pages: union.iter().map(|url| (*url).clone()).collect(),
                    recommendation: build_recommendation(
                        first, &pages, severity, impact, avg_volume,
                    ),
                });
            }
        }

        conflicts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| b.impact_score.cmp(&a.impact_score))
                .then_with(|| a.keyword.cmp(&b.keyword))
        });

        let mut summary = ConflictSummary::default();
        for conflict in &conflicts {
            match conflict.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
        }

        CannibalizationReport {
            generated_at: Utc::now(),
            catalogue_version: catalogue.version(),
            keywords_checked: catalogue.keyword_index().keyword_count(),
            conflicts,
            summary,
        }
    }

    /// Exact match: at least two claimers carry the keyword literally in
    /// title or headings. One literal claimer, or containment inside a longer
    /// keyword on some claimer's list, is partial overlap. Anything else is
    /// semantic-only competition.
    fn classify(&self, keyword: &str, pages: &[&Page], title_hits: usize) -> ConflictType {
        if title_hits >= 2 {
            return ConflictType::ExactMatch;
        }
        if title_hits == 1 {
            return ConflictType::PartialOverlap;
        }
        let inside_longer = pages.iter().any(|page| {
            page.keywords.iter().any(|other| {
                let normalized = normalize_keyword(other);
                normalized != keyword && normalized.contains(keyword)
            })
        });
        if inside_longer {
            ConflictType::PartialOverlap
        } else {
            ConflictType::SemanticSimilarity
        }
    }

    fn composite_score(
        &self,
        conflict_type: ConflictType,
        page_count: usize,
        avg_volume: u32,
        title_hits: usize,
    ) -> u32 {
        let base = match conflict_type {
            ConflictType::ExactMatch => self.config.exact_weight,
            ConflictType::PartialOverlap => self.config.partial_weight,
            ConflictType::SemanticSimilarity => self.config.semantic_weight,
        };
        let volume_tier = if avg_volume >= self.config.volume_high {
            2
        } else if avg_volume >= self.config.volume_mid {
            1
        } else {
            0
        };
        base + (page_count as u32 - 1) + volume_tier + title_hits as u32
    }
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn severity_for(score: u32) -> Severity {
    match score {
        s if s >= 7 => Severity::Critical,
        s if s >= 5 => Severity::High,
        s if s >= 3 => Severity::Medium,
        _ => Severity::Low,
    }
}

fn average_volume(pages: &[&Page]) -> u32 {
    if pages.is_empty() {
        return 0;
    }
    let sum: u64 = pages
        .iter()
        .map(|page| u64::from(page.search_volume.unwrap_or(0)))
        .sum();
    (sum / pages.len() as u64) as u32
}

/// Shared words over union words for two keyword phrases.
fn word_overlap(a: &str, b: &str) -> f64 {
    let words_a: BTreeSet<String> = tokenize(a).into_iter().collect();
    let words_b: BTreeSet<String> = tokenize(b).into_iter().collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let shared = words_a.intersection(&words_b).count() as f64;
    let union = words_a.union(&words_b).count() as f64;
    shared / union
}
