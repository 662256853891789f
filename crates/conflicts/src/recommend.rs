//! Primary-page selection and per-conflict recommendations.

use crate::types::{ConflictRecommendation, RecommendedAction, Severity};
use chrono::{DateTime, Utc};
use siteiq_catalogue::Page;

/// How strongly a page deserves to keep a contested keyword. Longer and
/// fresher content, existing search volume and a first-page rank all count.
#[must_use]
pub fn content_score(page: &Page, now: DateTime<Utc>) -> f64 {
    let length = page.word_count() as f64 / 100.0;

    let age_days = (now - page.last_modified).num_days();
    let recency = if age_days <= 90 {
        2.0
    } else if age_days <= 365 {
        1.0
    } else {
        0.0
    };

    let volume = (f64::from(page.search_volume.unwrap_or(0)) / 1000.0).min(3.0);

    let rank_bonus = match page.search_rank {
        Some(rank) if rank <= 10 => 3.0,
        _ => 0.0,
    };

    length + recency + volume + rank_bonus
}

/// Build the recommendation for one conflict: strongest page becomes
/// primary, the action follows the severity tier.
#[must_use]
pub fn build_recommendation(
    keyword: &str,
    pages: &[&Page],
    severity: Severity,
    impact_score: u32,
    avg_volume: u32,
) -> ConflictRecommendation {
    let now = Utc::now();
    let mut ranked: Vec<(&Page, f64)> = pages
        .iter()
        .map(|page| (*page, content_score(page, now)))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.url.cmp(&b.0.url))
    });

    let primary = ranked
        .first()
        .map(|(page, _)| page.url.clone())
        .unwrap_or_default();
    let others: Vec<String> = ranked
        .get(1..)
        .unwrap_or_default()
        .iter()
        .map(|(p, _)| p.url.clone())
        .collect();

    let (action, secondary_pages) = match severity {
        Severity::Critical => (RecommendedAction::Merge, others),
        Severity::High => (RecommendedAction::Canonical, others),
        Severity::Medium => (RecommendedAction::Differentiate, others),
        // Low stakes: only point the single weakest page at the primary.
        Severity::Low => (
            RecommendedAction::Canonical,
            others.last().cloned().into_iter().collect(),
        ),
    };

    let justification = format!(
        "Keep {primary} as primary for \"{keyword}\" (content score {:.1}); {} {} competing page(s)",
        ranked.first().map_or(0.0, |(_, s)| *s),
        action.as_str(),
        secondary_pages.len()
    );

    let priority = f64::from(impact_score) * 10.0 + f64::from(avg_volume) / 100.0;

    ConflictRecommendation {
        primary_page: primary,
        secondary_pages,
        action,
        justification,
        priority,
    }
}
