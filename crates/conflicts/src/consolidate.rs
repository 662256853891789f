//! Best-effort application of conflict recommendations to the catalogue.

use crate::types::{ConsolidationItem, ConsolidationOutcome, KeywordConflict, RecommendedAction};
use siteiq_catalogue::{normalize_keyword, Catalogue, CatalogueError};

/// Apply the `top_n` highest-priority recommendations. Every attempted item
/// lands in the outcome with its success flag; a failing item never stops
/// the ones after it.
pub fn apply_batch(
    catalogue: &mut Catalogue,
    conflicts: &[KeywordConflict],
    top_n: usize,
) -> ConsolidationOutcome {
    let mut ranked: Vec<&KeywordConflict> = conflicts.iter().collect();
    ranked.sort_by(|a, b| {
        b.recommendation
            .priority
            .partial_cmp(&a.recommendation.priority)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(top_n);

    let mut outcome = ConsolidationOutcome::default();
    for conflict in ranked {
        let item = apply_one(catalogue, conflict);
        if !item.success {
            log::warn!(
                "Consolidation step failed for \"{}\": {}",
                item.keyword,
                item.detail
            );
        }
        outcome.items.push(item);
        outcome.processed += 1;
    }
    outcome
}

fn apply_one(catalogue: &mut Catalogue, conflict: &KeywordConflict) -> ConsolidationItem {
    let rec = &conflict.recommendation;
    let description = describe(conflict);

    let result = match rec.action {
        RecommendedAction::Merge => merge(catalogue, conflict),
        RecommendedAction::Canonical => {
            for_each_secondary(conflict, |url| catalogue.set_canonical(url, rec.primary_page.clone()))
        }
        RecommendedAction::Differentiate => differentiate(catalogue, conflict),
        RecommendedAction::Redirect => for_each_secondary(conflict, |url| {
            catalogue.set_redirect(url, rec.primary_page.clone())?;
            catalogue.mark_removed(url)
        }),
        RecommendedAction::Noindex => {
            for_each_secondary(conflict, |url| catalogue.set_noindex(url, true))
        }
    };

    match result {
        Ok(detail) => ConsolidationItem {
            keyword: conflict.keyword.clone(),
            action: description,
            success: true,
            detail,
        },
        Err(err) => ConsolidationItem {
            keyword: conflict.keyword.clone(),
            action: description,
            success: false,
            detail: err.to_string(),
        },
    }
}

fn describe(conflict: &KeywordConflict) -> String {
    let rec = &conflict.recommendation;
    let count = rec.secondary_pages.len();
    match rec.action {
        RecommendedAction::Merge => {
            format!("merge {count} page(s) into {}", rec.primary_page)
        }
        RecommendedAction::Canonical => {
            format!("canonicalize {count} page(s) to {}", rec.primary_page)
        }
        RecommendedAction::Differentiate => format!(
            "differentiate {count} page(s) away from \"{}\"",
            conflict.keyword
        ),
        RecommendedAction::Redirect => {
            format!("redirect {count} page(s) to {}", rec.primary_page)
        }
        RecommendedAction::Noindex => format!("noindex {count} page(s)"),
    }
}

fn for_each_secondary<F>(
    conflict: &KeywordConflict,
    mut apply: F,
) -> Result<String, CatalogueError>
where
    F: FnMut(&str) -> Result<(), CatalogueError>,
{
    if conflict.recommendation.secondary_pages.is_empty() {
        return Ok("no secondary pages to modify".to_string());
    }
    for url in &conflict.recommendation.secondary_pages {
        apply(url)?;
    }
    Ok(format!(
        "applied to {}",
        conflict.recommendation.secondary_pages.join(", ")
    ))
}

/// Fold the secondaries' keywords into the primary, then redirect and
/// tombstone them.
fn merge(catalogue: &mut Catalogue, conflict: &KeywordConflict) -> Result<String, CatalogueError> {
    let rec = &conflict.recommendation;
    if rec.secondary_pages.is_empty() {
        return Ok("no secondary pages to merge".to_string());
    }

    catalogue.merge_keywords_into(&rec.primary_page, &rec.secondary_pages)?;
    for url in &rec.secondary_pages {
        catalogue.set_redirect(url, rec.primary_page.clone())?;
        catalogue.mark_removed(url)?;
    }
    Ok(format!(
        "merged {} into {}",
        rec.secondary_pages.join(", "),
        rec.primary_page
    ))
}

/// Remove the contested keyword from every secondary's list so only the
/// primary keeps claiming it.
fn differentiate(
    catalogue: &mut Catalogue,
    conflict: &KeywordConflict,
) -> Result<String, CatalogueError> {
    if conflict.recommendation.secondary_pages.is_empty() {
        return Ok("no secondary pages to modify".to_string());
    }
    let target = normalize_keyword(&conflict.keyword);
    for url in &conflict.recommendation.secondary_pages {
        let Some(page) = catalogue.page(url) else {
            return Err(CatalogueError::UnknownPage(url.clone()));
        };
        let kept: Vec<String> = page
            .keywords
            .iter()
            .filter(|k| normalize_keyword(k) != target)
            .cloned()
            .collect();
        catalogue.set_keywords(url, kept)?;
    }
    Ok(format!(
        "removed \"{}\" from {}",
        conflict.keyword,
        conflict.recommendation.secondary_pages.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::ConflictDetector;
    use pretty_assertions::assert_eq;
    use siteiq_catalogue::Page;

    fn page(url: &str, title: &str, keywords: &[&str], words: usize) -> Page {
        let mut page = Page::new(url, "en");
        page.title = title.to_string();
        page.keywords = keywords.iter().map(|k| k.to_string()).collect();
        page.body = vec!["crane"; words].join(" ");
        page
    }

    #[test]
    fn critical_conflict_is_merged_and_disappears_from_the_next_scan() {
        let mut catalogue = Catalogue::new();
        catalogue.upsert_page(page("/a", "Mobile Crane Hire", &["mobile crane"], 500));
        catalogue.upsert_page(page("/b", "Mobile Crane Hire", &["mobile crane", "crane fleet"], 100));
        catalogue.upsert_page(page("/c", "Mobile Crane Hire", &["mobile crane"], 50));
        for url in ["/a", "/b", "/c"] {
            catalogue.set_search_metrics(url, Some(2000), None).unwrap();
        }

        let mut detector = ConflictDetector::new();
        let outcome = detector.auto_consolidate(&mut catalogue, None);

        assert_eq!(outcome.processed, 1);
        assert!(outcome.items[0].success);
        assert!(outcome.items[0].action.starts_with("merge"));

        let b = catalogue.page("/b").unwrap();
        assert!(b.removed);
        assert_eq!(b.redirect_to.as_deref(), Some("/a"));
        // Secondary keywords were folded into the primary.
        assert!(catalogue
            .page("/a")
            .unwrap()
            .keywords
            .iter()
            .any(|k| k == "crane fleet"));

        let report = detector.detect_cannibalization(&catalogue);
        assert!(report.is_empty());
    }

    #[test]
    fn high_conflict_sets_canonicals_and_keeps_pages_live() {
        let mut catalogue = Catalogue::new();
        catalogue.upsert_page(page("/a", "Crane Rental Hamburg", &["crane rental"], 600));
        catalogue.upsert_page(page("/b", "Our Services", &["crane rental"], 150));
        catalogue.set_search_metrics("/a", Some(1000), None).unwrap();
        catalogue.set_search_metrics("/b", Some(1000), None).unwrap();

        let mut detector = ConflictDetector::new();
        let outcome = detector.auto_consolidate(&mut catalogue, None);

        assert_eq!(outcome.succeeded(), 1);
        let b = catalogue.page("/b").unwrap();
        assert!(!b.removed);
        assert_eq!(b.canonical_url.as_deref(), Some("/a"));
    }

    #[test]
    fn medium_conflict_differentiates_the_secondary_keyword_list() {
        let mut catalogue = Catalogue::new();
        catalogue.upsert_page(page("/a", "Fleet", &["crane", "crane rental"], 400));
        catalogue.upsert_page(page("/b", "Contact", &["crane", "contact"], 100));

        let mut detector = ConflictDetector::new();
        let outcome = detector.auto_consolidate(&mut catalogue, None);

        assert_eq!(outcome.succeeded(), 1);
        let b = catalogue.page("/b").unwrap();
        assert!(!b.keywords.iter().any(|k| k == "crane"));
        assert!(b.keywords.iter().any(|k| k == "contact"));

        let report = detector.detect_cannibalization(&catalogue);
        assert!(report.is_empty());
    }

    #[test]
    fn one_failed_item_never_stops_the_batch() {
        let mut catalogue = Catalogue::new();
        catalogue.upsert_page(page(
            "/a",
            "Alpha Beta and Gamma Delta",
            &["alpha beta", "gamma delta"],
            500,
        ));
        catalogue.upsert_page(page(
            "/b",
            "Alpha Beta and Gamma Delta",
            &["alpha beta", "gamma delta"],
            100,
        ));
        for url in ["/a", "/b"] {
            catalogue.set_search_metrics(url, Some(2000), None).unwrap();
        }

        let mut detector = ConflictDetector::new();
        let outcome = detector.auto_consolidate(&mut catalogue, None);

        // The first merge tombstones /b; the second conflict's merge then
        // fails on the already-removed page and is reported, not swallowed.
        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.succeeded(), 1);
        assert_eq!(outcome.failed(), 1);
        let failed = outcome.items.iter().find(|item| !item.success).unwrap();
        assert!(!failed.detail.is_empty());
    }

    #[test]
    fn consolidation_respects_the_requested_limit() {
        let mut catalogue = Catalogue::new();
        catalogue.upsert_page(page("/a", "One", &["kw one", "kw two"], 300));
        catalogue.upsert_page(page("/b", "Two", &["kw one", "kw two"], 100));

        let mut detector = ConflictDetector::new();
        let outcome = detector.auto_consolidate(&mut catalogue, Some(1));
        assert_eq!(outcome.processed, 1);
    }
}
