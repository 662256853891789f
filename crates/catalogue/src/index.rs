use crate::page::Page;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Canonical keyword form used for every index key: lower-cased,
/// punctuation stripped, whitespace collapsed. Hyphens, underscores and
/// slashes count as word separators ("tower-crane" == "tower crane").
#[must_use]
pub fn normalize_keyword(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else if ch.is_whitespace() || matches!(ch, '-' | '_' | '/') {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Mapping from normalized keyword to the set of page urls claiming it.
///
/// The index is the authoritative input for conflict detection. It is never
/// read stale: the catalogue patches it synchronously inside every page
/// mutation. Tombstoned pages do not appear here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordIndex {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl KeywordIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from scratch over a set of pages.
    pub fn rebuild<'a>(pages: impl Iterator<Item = &'a Page>) -> Self {
        let mut index = Self::new();
        for page in pages {
            index.apply_page(page);
        }
        index
    }

    /// Re-sync a single page: drop its previous claims, then re-add the
    /// current keyword list unless the page is tombstoned.
    pub fn apply_page(&mut self, page: &Page) {
        self.remove_page(&page.url);
        if page.removed {
            return;
        }
        for keyword in &page.keywords {
            let normalized = normalize_keyword(keyword);
            if normalized.is_empty() {
                continue;
            }
            self.entries
                .entry(normalized)
                .or_default()
                .insert(page.url.clone());
        }
    }

    /// Drop every claim made by `url`.
    pub fn remove_page(&mut self, url: &str) {
        self.entries.retain(|_, pages| {
            pages.remove(url);
            !pages.is_empty()
        });
    }

    /// Pages claiming `keyword` (normalized before lookup).
    #[must_use]
    pub fn pages_for(&self, keyword: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(&normalize_keyword(keyword))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.entries.iter()
    }

    /// Normalized keywords only, without their page sets.
    pub fn keywords(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    #[must_use]
    pub fn keyword_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(url: &str, keywords: &[&str]) -> Page {
        let mut page = Page::new(url, "en");
        page.keywords = keywords.iter().map(|k| k.to_string()).collect();
        page
    }

    #[test]
    fn normalization_strips_punctuation_and_case() {
        assert_eq!(normalize_keyword("  Tower-Crane   Rental! "), "tower crane rental");
        assert_eq!(normalize_keyword("Kran, mieten"), "kran mieten");
        assert_eq!(normalize_keyword("...",), "");
    }

    #[test]
    fn apply_page_replaces_previous_claims() {
        let mut index = KeywordIndex::new();
        let mut p = page("/a", &["tower crane", "crane rental"]);
        index.apply_page(&p);
        assert!(index.pages_for("Tower Crane").is_some());

        p.keywords = vec!["mobile crane".to_string()];
        index.apply_page(&p);
        assert!(index.pages_for("tower crane").is_none());
        assert!(index.pages_for("crane rental").is_none());
        assert_eq!(
            index.pages_for("mobile crane").map(|s| s.len()),
            Some(1)
        );
    }

    #[test]
    fn tombstoned_pages_are_dropped() {
        let mut index = KeywordIndex::new();
        let mut p = page("/a", &["tower crane"]);
        index.apply_page(&p);
        p.removed = true;
        index.apply_page(&p);
        assert!(index.is_empty());
    }

    #[test]
    fn rebuild_matches_incremental_application() {
        let pages = vec![
            page("/a", &["tower crane", "crane rental"]),
            page("/b", &["crane rental"]),
            page("/c", &[]),
        ];
        let rebuilt = KeywordIndex::rebuild(pages.iter());
        let mut incremental = KeywordIndex::new();
        for p in &pages {
            incremental.apply_page(p);
        }
        assert_eq!(rebuilt.keyword_count(), incremental.keyword_count());
        assert_eq!(
            rebuilt.pages_for("crane rental").map(|s| s.len()),
            Some(2)
        );
    }

    #[test]
    fn empty_keywords_never_indexed() {
        let mut index = KeywordIndex::new();
        index.apply_page(&page("/a", &["", "   ", "!!"]));
        assert!(index.is_empty());
    }
}
