use crate::error::{CatalogueError, Result};
use crate::index::{normalize_keyword, KeywordIndex};
use crate::keywords::KeywordRecord;
use crate::page::Page;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};

/// Shared page catalogue: the process-wide store every component reads and
/// writes. Single-writer-at-a-time usage is assumed; there is no lock here,
/// the calling context is the serialization boundary.
///
/// The keyword index is patched synchronously inside every mutation and the
/// `version` epoch is bumped, so dependent caches (conflict reports, link
/// relevance) can detect staleness without observing partial state.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    pages: BTreeMap<String, Page>,
    index: KeywordIndex,
    version: u64,
}

impl Catalogue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a page. The url is the key; replacing never changes
    /// the identifier. A tombstoned page is revived when fresh content for
    /// the same url is ingested.
    pub fn upsert_page(&mut self, page: Page) {
        self.index.apply_page(&page);
        self.pages.insert(page.url.clone(), page);
        self.version += 1;
    }

    #[must_use]
    pub fn page(&self, url: &str) -> Option<&Page> {
        self.pages.get(url)
    }

    /// All pages that are not tombstoned.
    pub fn live_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values().filter(|p| !p.removed)
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live_pages().count()
    }

    /// Replace a page's keyword list. Rejected for tombstoned pages.
    pub fn set_keywords(&mut self, url: &str, keywords: Vec<String>) -> Result<()> {
        let page = self.live_page_mut(url)?;
        page.keywords = keywords;
        page.last_modified = Utc::now();
        let page = page.clone();
        self.index.apply_page(&page);
        self.version += 1;
        Ok(())
    }

    /// Replace a page's body text.
    pub fn set_body(&mut self, url: &str, body: String) -> Result<()> {
        let page = self.live_page_mut(url)?;
        page.body = body;
        page.last_modified = Utc::now();
        self.version += 1;
        Ok(())
    }

    /// Tombstone a page. Its claims leave the keyword index but the record
    /// stays for historical analyses.
    pub fn mark_removed(&mut self, url: &str) -> Result<()> {
        let page = self
            .pages
            .get_mut(url)
            .ok_or_else(|| CatalogueError::UnknownPage(url.to_string()))?;
        page.removed = true;
        self.index.remove_page(url);
        self.version += 1;
        Ok(())
    }

    pub fn set_canonical(&mut self, url: &str, canonical: String) -> Result<()> {
        let page = self.live_page_mut(url)?;
        page.canonical_url = Some(canonical);
        self.version += 1;
        Ok(())
    }

    pub fn set_redirect(&mut self, url: &str, target: String) -> Result<()> {
        let page = self.live_page_mut(url)?;
        page.redirect_to = Some(target);
        self.version += 1;
        Ok(())
    }

    pub fn set_noindex(&mut self, url: &str, noindex: bool) -> Result<()> {
        let page = self.live_page_mut(url)?;
        page.noindex = noindex;
        self.version += 1;
        Ok(())
    }

    pub fn set_search_metrics(
        &mut self,
        url: &str,
        volume: Option<u32>,
        rank: Option<u32>,
    ) -> Result<()> {
        let page = self.live_page_mut(url)?;
        page.search_volume = volume;
        page.search_rank = rank;
        self.version += 1;
        Ok(())
    }

    /// Fold the secondaries' keyword lists into the primary's, deduplicated
    /// by normalized form and preserving the primary's order. Secondaries
    /// missing from the catalogue are skipped; the primary must be live.
    pub fn merge_keywords_into(
        &mut self,
        primary_url: &str,
        secondary_urls: &[String],
    ) -> Result<()> {
        let primary = self
            .pages
            .get(primary_url)
            .ok_or_else(|| CatalogueError::UnknownPage(primary_url.to_string()))?;
        if primary.removed {
            return Err(CatalogueError::PageRemoved(primary_url.to_string()));
        }

        let mut merged = primary.keywords.clone();
        let mut seen: BTreeSet<String> = merged.iter().map(|k| normalize_keyword(k)).collect();
        for url in secondary_urls {
            if let Some(page) = self.pages.get(url) {
                for keyword in &page.keywords {
                    if seen.insert(normalize_keyword(keyword)) {
                        merged.push(keyword.clone());
                    }
                }
            }
        }
        self.set_keywords(primary_url, merged)
    }

    /// Fold keyword-feed metrics into the pages claiming those keywords.
    /// A page gets the highest search volume among its own keywords.
    pub fn apply_keyword_metrics(&mut self, records: &[KeywordRecord]) {
        let volumes: BTreeMap<String, u32> = records
            .iter()
            .map(|r| (normalize_keyword(&r.keyword), r.search_volume))
            .collect();

        let mut touched = false;
        for page in self.pages.values_mut().filter(|p| !p.removed) {
            let best = page
                .keywords
                .iter()
                .filter_map(|k| volumes.get(&normalize_keyword(k)))
                .max()
                .copied();
            if let Some(volume) = best {
                page.search_volume = Some(volume);
                touched = true;
            }
        }
        if touched {
            self.version += 1;
        }
    }

    /// The authoritative keyword index. Always consistent with the pages.
    #[must_use]
    pub fn keyword_index(&self) -> &KeywordIndex {
        &self.index
    }

    /// Mutation epoch. Bumped on every change; cache consumers compare
    /// against the epoch they captured.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    fn live_page_mut(&mut self, url: &str) -> Result<&mut Page> {
        let page = self
            .pages
            .get_mut(url)
            .ok_or_else(|| CatalogueError::UnknownPage(url.to_string()))?;
        if page.removed {
            return Err(CatalogueError::PageRemoved(url.to_string()));
        }
        Ok(page)
    }
}
