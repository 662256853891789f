use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One page of the site as the engine sees it.
///
/// The `url` path is the page identifier and is immutable once the page
/// enters the catalogue. Pages are never hard-deleted; `removed` tombstones
/// them so historical analyses stay reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// URL path, unique identifier ("/rental/tower-cranes").
    pub url: String,

    /// Language tag ("en", "de", ...).
    pub language: String,

    pub title: String,
    pub meta_description: String,
    pub headings: Vec<String>,

    /// Free-form body text.
    pub body: String,

    /// Ordered keyword assignment. Rewritten by the analyzer or the
    /// conflict detector; always mirrored into the keyword index.
    pub keywords: Vec<String>,

    pub category: Option<String>,

    pub last_modified: DateTime<Utc>,

    /// Externally supplied metrics (keyword feed, rank checker).
    pub search_volume: Option<u32>,
    pub search_rank: Option<u32>,

    /// Tombstone flag.
    #[serde(default)]
    pub removed: bool,

    /// Consolidation side effects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(default)]
    pub noindex: bool,
}

impl Page {
    pub fn new(url: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            language: language.into(),
            title: String::new(),
            meta_description: String::new(),
            headings: Vec::new(),
            body: String::new(),
            keywords: Vec::new(),
            category: None,
            last_modified: Utc::now(),
            search_volume: None,
            search_rank: None,
            removed: false,
            canonical_url: None,
            redirect_to: None,
            noindex: false,
        }
    }

    /// Whitespace-separated word count of the body.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.body.split_whitespace().count()
    }

    /// Title, headings, meta description and body joined for full-text scans.
    #[must_use]
    pub fn full_text(&self) -> String {
        let mut text = String::with_capacity(
            self.title.len() + self.meta_description.len() + self.body.len() + 64,
        );
        text.push_str(&self.title);
        for heading in &self.headings {
            text.push('\n');
            text.push_str(heading);
        }
        text.push('\n');
        text.push_str(&self.meta_description);
        text.push('\n');
        text.push_str(&self.body);
        text
    }

    /// True when the title or any heading contains `needle` (case-insensitive).
    #[must_use]
    pub fn title_or_heading_contains(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        if self.title.to_lowercase().contains(&needle) {
            return true;
        }
        self.headings
            .iter()
            .any(|h| h.to_lowercase().contains(&needle))
    }
}
