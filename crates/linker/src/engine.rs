use crate::phrases::find_phrase_occurrences;
use lru::LruCache;
use serde::Serialize;
use siteiq_catalogue::{normalize_keyword, Catalogue, Page};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::num::NonZeroUsize;

const OVERLAP_WEIGHT: f64 = 0.6;
const CATEGORY_WEIGHT: f64 = 0.25;
const DIVERSITY_WEIGHT: f64 = 0.15;

/// Keyword-profile size at which the diversity bonus saturates.
const DIVERSITY_SPAN: usize = 5;

/// Tuning knobs for suggestion generation.
#[derive(Debug, Clone)]
pub struct LinkerConfig {
    /// Suggestions scoring below this are dropped.
    pub min_relevance: f64,

    /// Hard cap on suggestions per call.
    pub max_links_per_page: usize,

    /// Cap per target page while `distribute_authority` is on.
    pub max_per_target: usize,

    /// Spread links across targets instead of piling onto the best one.
    pub distribute_authority: bool,

    /// Noun-phrase expansion width around a keyword match, in words.
    pub phrase_window: usize,

    /// Capacity of the page-pair relevance cache.
    pub cache_size: usize,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            min_relevance: 0.3,
            max_links_per_page: 5,
            max_per_target: 2,
            distribute_authority: true,
            phrase_window: 1,
            cache_size: 256,
        }
    }
}

/// One proposed internal link. Advisory output only; suggestions are
/// recomputed on demand and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkSuggestion {
    /// Anchor text exactly as it appears in the content.
    pub anchor_text: String,

    /// URL path of the page to link to.
    pub target_url: String,

    /// Score in `[0, 1]`.
    pub relevance: f64,

    /// The sentence the anchor sits in.
    pub context: String,

    /// Byte offset of the anchor in the scanned content.
    pub position: usize,

    /// Human-readable explanation of why the link was proposed.
    pub reason: String,
}

/// Contextual link suggestion engine.
///
/// Relevance between two pages depends only on their keyword profiles and
/// categories, so scores are cached per page pair. The cache is dropped
/// whenever the catalogue epoch moves.
pub struct LinkEngine {
    config: LinkerConfig,
    relevance_cache: LruCache<(String, String), f64>,
    cache_epoch: u64,
}

impl Default for LinkEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LinkerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: LinkerConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_size.max(1))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            relevance_cache: LruCache::new(capacity),
            cache_epoch: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &LinkerConfig {
        &self.config
    }

    /// Propose internal links from `content` to other live pages.
    ///
    /// Other pages' keywords are located inside the content sentence by
    /// sentence and widened to noun phrases; each occurrence becomes a
    /// candidate scored by profile relevance. Candidates below
    /// `min_relevance`, pointing at `current_url` itself, repeating a
    /// (target, anchor) pair, or exceeding the per-target and per-page caps
    /// are dropped. The survivors come back ordered by relevance.
    pub fn generate_link_suggestions(
        &mut self,
        content: &str,
        current_url: &str,
        current_keywords: &[String],
        catalogue: &Catalogue,
    ) -> Vec<LinkSuggestion> {
        self.refresh_cache(catalogue.version());
        if content.trim().is_empty() {
            return Vec::new();
        }

        let current_page = catalogue.page(current_url);
        let language = current_page
            .map_or("en", |p| p.language.as_str())
            .to_string();
        let current_category = current_page.and_then(|p| p.category.clone());

        let mut candidates = Vec::new();
        for target in catalogue.live_pages() {
            if target.url == current_url || target.noindex || target.redirect_to.is_some() {
                continue;
            }
            let relevance = self.relevance_for(
                current_url,
                current_keywords,
                current_category.as_deref(),
                target,
            );
            if relevance < self.config.min_relevance {
                continue;
            }
            for keyword in &target.keywords {
                for phrase in
                    find_phrase_occurrences(content, keyword, &language, self.config.phrase_window)
                {
                    candidates.push(LinkSuggestion {
                        anchor_text: phrase.text,
                        target_url: target.url.clone(),
                        relevance,
                        context: phrase.sentence,
                        position: phrase.position,
                        reason: format!("matches \"{keyword}\" claimed by {}", target.url),
                    });
                }
            }
        }

        candidates.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.position.cmp(&b.position))
                .then_with(|| a.target_url.cmp(&b.target_url))
        });

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut per_target: HashMap<String, usize> = HashMap::new();
        let mut accepted = Vec::new();
        for candidate in candidates {
            if accepted.len() == self.config.max_links_per_page {
                break;
            }
            let pair = (
                candidate.target_url.clone(),
                candidate.anchor_text.to_lowercase(),
            );
            if !seen.insert(pair) {
                continue;
            }
            let used = per_target.entry(candidate.target_url.clone()).or_insert(0);
            if self.config.distribute_authority && *used >= self.config.max_per_target {
                continue;
            }
            *used += 1;
            accepted.push(candidate);
        }

        log::debug!("{} link suggestions for {current_url}", accepted.len());
        accepted
    }

    fn relevance_for(
        &mut self,
        current_url: &str,
        current_keywords: &[String],
        current_category: Option<&str>,
        target: &Page,
    ) -> f64 {
        let key = (current_url.to_string(), target.url.clone());
        if let Some(cached) = self.relevance_cache.get(&key) {
            return *cached;
        }
        let relevance = relevance_between(current_keywords, current_category, target);
        self.relevance_cache.put(key, relevance);
        relevance
    }

    fn refresh_cache(&mut self, version: u64) {
        if self.cache_epoch != version {
            self.relevance_cache.clear();
            self.cache_epoch = version;
            log::debug!("link relevance cache cleared at catalogue epoch {version}");
        }
    }
}

/// Profile relevance of linking from a page with `current_keywords` to
/// `target`: weighted keyword-set overlap, plus a bonus when both pages sit
/// in the same category, plus a small bonus for targets with a broad
/// keyword profile. Capped at 1.0.
fn relevance_between(
    current_keywords: &[String],
    current_category: Option<&str>,
    target: &Page,
) -> f64 {
    let current: BTreeSet<String> = current_keywords
        .iter()
        .map(|k| normalize_keyword(k))
        .filter(|k| !k.is_empty())
        .collect();
    let targets: BTreeSet<String> = target
        .keywords
        .iter()
        .map(|k| normalize_keyword(k))
        .filter(|k| !k.is_empty())
        .collect();
    if targets.is_empty() {
        return 0.0;
    }

    let shared = current.intersection(&targets).count();
    let union = current.union(&targets).count();
    let overlap = if union == 0 {
        0.0
    } else {
        shared as f64 / union as f64
    };

    let category = match (current_category, target.category.as_deref()) {
        (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => 1.0,
        _ => 0.0,
    };

    let diversity = targets.len().min(DIVERSITY_SPAN) as f64 / DIVERSITY_SPAN as f64;

    (OVERLAP_WEIGHT * overlap + CATEGORY_WEIGHT * category + DIVERSITY_WEIGHT * diversity).min(1.0)
}

/// Apply accepted suggestions to `content`, wrapping each anchor in an
/// `<a href>` tag. Suggestions are applied back to front so earlier byte
/// offsets stay valid. A suggestion whose span overlaps an already applied
/// one, or whose anchor no longer matches the content, is skipped.
#[must_use]
pub fn inject_contextual_links(content: &str, suggestions: &[LinkSuggestion]) -> String {
    let mut ordered: Vec<&LinkSuggestion> = suggestions.iter().collect();
    ordered.sort_by(|a, b| b.position.cmp(&a.position));

    let mut out = content.to_string();
    let mut applied_floor = usize::MAX;
    for suggestion in ordered {
        let start = suggestion.position;
        let end = start + suggestion.anchor_text.len();
        if end > applied_floor || !out.is_char_boundary(start) || !out.is_char_boundary(end) {
            log::warn!(
                "skipping link to {} at {start}: span unavailable",
                suggestion.target_url
            );
            continue;
        }
        if out[start..end] != suggestion.anchor_text {
            log::warn!(
                "skipping link to {} at {start}: anchor text drifted",
                suggestion.target_url
            );
            continue;
        }
        let link = format!(
            "<a href=\"{}\">{}</a>",
            suggestion.target_url, suggestion.anchor_text
        );
        out.replace_range(start..end, &link);
        applied_floor = start;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(url: &str, keywords: &[&str], category: Option<&str>) -> Page {
        let mut page = Page::new(url, "en");
        page.keywords = keywords.iter().map(|k| k.to_string()).collect();
        page.category = category.map(str::to_string);
        page
    }

    fn suggestion(anchor: &str, target: &str, position: usize) -> LinkSuggestion {
        LinkSuggestion {
            anchor_text: anchor.to_string(),
            target_url: target.to_string(),
            relevance: 0.5,
            context: String::new(),
            position,
            reason: String::new(),
        }
    }

    #[test]
    fn suggestions_never_target_the_current_page() {
        let mut catalogue = Catalogue::new();
        catalogue.upsert_page(page("/a", &["crane rental"], Some("rental")));
        catalogue.upsert_page(page("/b", &["crane rental"], Some("rental")));

        let keywords = vec!["crane rental".to_string()];
        let mut engine = LinkEngine::new();
        let suggestions =
            engine.generate_link_suggestions("Crane rental made easy.", "/a", &keywords, &catalogue);

        assert!(suggestions.iter().all(|s| s.target_url != "/a"));
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].target_url, "/b");
        assert_eq!(suggestions[0].anchor_text, "Crane rental made");
        assert!(suggestions[0].relevance <= 1.0);
        assert!((suggestions[0].relevance - 0.88).abs() < 1e-9);
    }

    #[test]
    fn weak_targets_fall_below_the_relevance_floor() {
        let mut catalogue = Catalogue::new();
        catalogue.upsert_page(page("/b", &["crane rental"], None));

        let keywords = vec!["excavator hire".to_string()];
        let content = "Our crane rental desk is open.";

        let mut engine = LinkEngine::new();
        assert!(engine
            .generate_link_suggestions(content, "/a", &keywords, &catalogue)
            .is_empty());

        let mut permissive = LinkEngine::with_config(LinkerConfig {
            min_relevance: 0.0,
            ..LinkerConfig::default()
        });
        let suggestions =
            permissive.generate_link_suggestions(content, "/a", &keywords, &catalogue);
        assert_eq!(suggestions.len(), 1);
        assert!(suggestions[0].relevance < 0.3);
    }

    #[test]
    fn output_respects_the_page_cap() {
        let mut catalogue = Catalogue::new();
        catalogue.upsert_page(page("/a", &["crane rental"], Some("rental")));
        for i in 1..=7 {
            catalogue.upsert_page(page(&format!("/t{i}"), &["crane rental"], Some("rental")));
        }

        let keywords = vec!["crane rental".to_string()];
        let mut engine = LinkEngine::new();
        let suggestions =
            engine.generate_link_suggestions("Crane rental made easy.", "/a", &keywords, &catalogue);

        let targets: Vec<&str> = suggestions.iter().map(|s| s.target_url.as_str()).collect();
        assert_eq!(targets, vec!["/t1", "/t2", "/t3", "/t4", "/t5"]);
    }

    #[test]
    fn authority_distribution_caps_a_single_target() {
        let mut catalogue = Catalogue::new();
        catalogue.upsert_page(page("/b", &["tower crane", "crane rental"], None));

        let content = "Tower crane hire made simple. Rent a tower crane today. \
                       Crane rental quotes in minutes. Compare crane rental offers now.";
        let keywords = vec!["tower crane".to_string(), "crane rental".to_string()];

        let mut engine = LinkEngine::new();
        let capped = engine.generate_link_suggestions(content, "/a", &keywords, &catalogue);
        assert_eq!(capped.len(), 2);

        let mut open = LinkEngine::with_config(LinkerConfig {
            distribute_authority: false,
            ..LinkerConfig::default()
        });
        let all = open.generate_link_suggestions(content, "/a", &keywords, &catalogue);
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn identical_anchor_target_pairs_collapse() {
        let mut catalogue = Catalogue::new();
        catalogue.upsert_page(page("/b", &["tower crane"], None));

        let content = "Tower crane hire. Tower crane hire.";
        let keywords = vec!["tower crane".to_string()];
        let mut engine = LinkEngine::new();
        let suggestions = engine.generate_link_suggestions(content, "/a", &keywords, &catalogue);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].position, 0);
    }

    #[test]
    fn suggestions_come_back_ordered_by_relevance() {
        let mut catalogue = Catalogue::new();
        catalogue.upsert_page(page("/a", &["tower crane", "crane rental"], Some("rental")));
        catalogue.upsert_page(page("/hi", &["tower crane", "crane rental"], Some("rental")));
        catalogue.upsert_page(page("/lo", &["site logistics", "crane rental"], Some("rental")));

        let content = "Site logistics planning matters. A tower crane helps.";
        let keywords = vec!["tower crane".to_string(), "crane rental".to_string()];
        let mut engine = LinkEngine::new();
        let suggestions = engine.generate_link_suggestions(content, "/a", &keywords, &catalogue);

        let targets: Vec<&str> = suggestions.iter().map(|s| s.target_url.as_str()).collect();
        assert_eq!(targets, vec!["/hi", "/lo"]);
        assert!(suggestions[0].relevance > suggestions[1].relevance);
    }

    #[test]
    fn relevance_cache_tracks_catalogue_epochs() {
        let mut catalogue = Catalogue::new();
        catalogue.upsert_page(page("/b", &["crane rental"], None));

        let keywords = vec!["excavator hire".to_string()];
        let content = "Our crane rental desk is open.";
        let mut engine = LinkEngine::new();
        assert!(engine
            .generate_link_suggestions(content, "/a", &keywords, &catalogue)
            .is_empty());

        catalogue
            .set_keywords(
                "/b",
                vec!["crane rental".to_string(), "excavator hire".to_string()],
            )
            .unwrap();
        let suggestions = engine.generate_link_suggestions(content, "/a", &keywords, &catalogue);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].target_url, "/b");
    }

    #[test]
    fn unlinkable_targets_are_skipped() {
        let mut catalogue = Catalogue::new();
        catalogue.upsert_page(page("/gone", &["crane rental"], Some("rental")));
        catalogue.upsert_page(page("/hidden", &["crane rental"], Some("rental")));
        catalogue.upsert_page(page("/moved", &["crane rental"], Some("rental")));
        catalogue.mark_removed("/gone").unwrap();
        catalogue.set_noindex("/hidden", true).unwrap();
        catalogue.set_redirect("/moved", "/elsewhere".to_string()).unwrap();

        let keywords = vec!["crane rental".to_string()];
        let mut engine = LinkEngine::new();
        let suggestions =
            engine.generate_link_suggestions("Crane rental made easy.", "/a", &keywords, &catalogue);
        assert!(suggestions.is_empty());
    }

    #[test]
    fn injection_wraps_anchors_back_to_front() {
        let content = "alpha beta gamma";
        let out = inject_contextual_links(
            content,
            &[suggestion("alpha", "/one", 0), suggestion("gamma", "/two", 11)],
        );
        assert_eq!(
            out,
            "<a href=\"/one\">alpha</a> beta <a href=\"/two\">gamma</a>"
        );
    }

    #[test]
    fn drifted_or_out_of_range_positions_are_skipped() {
        let content = "alpha beta gamma";
        let out = inject_contextual_links(
            content,
            &[suggestion("delta", "/x", 0), suggestion("alpha", "/y", 900)],
        );
        assert_eq!(out, content);
    }

    #[test]
    fn overlapping_spans_keep_the_first_applied() {
        let content = "alpha beta gamma";
        let out = inject_contextual_links(
            content,
            &[
                suggestion("alpha beta", "/x", 0),
                suggestion("beta gamma", "/y", 6),
            ],
        );
        assert_eq!(out, "alpha <a href=\"/y\">beta gamma</a>");
    }
}
