use crate::engine::LinkEngine;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use siteiq_catalogue::Catalogue;
use std::cmp::Reverse;
use std::collections::HashMap;

const TOP_AUTHORITIES: usize = 5;

/// Authority ranking entry for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageAuthority {
    pub url: String,

    /// Sum of inbound suggestion relevances.
    pub authority: f64,

    pub inbound_links: usize,
}

/// Site-wide internal linking health report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkAudit {
    pub total_pages: usize,
    pub total_suggestions: usize,
    pub average_links_per_page: f64,
    pub top_authorities: Vec<PageAuthority>,

    /// Live pages no suggestion points at, most substantial first.
    pub orphan_pages: Vec<String>,

    pub recommendations: Vec<String>,
}

impl LinkEngine {
    /// Build the suggested-link graph over every live page and derive
    /// site-wide linking health from it. Edges carry the suggestion
    /// relevance; a page's authority is its weighted in-degree.
    pub fn link_audit(&mut self, catalogue: &Catalogue) -> LinkAudit {
        let mut graph: DiGraph<String, f64> = DiGraph::new();
        let mut nodes: HashMap<String, NodeIndex> = HashMap::new();
        for page in catalogue.live_pages() {
            nodes.insert(page.url.clone(), graph.add_node(page.url.clone()));
        }

        let mut total_suggestions = 0usize;
        for page in catalogue.live_pages() {
            let suggestions =
                self.generate_link_suggestions(&page.body, &page.url, &page.keywords, catalogue);
            for suggestion in &suggestions {
                let (Some(&from), Some(&to)) =
                    (nodes.get(&page.url), nodes.get(&suggestion.target_url))
                else {
                    continue;
                };
                graph.add_edge(from, to, suggestion.relevance);
            }
            total_suggestions += suggestions.len();
        }

        let mut authorities: Vec<PageAuthority> = graph
            .node_indices()
            .map(|idx| {
                let inbound = graph.edges_directed(idx, Direction::Incoming);
                let (mut authority, mut count) = (0.0, 0);
                for edge in inbound {
                    authority += *edge.weight();
                    count += 1;
                }
                PageAuthority {
                    url: graph[idx].clone(),
                    authority,
                    inbound_links: count,
                }
            })
            .collect();
        authorities.sort_by(|a, b| {
            b.authority
                .partial_cmp(&a.authority)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.url.cmp(&b.url))
        });

        let mut orphan_pages: Vec<String> = authorities
            .iter()
            .filter(|a| a.inbound_links == 0)
            .map(|a| a.url.clone())
            .collect();
        orphan_pages
            .sort_by_key(|url| Reverse(catalogue.page(url).map_or(0, |p| p.word_count())));

        let total_pages = nodes.len();
        let average_links_per_page = if total_pages == 0 {
            0.0
        } else {
            total_suggestions as f64 / total_pages as f64
        };

        let mut recommendations: Vec<String> = orphan_pages
            .iter()
            .map(|url| {
                format!("{url} has no inbound link suggestions; add contextual links from related pages")
            })
            .collect();
        if total_pages > 1 && average_links_per_page < 1.0 {
            recommendations.push(
                "Fewer than one internal link per page on average; broaden keyword coverage or add related content"
                    .to_string(),
            );
        }

        let top_authorities: Vec<PageAuthority> = authorities
            .iter()
            .filter(|a| a.inbound_links > 0)
            .take(TOP_AUTHORITIES)
            .cloned()
            .collect();

        log::info!(
            "link audit: {total_pages} pages, {total_suggestions} suggestions, {} orphans",
            orphan_pages.len()
        );

        LinkAudit {
            total_pages,
            total_suggestions,
            average_links_per_page,
            top_authorities,
            orphan_pages,
            recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use siteiq_catalogue::Page;

    fn page(url: &str, keywords: &[&str], category: Option<&str>, body: &str) -> Page {
        let mut page = Page::new(url, "en");
        page.keywords = keywords.iter().map(|k| k.to_string()).collect();
        page.category = category.map(str::to_string);
        page.body = body.to_string();
        page
    }

    #[test]
    fn audit_reports_orphans_and_authorities() {
        let mut catalogue = Catalogue::new();
        catalogue.upsert_page(page(
            "/hub",
            &["crane rental"],
            Some("rental"),
            "We rent many machines.",
        ));
        catalogue.upsert_page(page(
            "/spoke",
            &["mobile crane", "crane rental"],
            Some("rental"),
            "Our crane rental service covers the region.",
        ));

        let mut engine = LinkEngine::new();
        let audit = engine.link_audit(&catalogue);

        assert_eq!(audit.total_pages, 2);
        assert_eq!(audit.total_suggestions, 1);
        assert!((audit.average_links_per_page - 0.5).abs() < 1e-9);

        assert_eq!(audit.top_authorities.len(), 1);
        assert_eq!(audit.top_authorities[0].url, "/hub");
        assert_eq!(audit.top_authorities[0].inbound_links, 1);
        assert!((audit.top_authorities[0].authority - 0.58).abs() < 1e-9);

        assert_eq!(audit.orphan_pages, vec!["/spoke".to_string()]);
        assert!(audit.recommendations.iter().any(|r| r.contains("/spoke")));
    }

    #[test]
    fn substantial_orphans_lead_the_remediation_list() {
        let mut catalogue = Catalogue::new();
        catalogue.upsert_page(page("/alpha", &["excavator hire"], None, "Short text."));
        catalogue.upsert_page(page(
            "/zeta",
            &["site logistics"],
            None,
            "A much longer body with many more words inside it overall.",
        ));

        let mut engine = LinkEngine::new();
        let audit = engine.link_audit(&catalogue);

        assert_eq!(audit.total_suggestions, 0);
        assert_eq!(
            audit.orphan_pages,
            vec!["/zeta".to_string(), "/alpha".to_string()]
        );
        assert_eq!(audit.recommendations.len(), 3);
        assert!(audit.recommendations[0].contains("/zeta"));
    }

    #[test]
    fn empty_catalogue_audits_clean() {
        let mut engine = LinkEngine::new();
        let audit = engine.link_audit(&Catalogue::new());

        assert_eq!(audit.total_pages, 0);
        assert_eq!(audit.total_suggestions, 0);
        assert_eq!(audit.average_links_per_page, 0.0);
        assert!(audit.top_authorities.is_empty());
        assert!(audit.orphan_pages.is_empty());
        assert!(audit.recommendations.is_empty());
    }
}
