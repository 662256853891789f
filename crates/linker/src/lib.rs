//! Contextual internal linking for SiteIQ.
//!
//! Finds places in page content where other live pages' keywords appear,
//! scores each candidate link by keyword-profile relevance, injects the
//! accepted links as `<a href>` anchors and audits the resulting link graph
//! for orphaned pages and authority concentration.

mod audit;
mod engine;
mod phrases;

pub use audit::{LinkAudit, PageAuthority};
pub use engine::{inject_contextual_links, LinkEngine, LinkSuggestion, LinkerConfig};
pub use phrases::{find_phrase_occurrences, LinkablePhrase};
