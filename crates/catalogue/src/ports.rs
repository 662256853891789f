//! Collaborator contracts supplied by the host application.
//!
//! The engine never talks to a real search engine or analytics backend; it
//! calls these ports and leaves transport, retries and credentials to the
//! host. None of the built-in behavior is simulated here.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Impression,
    Click,
    Conversion,
}

/// Event emitted for external reporting, tagged with the experiment and
/// variant that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub test_id: String,
    pub variant_id: String,
    pub kind: EventKind,
}

/// Fire-and-forget analytics sink. A failing sink must never affect the
/// engine's own counters; callers log and move on.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn record(&self, event: &AnalyticsEvent) -> Result<()>;
}

/// Position lookup for a keyword/url pair in an external search engine.
/// `Ok(None)` means "not ranked in the checked window", which is a normal
/// answer, not an error.
#[async_trait]
pub trait RankChecker: Send + Sync {
    async fn check_rank(&self, keyword: &str, url: &str) -> Result<Option<u32>>;
}

/// Submission of a url for (re)indexing. Implementations report acceptance
/// of the submission, not eventual indexing.
#[async_trait]
pub trait IndexSubmitter: Send + Sync {
    async fn submit(&self, url: &str) -> Result<()>;
}
