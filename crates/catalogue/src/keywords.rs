use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One record from the external keyword feed, consumed verbatim by the
/// analyzer and the conflict detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRecord {
    pub keyword: String,
    pub search_volume: u32,
    pub difficulty: u32,
    pub intent: SearchIntent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub related_keywords: Vec<String>,
    pub language: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchIntent {
    Informational,
    Navigational,
    Transactional,
    Commercial,
}

impl SearchIntent {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SearchIntent::Informational => "informational",
            SearchIntent::Navigational => "navigational",
            SearchIntent::Transactional => "transactional",
            SearchIntent::Commercial => "commercial",
        }
    }
}

/// Keyword feed collaborator: file today, remote feed tomorrow.
#[async_trait]
pub trait KeywordSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<KeywordRecord>>;
}

/// JSON file holding an array of [`KeywordRecord`].
///
/// A missing or unparseable file degrades to an empty feed with a logged
/// warning; the engine must stay usable without keyword data.
#[derive(Debug, Clone)]
pub struct JsonKeywordFile {
    path: PathBuf,
}

impl JsonKeywordFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl KeywordSource for JsonKeywordFile {
    async fn fetch(&self) -> Result<Vec<KeywordRecord>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!(
                    "Keyword feed {} unreadable ({err}); continuing with empty feed",
                    self.path.display()
                );
                return Ok(Vec::new());
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(records) => Ok(records),
            Err(err) => {
                log::warn!(
                    "Keyword feed {} unparseable ({err}); continuing with empty feed",
                    self.path.display()
                );
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_feed_degrades_to_empty() {
        let source = JsonKeywordFile::new("/definitely/not/here.json");
        assert!(source.fetch().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_feed_degrades_to_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("feed.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        let source = JsonKeywordFile::new(&path);
        assert!(source.fetch().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn valid_feed_roundtrips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("feed.json");
        let records = vec![KeywordRecord {
            keyword: "crane rental".to_string(),
            search_volume: 1000,
            difficulty: 45,
            intent: SearchIntent::Transactional,
            category: Some("rental".to_string()),
            related_keywords: vec!["rent a crane".to_string()],
            language: "en".to_string(),
            content_type: "landing".to_string(),
        }];
        tokio::fs::write(&path, serde_json::to_vec(&records).unwrap())
            .await
            .unwrap();

        let source = JsonKeywordFile::new(&path);
        let loaded = source.fetch().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].keyword, "crane rental");
        assert_eq!(loaded[0].intent, SearchIntent::Transactional);
    }
}
