use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Keyed document store behind the persistence boundary.
///
/// Components persist their state as independent JSON documents so partial
/// corruption of one key never invalidates the others. `load` of an absent
/// key is `Ok(None)`, not an error.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<Value>>;
    async fn save(&self, key: &str, document: &Value) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store for tests and ephemeral engines.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.documents.lock().expect("store poisoned").get(key).cloned())
    }

    async fn save(&self, key: &str, document: &Value) -> Result<()> {
        self.documents
            .lock()
            .expect("store poisoned")
            .insert(key.to_string(), document.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.documents.lock().expect("store poisoned").remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under a base directory. Writes go through a
/// `.tmp` sibling and an atomic rename so readers never observe a torn
/// document.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", safe_component(key)))
    }
}

#[async_trait]
impl StateStore for JsonDirStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn save(&self, key: &str, document: &Value) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn safe_component(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// Path helper for hosts that keep all engine state under one directory.
#[must_use]
pub fn state_dir_for_site_root(root: &Path) -> PathBuf {
    root.join(".siteiq")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load("missing").await.unwrap().is_none());

        store.save("a", &json!({"n": 1})).await.unwrap();
        assert_eq!(store.load("a").await.unwrap(), Some(json!({"n": 1})));

        store.remove("a").await.unwrap();
        assert!(store.load("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dir_store_roundtrip_and_missing_key() {
        let tmp = TempDir::new().unwrap();
        let store = JsonDirStore::new(tmp.path());

        assert!(store.load("experiments").await.unwrap().is_none());
        store.save("experiments", &json!([1, 2, 3])).await.unwrap();
        assert_eq!(
            store.load("experiments").await.unwrap(),
            Some(json!([1, 2, 3]))
        );

        store.remove("experiments").await.unwrap();
        assert!(store.load("experiments").await.unwrap().is_none());
        // Removing twice stays quiet.
        store.remove("experiments").await.unwrap();
    }

    #[tokio::test]
    async fn dir_store_sanitizes_keys() {
        let tmp = TempDir::new().unwrap();
        let store = JsonDirStore::new(tmp.path());
        store.save("../evil/key", &json!(true)).await.unwrap();
        let entries: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["___evil_key.json".to_string()]);
    }

    #[tokio::test]
    async fn corrupt_document_is_an_error_for_the_caller_to_degrade() {
        let tmp = TempDir::new().unwrap();
        let store = JsonDirStore::new(tmp.path());
        tokio::fs::write(tmp.path().join("state.json"), b"{broken")
            .await
            .unwrap();
        assert!(store.load("state").await.is_err());
    }
}
