use anyhow::{Context, Result};
use siteiq_catalogue::{Catalogue, Page};
use std::path::Path;

/// Load a page export: a JSON array of pages. Malformed entries are skipped
/// with a warning so one bad record cannot block the whole run; a missing
/// or non-array file is a hard error.
pub async fn load_pages(path: &Path) -> Result<Vec<Page>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read page export {}", path.display()))?;
    let entries: Vec<serde_json::Value> = serde_json::from_slice(&bytes)
        .with_context(|| format!("Page export {} is not a JSON array", path.display()))?;

    let mut pages = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<Page>(entry) {
            Ok(page) => pages.push(page),
            Err(err) => log::warn!("Skipping page export entry {index}: {err}"),
        }
    }
    log::info!("Loaded {} pages from {}", pages.len(), path.display());
    Ok(pages)
}

/// Load a page export straight into a catalogue.
pub async fn load_catalogue(path: &Path) -> Result<Catalogue> {
    let mut catalogue = Catalogue::new();
    for page in load_pages(path).await? {
        catalogue.upsert_page(page);
    }
    Ok(catalogue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn export_entry(url: &str, keywords: &[&str]) -> serde_json::Value {
        let mut page = Page::new(url, "en");
        page.keywords = keywords.iter().map(|k| k.to_string()).collect();
        serde_json::to_value(&page).unwrap()
    }

    #[tokio::test]
    async fn valid_export_loads_every_page() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pages.json");
        let export = serde_json::json!([
            export_entry("/a", &["crane rental"]),
            export_entry("/b", &["tower crane"]),
        ]);
        tokio::fs::write(&path, serde_json::to_vec(&export).unwrap())
            .await
            .unwrap();

        let catalogue = load_catalogue(&path).await.unwrap();
        assert_eq!(catalogue.live_count(), 2);
        assert!(catalogue.page("/a").is_some());
    }

    #[tokio::test]
    async fn malformed_entries_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pages.json");
        let export = serde_json::json!([
            export_entry("/a", &["crane rental"]),
            {"bogus": true},
        ]);
        tokio::fs::write(&path, serde_json::to_vec(&export).unwrap())
            .await
            .unwrap();

        let pages = load_pages(&path).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].url, "/a");
    }

    #[tokio::test]
    async fn missing_export_is_an_error() {
        assert!(load_pages(Path::new("/definitely/not/here.json"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn non_array_export_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pages.json");
        tokio::fs::write(&path, b"{\"url\": \"/a\"}").await.unwrap();
        assert!(load_pages(&path).await.is_err());
    }
}
