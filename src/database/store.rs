//! Key-value document persistence.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use log::debug;
use log::info;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::database::error::DatabaseError;
use crate::model::List;
use crate::model::MangaCacheEntry;
use crate::model::NotifiedSet;
use crate::model::TitleReading;

/// Entire persisted database.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseDocument {
    #[serde(default)]
    pub manga_cache: BTreeMap<String, MangaCacheEntry>,
    #[serde(default)]
    pub reading_new: BTreeMap<String, TitleReading>,
    #[serde(default)]
    pub notified: BTreeMap<String, NotifiedSet>,
    #[serde(default)]
    pub lists: Vec<List>,
    #[serde(default)]
    pub other: Other,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Other {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub icon: String,
}

/// The persisted subtrees of one title.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TitleDocument {
    pub cache: Option<MangaCacheEntry>,
    pub reading: TitleReading,
    pub notified: Option<NotifiedSet>,
}

impl DatabaseDocument {
    /// Replaces every subtree of `slug` with `title`.
    pub fn put_title(&mut self, slug: &str, title: &TitleDocument) {
        match &title.cache {
            Some(cache) => self.manga_cache.insert(slug.to_string(), cache.clone()),
            None => self.manga_cache.remove(slug),
        };
        if title.reading.is_empty() {
            self.reading_new.remove(slug);
        } else {
            self.reading_new
                .insert(slug.to_string(), title.reading.clone());
        }
        match &title.notified {
            Some(notified) => self.notified.insert(slug.to_string(), notified.clone()),
            None => self.notified.remove(slug),
        };
    }

    pub fn title(&self, slug: &str) -> TitleDocument {
        TitleDocument {
            cache: self.manga_cache.get(slug).cloned(),
            reading: self.reading_new.get(slug).cloned().unwrap_or_default(),
            notified: self.notified.get(slug).cloned(),
        }
    }

    /// Every slug that has at least one subtree.
    pub fn slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = self
            .manga_cache
            .keys()
            .chain(self.reading_new.keys())
            .chain(self.notified.keys())
            .cloned()
            .collect();
        slugs.sort();
        slugs.dedup();
        slugs
    }
}

/// Persistence backend. Writes replace whole subtrees.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    async fn load(&self) -> Result<DatabaseDocument, DatabaseError>;
    async fn write_title(&self, slug: &str, title: &TitleDocument) -> Result<(), DatabaseError>;
    async fn write_lists(&self, lists: &[List]) -> Result<(), DatabaseError>;
}

/// Stores the whole document as one JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    document: Mutex<Option<DatabaseDocument>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> DatabaseError {
        DatabaseError::Io {
            path: self.path.to_string_lossy().to_string(),
            source,
        }
    }

    async fn read(&self) -> Result<DatabaseDocument, DatabaseError> {
        if !tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| self.io_error(e))?
        {
            debug!(
                "Database file {} does not exist. Starting empty.",
                self.path.display()
            );
            return Ok(DatabaseDocument::default());
        }
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(DatabaseDocument::default());
        }
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Writes to a sibling temp file first so a crash never leaves a
    /// truncated document behind.
    async fn flush(&self, document: &DatabaseDocument) -> Result<(), DatabaseError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let raw = serde_json::to_vec_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(())
    }

    /// Applies `f` to a copy of the document. The cached copy is only
    /// replaced once the file was written.
    async fn modify<F>(&self, f: F) -> Result<(), DatabaseError>
    where
        F: FnOnce(&mut DatabaseDocument) + Send,
    {
        let mut guard = self.document.lock().await;
        let mut document = match guard.as_ref() {
            Some(document) => document.clone(),
            None => self.read().await?,
        };
        f(&mut document);
        self.flush(&document).await?;
        *guard = Some(document);
        Ok(())
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn load(&self) -> Result<DatabaseDocument, DatabaseError> {
        let document = self.read().await?;
        info!(
            "Loaded {} cached titles and {} lists from {}.",
            document.manga_cache.len(),
            document.lists.len(),
            self.path.display()
        );
        *self.document.lock().await = Some(document.clone());
        Ok(document)
    }

    async fn write_title(&self, slug: &str, title: &TitleDocument) -> Result<(), DatabaseError> {
        self.modify(|doc| doc.put_title(slug, title)).await
    }

    async fn write_lists(&self, lists: &[List]) -> Result<(), DatabaseError> {
        self.modify(|doc| doc.lists = lists.to_vec()).await
    }
}

/// Keeps the document in memory only.
#[derive(Default)]
pub struct MemoryStore {
    document: Mutex<DatabaseDocument>,
}

impl MemoryStore {
    pub fn new(document: DatabaseDocument) -> Self {
        Self {
            document: Mutex::new(document),
        }
    }

    pub async fn document(&self) -> DatabaseDocument {
        self.document.lock().await.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load(&self) -> Result<DatabaseDocument, DatabaseError> {
        Ok(self.document.lock().await.clone())
    }

    async fn write_title(&self, slug: &str, title: &TitleDocument) -> Result<(), DatabaseError> {
        self.document.lock().await.put_title(slug, title);
        Ok(())
    }

    async fn write_lists(&self, lists: &[List]) -> Result<(), DatabaseError> {
        self.document.lock().await.lists = lists.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_title_replaces_and_removes_subtrees() {
        let mut doc = DatabaseDocument::default();
        let mut title = TitleDocument {
            notified: Some(["a".to_string()].into_iter().collect()),
            ..Default::default()
        };
        doc.put_title("x", &title);
        assert!(doc.notified.contains_key("x"));
        assert!(!doc.reading_new.contains_key("x"));
        assert_eq!(doc.slugs(), vec!["x".to_string()]);

        title.notified = None;
        doc.put_title("x", &title);
        assert!(doc.notified.is_empty());
        assert!(doc.slugs().is_empty());
    }

    #[test]
    fn test_document_keeps_unknown_sections() {
        let raw = r#"{
            "manga_cache": {},
            "reading_new": {},
            "notified": {"x": ["1", "2"]},
            "lists": [],
            "other": {"host": "http://localhost:3000"},
            "settings": {"icon": "light"}
        }"#;
        let doc: DatabaseDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.other.host.as_deref(), Some("http://localhost:3000"));
        assert_eq!(doc.settings.icon, "light");
        assert_eq!(doc.title("x").notified.unwrap().len(), 2);

        let again: DatabaseDocument =
            serde_json::from_str(&serde_json::to_string(&doc).unwrap()).unwrap();
        assert_eq!(again, doc);
    }

    #[tokio::test]
    async fn test_failed_flush_is_not_written_later() {
        let name = format!("manga-sync-store-{}.json", uuid::Uuid::new_v4());
        let path = std::env::temp_dir().join(name);
        let store = JsonFileStore::new(&path);
        store.load().await.unwrap();

        // A directory in place of the temp file makes the next flush fail
        let blocker = path.with_extension("json.tmp");
        std::fs::create_dir(&blocker).unwrap();
        let failed = TitleDocument {
            notified: Some(Default::default()),
            ..Default::default()
        };
        assert!(store.write_title("x", &failed).await.is_err());
        std::fs::remove_dir(&blocker).unwrap();

        store.write_title("y", &failed).await.unwrap();
        let on_disk = JsonFileStore::new(&path).load().await.unwrap();
        assert_eq!(on_disk.slugs(), vec!["y".to_string()]);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::default();
        let title = TitleDocument {
            notified: Some(Default::default()),
            ..Default::default()
        };
        store.write_title("x", &title).await.unwrap();
        assert_eq!(store.load().await.unwrap().title("x"), title);
    }
}
