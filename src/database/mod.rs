//! In-memory arena of title records backed by a [`Store`].
//!
//! Each title lives behind its own lock so reconciliations of one slug are
//! serialized while different slugs proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use log::info;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

use crate::database::error::DatabaseError;
use crate::database::store::DatabaseDocument;
use crate::database::store::Store;
use crate::database::store::TitleDocument;
use crate::model::List;
use crate::model::TitleRecord;

pub mod error;
pub mod store;

pub type TitleHandle = Arc<Mutex<TitleRecord>>;

pub struct Database {
    store: Arc<dyn Store>,
    titles: RwLock<HashMap<String, TitleHandle>>,
    lists: RwLock<Vec<List>>,
}

impl Database {
    /// Loads the persisted document and builds one record per title.
    pub async fn open(store: Arc<dyn Store>) -> Result<Self, DatabaseError> {
        debug!("Loading database document...");
        let document = store.load().await?;
        let titles = Self::records_from(&document);
        info!(
            "Database loaded with {} titles and {} lists.",
            titles.len(),
            document.lists.len()
        );

        Ok(Self {
            store,
            titles: RwLock::new(titles),
            lists: RwLock::new(document.lists),
        })
    }

    fn records_from(document: &DatabaseDocument) -> HashMap<String, TitleHandle> {
        document
            .slugs()
            .into_iter()
            .map(|slug| {
                let doc = document.title(&slug);
                let record = TitleRecord {
                    cache: doc.cache,
                    reading: doc.reading,
                    notified: doc.notified,
                    flagged: Default::default(),
                };
                (slug, Arc::new(Mutex::new(record)))
            })
            .collect()
    }

    /// Lock handle of a title, created empty when missing.
    pub async fn title(&self, slug: &str) -> TitleHandle {
        if let Some(handle) = self.titles.read().await.get(slug) {
            return handle.clone();
        }
        self.titles
            .write()
            .await
            .entry(slug.to_string())
            .or_default()
            .clone()
    }

    /// Lock handle of a title, only if it is known.
    pub async fn existing_title(&self, slug: &str) -> Option<TitleHandle> {
        self.titles.read().await.get(slug).cloned()
    }

    pub async fn slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = self.titles.read().await.keys().cloned().collect();
        slugs.sort();
        slugs
    }

    /// Clones every title record. Each record is read under its own lock, so
    /// the snapshot never contains a half-merged title.
    pub async fn snapshot(&self) -> HashMap<String, TitleRecord> {
        let handles: Vec<(String, TitleHandle)> = self
            .titles
            .read()
            .await
            .iter()
            .map(|(slug, handle)| (slug.clone(), handle.clone()))
            .collect();

        let mut snapshot = HashMap::with_capacity(handles.len());
        for (slug, handle) in handles {
            snapshot.insert(slug, handle.lock().await.clone());
        }
        snapshot
    }

    /// Persists the subtrees of one title. Call while holding its lock.
    pub async fn persist_title(
        &self,
        slug: &str,
        record: &TitleRecord,
    ) -> Result<(), DatabaseError> {
        let doc = TitleDocument {
            cache: record.cache.clone(),
            reading: record.reading.clone(),
            notified: record.notified.clone(),
        };
        self.store.write_title(slug, &doc).await
    }

    pub async fn lists(&self) -> Vec<List> {
        self.lists.read().await.clone()
    }

    /// Applies `f` to the lists and persists them when it returns `Ok`.
    pub async fn update_lists<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut Vec<List>) -> Result<R, E>,
        E: From<DatabaseError>,
    {
        let mut lists = self.lists.write().await;
        let mut updated = lists.clone();
        let ret = f(&mut updated)?;
        if updated != *lists {
            self.store.write_lists(&updated).await?;
            *lists = updated;
        }
        Ok(ret)
    }
}
