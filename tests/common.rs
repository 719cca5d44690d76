//! Common test utilities and mock implementations.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::TimeZone;
use chrono::Utc;
use manga_sync::database::Database;
use manga_sync::database::store::JsonFileStore;
use manga_sync::model::Chapter;
use manga_sync::model::MangaData;
use manga_sync::model::MangaMeta;
use manga_sync::model::ScraperData;
use manga_sync::model::ScraperError;
use manga_sync::model::ScraperResponse;
use manga_sync::provider::BaseProvider;
use manga_sync::provider::Provider;
use manga_sync::provider::ProviderInfo;
use uuid::Uuid;

/// Temporary path for a JSON database file.
pub fn temp_db_path() -> PathBuf {
    std::env::temp_dir().join(format!("manga-sync-test-{}.json", Uuid::new_v4()))
}

/// Sets up a database backed by a temporary JSON file.
#[allow(dead_code)]
pub async fn setup_db() -> (Arc<Database>, PathBuf) {
    let db_path = temp_db_path();
    let db = open_db(&db_path).await;
    (db, db_path)
}

#[allow(dead_code)]
pub async fn open_db(db_path: &PathBuf) -> Arc<Database> {
    let store = Arc::new(JsonFileStore::new(db_path));
    Arc::new(
        Database::open(store)
            .await
            .expect("Failed to open database"),
    )
}

/// Cleans up the test database file.
#[allow(dead_code)]
pub async fn teardown_db(db_path: PathBuf) {
    if db_path.exists() {
        let _ = std::fs::remove_file(db_path);
    }
}

#[allow(dead_code)]
pub fn date(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day.clamp(1, 28), 0, 0, 0)
        .single()
        .expect("valid date")
}

/// Numbered season 0 chapters whose ids are their numbers.
#[allow(dead_code)]
pub fn chapters(numbers: &[f64]) -> Vec<Chapter> {
    numbers
        .iter()
        .map(|n| Chapter::new(0, Some(*n), format!("Chapter {n}"), n.to_string(), date(1)))
        .collect()
}

#[allow(dead_code)]
pub fn success(slug: &str, title: &str, provider: &str, chapters: Vec<Chapter>) -> ScraperResponse {
    ScraperResponse::Success(ScraperData {
        constant: MangaMeta {
            slug: slug.to_string(),
            title: title.to_string(),
            ..Default::default()
        },
        data: MangaData {
            chapters,
            chapter_images: None,
        },
        provider: provider.to_string(),
    })
}

// MOCK PROVIDER

/// Mock scraper returning whatever response was set per slug.
#[derive(Clone)]
#[allow(dead_code)]
pub struct MockProvider {
    pub base: BaseProvider,
    pub state: Arc<RwLock<MockProviderState>>,
}

#[derive(Default, Clone)]
#[allow(dead_code)]
pub struct MockProviderState {
    pub responses: HashMap<String, ScraperResponse>,
    pub fetches: usize,
}

#[allow(dead_code)]
impl MockProvider {
    pub fn new(id: &str) -> Self {
        let info = ProviderInfo {
            id: id.to_string(),
            name: "MockProvider".to_string(),
            base_url: format!("https://{id}.test"),
        };
        Self {
            base: BaseProvider::new(info),
            state: Arc::new(RwLock::new(MockProviderState::default())),
        }
    }

    /// Sets the response for a slug.
    pub fn set_response(&self, slug: &str, response: ScraperResponse) {
        self.state
            .write()
            .unwrap()
            .responses
            .insert(slug.to_string(), response);
    }

    /// Sets a successful response listing `numbers`.
    pub fn set_chapters(&self, slug: &str, title: &str, numbers: &[f64]) {
        let response = success(slug, title, self.get_id(), chapters(numbers));
        self.set_response(slug, response);
    }

    pub fn fetches(&self) -> usize {
        self.state.read().unwrap().fetches
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn fetch(&self, slug: &str) -> ScraperResponse {
        let mut state = self.state.write().unwrap();
        state.fetches += 1;
        state
            .responses
            .get(slug)
            .cloned()
            .unwrap_or_else(|| ScraperError::new(404, format!("{slug} not found")).into())
    }

    fn get_base(&self) -> &BaseProvider {
        &self.base
    }
}
