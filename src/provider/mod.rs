//! Scraper collaborators.
//!
//! Providers scrape a title and hand back a [`ScraperResponse`]. Network
//! access, rate limiting and page parsing stay inside each implementation.

use async_trait::async_trait;

use crate::model::ScraperResponse;

pub mod error;
pub mod json_dir_provider;
pub mod providers;

/// Static information about a provider.
#[derive(Clone, Debug)]
pub struct ProviderInfo {
    /// Identifier stored in cache entries and list entries, e.g. "mangadex".
    pub id: String,
    /// Human readable name, e.g. "MangaDex".
    pub name: String,
    /// https://provider.tld
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct BaseProvider {
    pub info: ProviderInfo,
}

impl BaseProvider {
    pub fn new(info: ProviderInfo) -> Self {
        Self { info }
    }
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// Scrapes a title. Failures are reported as
    /// [`ScraperResponse::Failure`], never as a partial success.
    async fn fetch(&self, slug: &str) -> ScraperResponse;

    fn get_base(&self) -> &BaseProvider;

    fn get_id(&self) -> &str {
        &self.get_base().info.id
    }

    fn get_info(&self) -> &ProviderInfo {
        &self.get_base().info
    }
}
