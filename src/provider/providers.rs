//! Provider registry.

use std::sync::Arc;

use crate::model::ScraperResponse;
use crate::provider::Provider;
use crate::provider::error::ProviderError;

/// Registry of scraper providers. The first registered provider is the
/// default for list entries without an explicit provider.
pub struct Providers {
    providers: Vec<Arc<dyn Provider>>,
}

impl Providers {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    pub fn add_provider(&mut self, provider: Arc<dyn Provider>) {
        self.providers.push(provider);
    }

    pub fn get_provider(&self, id: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.get_id() == id)
    }

    /// Provider to use for an entry, falling back to the default one.
    pub fn resolve(&self, id: Option<&str>) -> Result<&Arc<dyn Provider>, ProviderError> {
        match id {
            Some(id) => self
                .get_provider(id)
                .ok_or_else(|| ProviderError::UnsupportedProvider {
                    provider: id.to_string(),
                }),
            None => self.providers.first().ok_or(ProviderError::NoProviders),
        }
    }

    pub async fn fetch(
        &self,
        slug: &str,
        provider: Option<&str>,
    ) -> Result<ScraperResponse, ProviderError> {
        Ok(self.resolve(provider)?.fetch(slug).await)
    }

    pub fn get_all_providers(&self) -> Vec<Arc<dyn Provider>> {
        self.providers.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for Providers {
    fn default() -> Self {
        Self::new()
    }
}
