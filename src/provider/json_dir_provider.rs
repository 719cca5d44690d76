//! Provider serving snapshots written by an external scraper.
//!
//! Layout: `<root>/<provider id>/<slug>.json`, each file holding a
//! [`ScraperResponse`] or a bare successful payload.

use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use log::debug;
use log::info;
use log::warn;

use crate::model::ScraperError;
use crate::model::ScraperResponse;
use crate::provider::BaseProvider;
use crate::provider::Provider;
use crate::provider::ProviderInfo;
use crate::provider::error::ProviderError;

pub struct JsonDirProvider {
    base: BaseProvider,
    dir: PathBuf,
}

impl JsonDirProvider {
    pub fn new(id: &str, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            base: BaseProvider::new(ProviderInfo {
                id: id.to_string(),
                name: id.to_string(),
                base_url: format!("file://{}", dir.display()),
            }),
            dir,
        }
    }

    /// One provider per subdirectory of `root`, sorted by id. A missing
    /// root yields no providers.
    pub async fn discover(root: &Path) -> Result<Vec<Self>, ProviderError> {
        let io_error = |source| ProviderError::Io {
            path: root.to_string_lossy().to_string(),
            source,
        };
        if !tokio::fs::try_exists(root).await.map_err(io_error)? {
            warn!("Providers directory {} does not exist.", root.display());
            return Ok(Vec::new());
        }

        let mut providers = Vec::new();
        let mut entries = tokio::fs::read_dir(root).await.map_err(io_error)?;
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            if !entry.file_type().await.map_err(io_error)?.is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().to_string();
            providers.push(Self::new(&id, entry.path()));
        }
        providers.sort_by(|a, b| a.get_id().cmp(b.get_id()));
        info!(
            "Discovered {} providers in {}.",
            providers.len(),
            root.display()
        );
        Ok(providers)
    }

    fn snapshot_path(&self, slug: &str) -> Option<PathBuf> {
        let valid = !slug.is_empty()
            && !slug.starts_with('.')
            && !slug.contains(['/', '\\']);
        valid.then(|| self.dir.join(format!("{slug}.json")))
    }
}

#[async_trait]
impl Provider for JsonDirProvider {
    async fn fetch(&self, slug: &str) -> ScraperResponse {
        let Some(path) = self.snapshot_path(slug) else {
            return ScraperError::new(400, format!("Invalid slug `{slug}`")).into();
        };
        debug!("Reading snapshot {}.", path.display());

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return ScraperError::new(404, format!("No snapshot for `{slug}`")).into();
            }
            Err(e) => {
                return ScraperError::new(500, format!("{}: {e}", path.display())).into();
            }
        };

        match serde_json::from_slice::<ScraperResponse>(&raw) {
            Ok(ScraperResponse::Success(mut data)) => {
                if data.provider.is_empty() {
                    data.provider = self.get_id().to_string();
                }
                data.into()
            }
            Ok(failure) => failure,
            Err(e) => ScraperError::new(422, format!("{}: {e}", path.display())).into(),
        }
    }

    fn get_base(&self) -> &BaseProvider {
        &self.base
    }
}
