use serde::Deserialize;
use serde::Serialize;

use crate::model::manga::MangaData;
use crate::model::manga::MangaMeta;

/// Result of scraping a title. A fetch either fully succeeds or fails.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScraperResponse {
    Success(ScraperData),
    Failure(ScraperError),
}

impl ScraperResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, ScraperResponse::Success(_))
    }

    pub fn as_data(&self) -> Option<&ScraperData> {
        match self {
            ScraperResponse::Success(data) => Some(data),
            ScraperResponse::Failure(_) => None,
        }
    }
}

/// Data returned by a successful scrape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScraperData {
    pub constant: MangaMeta,
    pub data: MangaData,
    /// Provider id, e.g. "mangadex".
    pub provider: String,
}

/// Structured scraper failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScraperError {
    pub status: u16,
    pub err: String,
}

impl ScraperError {
    pub fn new(status: u16, err: impl Into<String>) -> Self {
        Self {
            status,
            err: err.into(),
        }
    }
}

impl From<ScraperData> for ScraperResponse {
    fn from(value: ScraperData) -> Self {
        ScraperResponse::Success(value)
    }
}

impl From<ScraperError> for ScraperResponse {
    fn from(value: ScraperError) -> Self {
        ScraperResponse::Failure(value)
    }
}
