use serde::Deserialize;
use serde::Serialize;

use crate::model::scraper::ScraperResponse;

/// User-curated collection of titles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub show_on_home: bool,
    /// `true` for lists the user created, `false` for built-in ones.
    #[serde(default)]
    pub by_creator: bool,
    pub name: String,
    pub slug: String,
    /// Derived: most recent reading timestamp among the entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<i64>,
    #[serde(default)]
    pub entries: Vec<ListEntry>,
}

impl List {
    pub fn new(name: impl Into<String>, slug: impl Into<String>, by_creator: bool) -> Self {
        Self {
            show_on_home: true,
            by_creator,
            name: name.into(),
            slug: slug.into(),
            last: None,
            entries: Vec::new(),
        }
    }

    pub fn contains(&self, slug: &str, provider: Option<&str>) -> bool {
        self.entries
            .iter()
            .any(|e| e.slug == slug && e.provider.as_deref() == provider)
    }
}

/// Reference to a cached title, optionally carrying the last scraper response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ScraperResponse>,
}

impl ListEntry {
    pub fn new(slug: impl Into<String>, provider: Option<String>) -> Self {
        Self {
            slug: slug.into(),
            provider,
            data: None,
        }
    }
}
