use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// A single chapter of a title, as scraped from a provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Season of the chapter. Providers without seasons report 0.
    #[serde(default)]
    pub season: i32,
    /// Chapter number, e.g. `12` or `12.5`. `None` for specials/extras
    /// that carry no number.
    #[serde(default)]
    pub chapter: Option<f64>,
    /// Display label, e.g. "Chapter 123" or "Z= 123".
    pub label: String,
    pub date: DateTime<Utc>,
    /// Provider-scoped chapter id. For mangasee this is "x-y", MangaDex has
    /// its own id per chapter.
    pub href_string: String,
    /// Season and chapter combined for sorting, e.g. `300012`.
    /// `None` when the chapter could not be ordered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined: Option<f64>,
}

impl Chapter {
    pub fn new(
        season: i32,
        chapter: impl Into<Option<f64>>,
        label: impl Into<String>,
        href_string: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            season,
            chapter: chapter.into(),
            label: label.into(),
            date,
            href_string: href_string.into(),
            combined: None,
        }
    }

    /// Whether the chapter takes part in ordering-dependent operations.
    pub fn is_ordered(&self) -> bool {
        self.combined.is_some()
    }
}
