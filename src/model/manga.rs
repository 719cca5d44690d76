use serde::Deserialize;
use serde::Serialize;

use crate::model::chapter::Chapter;

/// Mostly unchanging descriptive data of a title.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaMeta {
    pub slug: String,
    pub poster_url: String,
    pub title: String,
    #[serde(default)]
    pub alternate_titles: Vec<String>,
    #[serde(default)]
    pub description_paragraphs: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Dynamic part of a scrape.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaData {
    pub chapters: Vec<Chapter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_images: Option<Vec<String>>,
}

/// Cached state of a title. Source of truth for chapter identity and order.
///
/// Chapters are kept in ascending reading order; chapters without a
/// combined key are kept at the end in the order they were first seen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaCacheEntry {
    pub meta: MangaMeta,
    pub chapters: Vec<Chapter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_images: Option<Vec<String>>,
    pub provider: String,
    /// Timestamp of the last successful merge, in milliseconds.
    pub saved_at: i64,
}

impl MangaCacheEntry {
    pub fn chapter(&self, chapter_id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.href_string == chapter_id)
    }

    pub fn contains_chapter(&self, chapter_id: &str) -> bool {
        self.chapter(chapter_id).is_some()
    }

    /// Combined key of a chapter, if the chapter exists and is ordered.
    pub fn combined_of(&self, chapter_id: &str) -> Option<f64> {
        self.chapter(chapter_id).and_then(|c| c.combined)
    }
}
