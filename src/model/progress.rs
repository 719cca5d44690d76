use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

/// How far the user got in one chapter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Current page.
    pub current: u32,
    /// Total pages in the chapter. 0 when unknown.
    pub total: u32,
    /// Timestamp in milliseconds.
    pub at: i64,
    /// Same as the chapter's `href_string`.
    pub chapter_id: String,
    /// Derived, between 0 and 100. Never read back as input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage_color: Option<String>,
    /// Derived by the notification differ, never persisted.
    #[serde(default, skip_serializing)]
    pub new: Option<bool>,
}

/// A single reading position reported by a reader or a sync backend.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressObservation {
    pub current: u32,
    pub total: u32,
    pub at: i64,
}

impl ProgressObservation {
    pub fn new(current: u32, total: u32, at: i64) -> Self {
        Self { current, total, at }
    }
}

/// Reading state of one title.
///
/// `progress` holds local, possibly optimistic updates. `confirmed` holds
/// values reconciled with a sync backend (`realProgress`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleReading {
    #[serde(default)]
    pub progress: BTreeMap<String, Progress>,
    #[serde(default)]
    pub confirmed: BTreeMap<String, Progress>,
}

impl TitleReading {
    pub fn is_empty(&self) -> bool {
        self.progress.is_empty() && self.confirmed.is_empty()
    }

    /// Ids of every chapter that has any kind of progress.
    pub fn chapter_ids(&self) -> BTreeSet<&str> {
        self.progress
            .keys()
            .chain(self.confirmed.keys())
            .map(String::as_str)
            .collect()
    }
}

/// Chapters already surfaced to the user as new. Only ever grows.
pub type NotifiedSet = BTreeSet<String>;
