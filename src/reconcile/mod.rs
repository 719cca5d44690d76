//! Reading-state reconciliation engine.
//!
//! Pure, synchronous transformations over a [`TitleRecord`]. Callers must
//! serialize calls per title; the [`Database`](crate::database::Database)
//! hands out one lock per slug for that.

use crate::model::Progress;
use crate::model::ProgressObservation;
use crate::model::ScraperResponse;
use crate::model::TitleRecord;
use crate::reconcile::cache::MergeMode;
use crate::reconcile::notification::NotificationDiff;
use crate::reconcile::ordering::OrderingAnomaly;

pub mod cache;
pub mod list;
pub mod notification;
pub mod ordering;
pub mod progress;
pub mod view;

/// What a reconciliation did to a title.
#[derive(Clone, Debug, PartialEq)]
pub enum Reconciliation {
    Updated(TitleUpdate),
    /// The scrape failed; the record was left untouched.
    ScrapeFailed { status: u16, message: String },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TitleUpdate {
    pub created: bool,
    /// The scrape came from another provider than the cached entry.
    pub provider_switched: bool,
    pub meta_changed: bool,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Chapters surfaced as new by this run.
    pub new_chapters: Vec<String>,
    pub anomalies: Vec<OrderingAnomaly>,
}

impl Reconciliation {
    pub fn new_chapters(&self) -> &[String] {
        match self {
            Reconciliation::Updated(update) => &update.new_chapters,
            Reconciliation::ScrapeFailed { .. } => &[],
        }
    }
}

/// Which side of the progress pair an observation updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressKind {
    /// Local, possibly optimistic.
    Local,
    /// Confirmed by a sync backend.
    Confirmed,
}

/// Runs a scraper response through cache merge, ordering and notification
/// diffing, updating `record` in place.
pub fn reconcile_title(
    slug: &str,
    record: &mut TitleRecord,
    response: &ScraperResponse,
    mode: MergeMode,
    now: i64,
) -> Reconciliation {
    let scraped = match response {
        ScraperResponse::Success(data) => data,
        ScraperResponse::Failure(err) => {
            return Reconciliation::ScrapeFailed {
                status: err.status,
                message: err.err.clone(),
            };
        }
    };

    let provider_switched = record
        .cache
        .as_ref()
        .is_some_and(|c| c.provider != scraped.provider);
    let previous_furthest = record.furthest_progress();

    let merged = cache::merge(slug, record.cache.as_ref(), scraped, mode, now);
    record.cache = Some(merged.entry);

    // A pruned chapter still counts as read.
    let furthest = [previous_furthest, record.furthest_progress()]
        .into_iter()
        .flatten()
        .max_by(f64::total_cmp);
    let chapters = record
        .cache
        .as_ref()
        .map(|c| c.chapters.as_slice())
        .unwrap_or_default();
    // Chapter ids of another provider live in another namespace, so a
    // switch is handled like a first sighting of the title.
    let diff = if provider_switched {
        NotificationDiff {
            new_chapters: Vec::new(),
            notified: record.notified.clone().unwrap_or_default(),
        }
    } else {
        notification::diff(chapters, &merged.added, record.notified.as_ref(), furthest)
    };
    record.notified = Some(diff.notified);
    record.flagged = diff.new_chapters.iter().cloned().collect();

    Reconciliation::Updated(TitleUpdate {
        created: merged.created,
        provider_switched,
        meta_changed: merged.meta_changed,
        added: merged.added,
        removed: merged.removed,
        new_chapters: diff.new_chapters,
        anomalies: merged.anomalies,
    })
}

/// Merges a progress observation for one chapter. Returns `None` when the
/// chapter is not in the title's cache entry.
pub fn record_progress(
    record: &mut TitleRecord,
    chapter_id: &str,
    observation: &ProgressObservation,
    kind: ProgressKind,
) -> Option<Progress> {
    if !record
        .cache
        .as_ref()
        .is_some_and(|c| c.contains_chapter(chapter_id))
    {
        return None;
    }

    let map = match kind {
        ProgressKind::Local => &mut record.reading.progress,
        ProgressKind::Confirmed => &mut record.reading.confirmed,
    };
    let merged = progress::reconcile(map.get(chapter_id), chapter_id, observation);
    map.insert(chapter_id.to_string(), merged.clone());
    Some(merged)
}
