use std::collections::BTreeSet;

use crate::model::Chapter;
use crate::model::MangaCacheEntry;
use crate::model::NotifiedSet;
use crate::model::Progress;
use crate::model::TitleReading;
use crate::reconcile::progress;

/// Everything known about one title. Owned by a single lock in the database.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TitleRecord {
    pub cache: Option<MangaCacheEntry>,
    pub reading: TitleReading,
    /// `None` until the title went through its first reconciliation.
    pub notified: Option<NotifiedSet>,
    /// Chapters flagged new by the latest reconciliation. Not persisted.
    pub flagged: BTreeSet<String>,
}

impl TitleRecord {
    pub fn effective_progress(&self, chapter_id: &str) -> Option<&Progress> {
        progress::effective(
            self.reading.progress.get(chapter_id),
            self.reading.confirmed.get(chapter_id),
        )
    }

    /// Combined key of the furthest ordered chapter with any progress.
    pub fn furthest_progress(&self) -> Option<f64> {
        let cache = self.cache.as_ref()?;
        self.reading
            .chapter_ids()
            .into_iter()
            .filter_map(|id| cache.combined_of(id))
            .max_by(f64::total_cmp)
    }

    /// Most recent effective progress timestamp over every chapter read,
    /// ordered or not.
    pub fn last_read_at(&self) -> Option<i64> {
        self.reading
            .chapter_ids()
            .into_iter()
            .filter_map(|id| self.effective_progress(id).map(|p| p.at))
            .max()
    }

    /// The chapter the user read most recently, with its effective progress.
    /// Ties on the timestamp go to the later chapter.
    pub fn current(&self) -> Option<(&Chapter, &Progress)> {
        let cache = self.cache.as_ref()?;
        cache
            .chapters
            .iter()
            .filter(|c| c.is_ordered())
            .filter_map(|c| self.effective_progress(&c.href_string).map(|p| (c, p)))
            .max_by(|(ca, pa), (cb, pb)| {
                pa.at
                    .cmp(&pb.at)
                    .then_with(|| ca.combined.unwrap_or(0.0).total_cmp(&cb.combined.unwrap_or(0.0)))
            })
    }

    /// Whether a chapter should carry the "new" flag right now.
    pub fn is_new(&self, chapter: &Chapter) -> bool {
        if !self.flagged.contains(&chapter.href_string) {
            return false;
        }
        match (chapter.combined, self.furthest_progress()) {
            (Some(key), Some(limit)) => key > limit,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}
