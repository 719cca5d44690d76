//! Display-oriented projection of a title record.

use serde::Serialize;

use crate::model::Chapter;
use crate::model::MangaMeta;
use crate::model::Progress;
use crate::model::TitleRecord;
use crate::reconcile::progress;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterView {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub progress: Option<Progress>,
    pub real_progress: Option<Progress>,
    /// Progress considered authoritative for display, with derived fields
    /// and the `new` flag filled in.
    pub effective: Option<Progress>,
    pub is_new: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleView {
    pub slug: String,
    pub meta: MangaMeta,
    pub provider: String,
    pub saved_at: i64,
    /// Chapters in reading order.
    pub chapters: Vec<ChapterView>,
    /// Effective progress of the chapter read most recently.
    pub current: Option<Progress>,
    pub new_count: usize,
}

/// Attaches reading state to the cached chapters of a title.
/// Returns `None` for titles that were never scraped successfully.
pub fn title_view(slug: &str, record: &TitleRecord) -> Option<TitleView> {
    let cache = record.cache.as_ref()?;

    let chapters: Vec<ChapterView> = cache
        .chapters
        .iter()
        .map(|chapter| {
            let id = chapter.href_string.as_str();
            let is_new = record.is_new(chapter);
            let effective = record.effective_progress(id).map(|p| {
                let mut p = progress::with_derived(p.clone());
                p.new = Some(is_new);
                p
            });
            ChapterView {
                chapter: chapter.clone(),
                progress: record.reading.progress.get(id).cloned(),
                real_progress: record.reading.confirmed.get(id).cloned(),
                effective,
                is_new,
            }
        })
        .collect();

    Some(TitleView {
        slug: slug.to_string(),
        meta: cache.meta.clone(),
        provider: cache.provider.clone(),
        saved_at: cache.saved_at,
        new_count: chapters.iter().filter(|c| c.is_new).count(),
        current: record
            .current()
            .map(|(_, p)| progress::with_derived(p.clone())),
        chapters,
    })
}
