//! Merging scraped snapshots into the manga cache.

use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

use crate::model::Chapter;
use crate::model::MangaCacheEntry;
use crate::model::ScraperData;
use crate::reconcile::ordering;
use crate::reconcile::ordering::OrderingAnomaly;

/// How chapters missing from a scrape are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Chapters missing from the scrape are kept. Provider listings are
    /// often paginated or temporarily incomplete.
    #[default]
    Incremental,
    /// The scrape is authoritative; missing chapters are pruned.
    FullResync,
}

/// Result of merging one snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheMerge {
    pub entry: MangaCacheEntry,
    /// Chapter ids not present in the previous entry, in reading order.
    pub added: Vec<String>,
    /// Chapter ids dropped from the previous entry.
    pub removed: Vec<String>,
    pub created: bool,
    pub meta_changed: bool,
    pub anomalies: Vec<OrderingAnomaly>,
}

/// Merges a successful scrape into the previous cache entry of `slug`.
///
/// Only successful scrapes can be merged; callers match on
/// [`ScraperResponse`](crate::model::ScraperResponse) and leave the cache
/// untouched on failure.
pub fn merge(
    slug: &str,
    previous: Option<&MangaCacheEntry>,
    scraped: &ScraperData,
    mode: MergeMode,
    now: i64,
) -> CacheMerge {
    let mut seen = HashSet::new();
    let mut chapters: Vec<Chapter> = scraped
        .data
        .chapters
        .iter()
        .filter(|c| seen.insert(c.href_string.clone()))
        .cloned()
        .collect();
    let anomalies = ordering::normalize(&mut chapters);

    let mut removed = Vec::new();
    let mut previous_ids = HashSet::new();
    if let Some(prev) = previous {
        let same_provider = prev.provider == scraped.provider;
        for old in &prev.chapters {
            previous_ids.insert(old.href_string.as_str());
            if seen.contains(&old.href_string) {
                continue;
            }
            if same_provider && mode == MergeMode::Incremental {
                chapters.push(old.clone());
            } else {
                removed.push(old.href_string.clone());
            }
        }
    }

    ordering::sort_chapters(&mut chapters);

    let added = chapters
        .iter()
        .filter(|c| !previous_ids.contains(c.href_string.as_str()))
        .map(|c| c.href_string.clone())
        .collect();

    let mut meta = scraped.constant.clone();
    if meta.slug.is_empty() {
        meta.slug = slug.to_string();
    }
    let meta_changed = previous.is_some_and(|prev| prev.meta != meta);

    CacheMerge {
        entry: MangaCacheEntry {
            meta,
            chapters,
            chapter_images: scraped.data.chapter_images.clone(),
            provider: scraped.provider.clone(),
            saved_at: now,
        },
        added,
        removed,
        created: previous.is_none(),
        meta_changed,
        anomalies,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::MangaData;
    use crate::model::MangaMeta;

    fn meta(title: &str) -> MangaMeta {
        MangaMeta {
            slug: "one-piece".to_string(),
            poster_url: "https://example.com/poster.jpg".to_string(),
            title: title.to_string(),
            alternate_titles: vec!["ワンピース".to_string()],
            description_paragraphs: vec!["Pirates.".to_string()],
            genres: vec!["Adventure".to_string()],
        }
    }

    fn scrape(provider: &str, title: &str, chapters: &[f64]) -> ScraperData {
        ScraperData {
            constant: meta(title),
            data: MangaData {
                chapters: chapters
                    .iter()
                    .map(|n| {
                        Chapter::new(0, Some(*n), format!("Chapter {n}"), n.to_string(), Utc::now())
                    })
                    .collect(),
                chapter_images: None,
            },
            provider: provider.to_string(),
        }
    }

    /// First incremental merge of a fresh title.
    fn seed(provider: &str, chapters: &[f64]) -> CacheMerge {
        let data = scrape(provider, "One Piece", chapters);
        merge("one-piece", None, &data, MergeMode::Incremental, 1)
    }

    fn ids(entry: &MangaCacheEntry) -> Vec<&str> {
        entry.chapters.iter().map(|c| c.href_string.as_str()).collect()
    }

    #[test]
    fn test_creates_missing_entry() {
        let data = scrape("mangadex", "One Piece", &[2.0, 1.0]);
        let merged = merge("one-piece", None, &data, MergeMode::Incremental, 10);

        assert!(merged.created);
        assert!(!merged.meta_changed);
        assert_eq!(ids(&merged.entry), vec!["1", "2"]);
        assert_eq!(merged.added, vec!["1", "2"]);
        assert_eq!(merged.entry.saved_at, 10);
        assert!(merged.entry.chapters.iter().all(|c| c.combined.is_some()));
    }

    #[test]
    fn test_incremental_retains_missing_chapters() {
        let first = seed("mangadex", &[1.0, 2.0, 3.0]);
        let second = merge(
            "one-piece",
            Some(&first.entry),
            &scrape("mangadex", "One Piece", &[3.0, 4.0]),
            MergeMode::Incremental,
            2,
        );

        assert_eq!(ids(&second.entry), vec!["1", "2", "3", "4"]);
        assert_eq!(second.added, vec!["4"]);
        assert!(second.removed.is_empty());
        assert!(!second.created);
    }

    #[test]
    fn test_full_resync_prunes_missing_chapters() {
        let first = seed("mangadex", &[1.0, 2.0, 3.0]);
        let second = merge(
            "one-piece",
            Some(&first.entry),
            &scrape("mangadex", "One Piece", &[3.0, 4.0]),
            MergeMode::FullResync,
            2,
        );

        assert_eq!(ids(&second.entry), vec!["3", "4"]);
        assert_eq!(second.removed, vec!["1", "2"]);
    }

    #[test]
    fn test_provider_switch_replaces_chapters() {
        let first = seed("mangasee", &[1.0, 2.0]);
        let second = merge(
            "one-piece",
            Some(&first.entry),
            &scrape("mangadex", "One Piece", &[5.0]),
            MergeMode::Incremental,
            2,
        );

        assert_eq!(ids(&second.entry), vec!["5"]);
        assert_eq!(second.removed, vec!["1", "2"]);
        assert_eq!(second.entry.provider, "mangadex");
    }

    #[test]
    fn test_meta_replaced_when_changed() {
        let first = seed("mangadex", &[1.0]);

        let data = scrape("mangadex", "One Piece", &[1.0]);
        let same = merge("one-piece", Some(&first.entry), &data, MergeMode::Incremental, 2);
        assert!(!same.meta_changed);

        let renamed = merge(
            "one-piece",
            Some(&first.entry),
            &scrape("mangadex", "ONE PIECE", &[1.0]),
            MergeMode::Incremental,
            3,
        );
        assert!(renamed.meta_changed);
        assert_eq!(renamed.entry.meta.title, "ONE PIECE");
    }

    #[test]
    fn test_rescraped_chapter_refreshes_fields() {
        let first = seed("mangadex", &[1.0]);
        let mut data = scrape("mangadex", "One Piece", &[1.0]);
        data.data.chapters[0].label = "Romance Dawn".to_string();

        let second = merge("one-piece", Some(&first.entry), &data, MergeMode::Incremental, 2);
        assert_eq!(second.entry.chapters.len(), 1);
        assert_eq!(second.entry.chapters[0].label, "Romance Dawn");
        assert!(second.added.is_empty());
    }

    #[test]
    fn test_duplicate_ids_in_scrape_are_collapsed() {
        let merged = seed("mangadex", &[1.0, 1.0, 2.0]);
        assert_eq!(ids(&merged.entry), vec!["1", "2"]);
    }

    #[test]
    fn test_anomalies_are_stored_but_reported() {
        let merged = seed("mangadex", &[1.0, -2.0]);
        assert_eq!(merged.anomalies.len(), 1);
        assert_eq!(ids(&merged.entry), vec!["1", "-2"]);
        assert_eq!(merged.entry.chapters[1].combined, None);
    }

    #[test]
    fn test_empty_meta_slug_falls_back_to_key() {
        let mut data = scrape("mangadex", "One Piece", &[1.0]);
        data.constant.slug.clear();
        let merged = merge("one-piece", None, &data, MergeMode::Incremental, 1);
        assert_eq!(merged.entry.meta.slug, "one-piece");
    }
}
