//! Per-list derived views.

use std::cmp::Reverse;
use std::collections::HashMap;

use derive_builder::Builder;
use serde::Serialize;

use crate::model::List;
use crate::model::ListEntry;
use crate::model::Progress;
use crate::model::ScraperResponse;
use crate::model::TitleRecord;
use crate::reconcile::progress;

/// Filters applied by [`aggregate`].
#[derive(Builder, Clone, Debug, Default)]
#[builder(pattern = "immutable")]
pub struct OverviewOpt {
    /// Only lists flagged `show_on_home`.
    #[builder(default)]
    pub home_only: bool,
    /// Only user-created (`Some(true)`) or built-in (`Some(false)`) lists.
    #[builder(default)]
    pub by_creator: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    pub slug: String,
    pub provider: Option<String>,
    pub title: Option<String>,
    pub poster_url: Option<String>,
    /// Label of the chapter read most recently.
    pub current_label: Option<String>,
    /// Effective progress of that chapter, derived fields filled in.
    pub current: Option<Progress>,
    pub new_count: usize,
    /// Whether the view comes from the manga cache rather than the entry's
    /// own copy of the last scraper response.
    pub cached: bool,
}

impl EntryView {
    pub fn has_new(&self) -> bool {
        self.new_count > 0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    pub name: String,
    pub slug: String,
    pub show_on_home: bool,
    pub by_creator: bool,
    pub last: Option<i64>,
    pub entries: Vec<EntryView>,
}

/// Lists split by who created them.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListsOverview {
    pub created: Vec<ListView>,
    pub builtin: Vec<ListView>,
}

/// Builds the view of every list matching `opt`.
///
/// Lists are ordered by `last`, most recent first. Lists without any
/// progress come after the others. Ties keep declaration order.
pub fn aggregate(
    lists: &[List],
    titles: &HashMap<String, TitleRecord>,
    opt: &OverviewOpt,
) -> Vec<ListView> {
    let mut views: Vec<ListView> = lists
        .iter()
        .filter(|list| !opt.home_only || list.show_on_home)
        .filter(|list| opt.by_creator.is_none_or(|wanted| list.by_creator == wanted))
        .map(|list| list_view(list, titles))
        .collect();
    views.sort_by_key(|view| Reverse(view.last));
    views
}

pub fn group_by_creator(views: Vec<ListView>) -> ListsOverview {
    let (created, builtin): (Vec<ListView>, Vec<ListView>) =
        views.into_iter().partition(|view| view.by_creator);
    ListsOverview { created, builtin }
}

/// Most recent effective progress timestamp of a list.
pub fn last_read(list: &List, titles: &HashMap<String, TitleRecord>) -> Option<i64> {
    list.entries
        .iter()
        .filter_map(|entry| entry_record(entry, titles))
        .filter_map(TitleRecord::last_read_at)
        .max()
}

fn list_view(list: &List, titles: &HashMap<String, TitleRecord>) -> ListView {
    let entries: Vec<EntryView> = list
        .entries
        .iter()
        .map(|entry| entry_view(entry, titles))
        .collect();
    ListView {
        name: list.name.clone(),
        slug: list.slug.clone(),
        show_on_home: list.show_on_home,
        by_creator: list.by_creator,
        last: last_read(list, titles),
        entries,
    }
}

/// The title record an entry refers to, if its provider matches the cache.
fn entry_record<'a>(
    entry: &ListEntry,
    titles: &'a HashMap<String, TitleRecord>,
) -> Option<&'a TitleRecord> {
    let record = titles.get(&entry.slug)?;
    let cache = record.cache.as_ref()?;
    match &entry.provider {
        Some(provider) if *provider != cache.provider => None,
        _ => Some(record),
    }
}

fn entry_view(entry: &ListEntry, titles: &HashMap<String, TitleRecord>) -> EntryView {
    if let Some(record) = entry_record(entry, titles)
        && let Some(cache) = record.cache.as_ref()
    {
        let current = record.current();
        return EntryView {
            slug: entry.slug.clone(),
            provider: Some(cache.provider.clone()),
            title: Some(cache.meta.title.clone()),
            poster_url: Some(cache.meta.poster_url.clone()),
            current_label: current.map(|(c, _)| c.label.clone()),
            current: current.map(|(_, p)| progress::with_derived(p.clone())),
            new_count: cache.chapters.iter().filter(|c| record.is_new(c)).count(),
            cached: true,
        };
    }

    let stored = match &entry.data {
        Some(ScraperResponse::Success(data)) => Some(data),
        _ => None,
    };
    EntryView {
        slug: entry.slug.clone(),
        provider: entry
            .provider
            .clone()
            .or_else(|| stored.map(|d| d.provider.clone())),
        title: stored.map(|d| d.constant.title.clone()),
        poster_url: stored.map(|d| d.constant.poster_url.clone()),
        current_label: None,
        current: None,
        new_count: 0,
        cached: false,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::Chapter;
    use crate::model::MangaData;
    use crate::model::MangaMeta;
    use crate::model::ProgressObservation;
    use crate::model::ScraperData;
    use crate::reconcile::ProgressKind;
    use crate::reconcile::cache::MergeMode;
    use crate::reconcile::reconcile_title;
    use crate::reconcile::record_progress;

    fn scraped(slug: &str, numbers: &[f64]) -> ScraperResponse {
        ScraperResponse::Success(ScraperData {
            constant: MangaMeta {
                slug: slug.to_string(),
                title: slug.to_uppercase(),
                ..Default::default()
            },
            data: MangaData {
                chapters: numbers
                    .iter()
                    .map(|n| {
                        Chapter::new(0, Some(*n), format!("Chapter {n}"), n.to_string(), Utc::now())
                    })
                    .collect(),
                chapter_images: None,
            },
            provider: "mangadex".to_string(),
        })
    }

    fn title(slug: &str, read_at: Option<i64>) -> TitleRecord {
        let mut record = TitleRecord::default();
        reconcile_title(slug, &mut record, &scraped(slug, &[1.0, 2.0]), MergeMode::Incremental, 0);
        if let Some(at) = read_at {
            record_progress(
                &mut record,
                "1",
                &ProgressObservation::new(5, 10, at),
                ProgressKind::Local,
            );
        }
        record
    }

    fn list(name: &str, by_creator: bool, show_on_home: bool, slugs: &[&str]) -> List {
        let mut list = List::new(name, name.to_lowercase(), by_creator);
        list.show_on_home = show_on_home;
        list.entries = slugs
            .iter()
            .map(|s| ListEntry::new(*s, None))
            .collect();
        list
    }

    fn titles() -> HashMap<String, TitleRecord> {
        HashMap::from([
            ("a".to_string(), title("a", Some(100))),
            ("b".to_string(), title("b", Some(300))),
            ("c".to_string(), title("c", None)),
        ])
    }

    #[test]
    fn test_last_is_max_effective_timestamp() {
        let lists = vec![list("Reading", false, true, &["a", "b", "c"])];
        let views = aggregate(&lists, &titles(), &OverviewOpt::default());

        assert_eq!(views[0].last, Some(300));
        assert_eq!(last_read(&lists[0], &titles()), Some(300));
        assert_eq!(views[0].entries[0].current.as_ref().unwrap().percentage, Some(50));
        assert_eq!(views[0].entries[0].current_label.as_deref(), Some("Chapter 1"));
        assert!(views[0].entries[2].current.is_none());
    }

    #[test]
    fn test_last_counts_progress_on_unordered_chapters() {
        let mut record = TitleRecord::default();
        let response = scraped("d", &[1.0, -1.0]);
        reconcile_title("d", &mut record, &response, MergeMode::Incremental, 0);
        record_progress(
            &mut record,
            "-1",
            &ProgressObservation::new(2, 4, 900),
            ProgressKind::Local,
        )
        .unwrap();
        let titles = HashMap::from([("d".to_string(), record)]);

        let extras = list("Extras", false, true, &["d"]);
        let views = aggregate(&[extras], &titles, &OverviewOpt::default());
        assert_eq!(views[0].last, Some(900));
        assert!(views[0].entries[0].current.is_none());
    }

    #[test]
    fn test_lists_ordered_by_last_with_stable_ties() {
        let lists = vec![
            list("Empty", true, true, &["c"]),
            list("First", true, true, &["a"]),
            list("Second", true, true, &["a"]),
            list("Latest", true, true, &["b"]),
        ];
        let views = aggregate(&lists, &titles(), &OverviewOpt::default());

        let names: Vec<&str> = views.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Latest", "First", "Second", "Empty"]);
    }

    #[test]
    fn test_home_and_creator_filters() {
        let lists = vec![
            list("Reading", false, true, &["a"]),
            list("Hidden", true, false, &["b"]),
            list("Mine", true, true, &["c"]),
        ];
        let home = OverviewOptBuilder::default().home_only(true).build().unwrap();
        let names: Vec<String> = aggregate(&lists, &titles(), &home)
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["Reading", "Mine"]);

        let mine = OverviewOptBuilder::default().by_creator(Some(true)).build().unwrap();
        assert_eq!(aggregate(&lists, &titles(), &mine).len(), 2);

        let views = aggregate(&lists, &titles(), &OverviewOpt::default());
        let groups = group_by_creator(views);
        assert_eq!(groups.created.len(), 2);
        assert_eq!(groups.builtin.len(), 1);
        assert_eq!(groups.builtin[0].name, "Reading");
    }

    #[test]
    fn test_uncached_entry_falls_back_to_stored_response() {
        let mut reading = list("Reading", false, true, &[]);
        let mut entry = ListEntry::new("z", Some("mangadex".to_string()));
        entry.data = Some(scraped("z", &[1.0]));
        reading.entries.push(entry);

        let views = aggregate(&[reading], &titles(), &OverviewOpt::default());
        let view = &views[0].entries[0];
        assert!(!view.cached);
        assert_eq!(view.title.as_deref(), Some("Z"));
        assert_eq!(views[0].last, None);
    }

    #[test]
    fn test_provider_mismatch_is_not_joined() {
        let mut reading = list("Reading", false, true, &[]);
        reading
            .entries
            .push(ListEntry::new("a", Some("mangasee".to_string())));

        let views = aggregate(&[reading], &titles(), &OverviewOpt::default());
        assert!(!views[0].entries[0].cached);
        assert_eq!(views[0].last, None);
    }

    #[test]
    fn test_new_count_reflects_flagged_chapters() {
        let mut record = title("a", None);
        let response = scraped("a", &[1.0, 2.0, 3.0]);
        reconcile_title("a", &mut record, &response, MergeMode::Incremental, 1);
        let titles = HashMap::from([("a".to_string(), record)]);

        let reading = list("Reading", false, true, &["a"]);
        let views = aggregate(&[reading], &titles, &OverviewOpt::default());
        assert_eq!(views[0].entries[0].new_count, 1);
        assert!(views[0].entries[0].has_new());
    }
}
