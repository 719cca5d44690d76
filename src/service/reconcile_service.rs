//! Reconciliation and reading-state service.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use log::debug;
use log::info;
use log::warn;

use crate::database::Database;
use crate::model::List;
use crate::model::ListEntry;
use crate::model::Progress;
use crate::model::ProgressObservation;
use crate::model::ScraperResponse;
use crate::reconcile;
use crate::reconcile::ProgressKind;
use crate::reconcile::Reconciliation;
use crate::reconcile::cache::MergeMode;
use crate::reconcile::list::ListView;
use crate::reconcile::list::ListsOverview;
use crate::reconcile::list::OverviewOpt;
use crate::reconcile::view::TitleView;
use crate::service::error::ServiceError;

/// Serializes reconciliations per title and persists their results.
pub struct ReconcileService {
    pub db: Arc<Database>,
    pub mode: MergeMode,
}

impl ReconcileService {
    pub fn new(db: Arc<Database>, mode: MergeMode) -> Self {
        Self { db, mode }
    }

    /// Merges a scraper response into the title `slug`.
    ///
    /// A failed scrape leaves every stored subtree untouched. On success the
    /// title's lock is held for the whole read-merge-write cycle, and the
    /// record is only replaced once the store accepted the new state.
    pub async fn reconcile(
        &self,
        slug: &str,
        response: &ScraperResponse,
    ) -> Result<Reconciliation, ServiceError> {
        if let ScraperResponse::Failure(err) = response {
            warn!(
                "Scrape of `{slug}` failed with status {}: {}. Keeping cached data.",
                err.status, err.err
            );
            return Ok(Reconciliation::ScrapeFailed {
                status: err.status,
                message: err.err.clone(),
            });
        }

        let handle = self.db.title(slug).await;
        let mut record = handle.lock().await;

        let mut working = record.clone();
        let outcome =
            reconcile::reconcile_title(slug, &mut working, response, self.mode, Self::now());

        if let Reconciliation::Updated(update) = &outcome {
            for anomaly in &update.anomalies {
                warn!("Title `{slug}`: {anomaly}");
            }
            if update.created {
                info!("Cached new title `{slug}`.");
            }
            if !update.removed.is_empty() {
                info!("Pruned {} chapters from `{slug}`.", update.removed.len());
            }
            debug!(
                "Reconciled `{slug}`: {} added, {} new.",
                update.added.len(),
                update.new_chapters.len()
            );
        }

        self.db.persist_title(slug, &working).await?;
        *record = working;
        drop(record);

        // The title is committed, so its new chapters must reach the caller
        // even when the list copies cannot be refreshed.
        if let Err(e) = self.refresh_list_entries(slug, response).await {
            warn!("Failed to refresh list entries of `{slug}`: {e}");
        }
        Ok(outcome)
    }

    /// Records a local, possibly optimistic, progress update.
    pub async fn record_progress(
        &self,
        slug: &str,
        chapter_id: &str,
        observation: &ProgressObservation,
    ) -> Result<Progress, ServiceError> {
        self.update_progress(slug, chapter_id, observation, ProgressKind::Local)
            .await
    }

    /// Records progress confirmed by a sync backend.
    pub async fn confirm_progress(
        &self,
        slug: &str,
        chapter_id: &str,
        observation: &ProgressObservation,
    ) -> Result<Progress, ServiceError> {
        self.update_progress(slug, chapter_id, observation, ProgressKind::Confirmed)
            .await
    }

    async fn update_progress(
        &self,
        slug: &str,
        chapter_id: &str,
        observation: &ProgressObservation,
        kind: ProgressKind,
    ) -> Result<Progress, ServiceError> {
        let handle =
            self.db
                .existing_title(slug)
                .await
                .ok_or_else(|| ServiceError::UnknownTitle {
                    slug: slug.to_string(),
                })?;
        let mut record = handle.lock().await;
        if record.cache.is_none() {
            return Err(ServiceError::UnknownTitle {
                slug: slug.to_string(),
            });
        }

        let mut working = record.clone();
        let progress = reconcile::record_progress(&mut working, chapter_id, observation, kind)
            .ok_or_else(|| ServiceError::UnknownChapter {
                slug: slug.to_string(),
                chapter_id: chapter_id.to_string(),
            })?;

        self.db.persist_title(slug, &working).await?;
        *record = working;
        Ok(progress)
    }

    pub async fn title_view(&self, slug: &str) -> Result<TitleView, ServiceError> {
        let unknown = || ServiceError::UnknownTitle {
            slug: slug.to_string(),
        };
        let handle = self.db.existing_title(slug).await.ok_or_else(unknown)?;
        let record = handle.lock().await;
        reconcile::view::title_view(slug, &record).ok_or_else(unknown)
    }

    /// Derived view of every list matching `opt`.
    pub async fn overview(&self, opt: &OverviewOpt) -> Vec<ListView> {
        let lists = self.db.lists().await;
        let titles = self.db.snapshot().await;
        reconcile::list::aggregate(&lists, &titles, opt)
    }

    /// Same as [`Self::overview`], split into user-created and built-in lists.
    pub async fn lists_overview(&self, opt: &OverviewOpt) -> ListsOverview {
        reconcile::list::group_by_creator(self.overview(opt).await)
    }

    pub async fn create_list(
        &self,
        name: &str,
        slug: &str,
        by_creator: bool,
    ) -> Result<List, ServiceError> {
        self.db
            .update_lists(|lists| {
                if lists.iter().any(|l| l.slug == slug) {
                    return Err(ServiceError::DuplicateList {
                        slug: slug.to_string(),
                    });
                }
                let list = List::new(name, slug, by_creator);
                lists.push(list.clone());
                Ok(list)
            })
            .await
    }

    pub async fn set_show_on_home(&self, list_slug: &str, show: bool) -> Result<(), ServiceError> {
        self.db
            .update_lists(|lists| {
                Self::find_list(lists, list_slug)?.show_on_home = show;
                Ok(())
            })
            .await
    }

    pub async fn add_to_list(
        &self,
        list_slug: &str,
        slug: &str,
        provider: Option<&str>,
    ) -> Result<ListEntryResult, ServiceError> {
        self.db
            .update_lists(|lists| {
                let list = Self::find_list(lists, list_slug)?;
                if list.contains(slug, provider) {
                    return Ok(ListEntryResult::AlreadyPresent);
                }
                list.entries
                    .push(ListEntry::new(slug, provider.map(str::to_string)));
                Ok(ListEntryResult::Success)
            })
            .await
    }

    pub async fn remove_from_list(
        &self,
        list_slug: &str,
        slug: &str,
        provider: Option<&str>,
    ) -> Result<ListEntryResult, ServiceError> {
        self.db
            .update_lists(|lists| {
                let list = Self::find_list(lists, list_slug)?;
                let before = list.entries.len();
                list.entries
                    .retain(|e| !(e.slug == slug && e.provider.as_deref() == provider));
                if list.entries.len() == before {
                    Ok(ListEntryResult::AlreadyPresent)
                } else {
                    Ok(ListEntryResult::Success)
                }
            })
            .await
    }

    /// Distinct `(slug, provider)` pairs referenced by any list, in
    /// declaration order.
    pub async fn tracked_titles(&self) -> Vec<TrackedTitle> {
        let mut seen = HashSet::new();
        self.db
            .lists()
            .await
            .into_iter()
            .flat_map(|list| list.entries)
            .map(|entry| TrackedTitle {
                slug: entry.slug,
                provider: entry.provider,
            })
            .filter(|tracked| seen.insert(tracked.clone()))
            .collect()
    }

    /// Stores a successful response on every list entry of `slug` whose
    /// provider matches.
    async fn refresh_list_entries(
        &self,
        slug: &str,
        response: &ScraperResponse,
    ) -> Result<(), ServiceError> {
        let Some(data) = response.as_data() else {
            return Ok(());
        };
        self.db
            .update_lists(|lists| {
                lists
                    .iter_mut()
                    .flat_map(|list| list.entries.iter_mut())
                    .filter(|e| e.slug == slug)
                    .filter(|e| e.provider.as_deref().is_none_or(|p| p == data.provider))
                    .for_each(|e| e.data = Some(response.clone()));
                Ok::<_, ServiceError>(())
            })
            .await
    }

    fn find_list<'a>(lists: &'a mut [List], slug: &str) -> Result<&'a mut List, ServiceError> {
        lists
            .iter_mut()
            .find(|l| l.slug == slug)
            .ok_or_else(|| ServiceError::UnknownList {
                slug: slug.to_string(),
            })
    }

    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }
}

// Return types
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListEntryResult {
    /// The list was changed
    Success,
    /// Nothing to do: the entry was already present (add) or absent (remove)
    AlreadyPresent,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TrackedTitle {
    pub slug: String,
    pub provider: Option<String>,
}
