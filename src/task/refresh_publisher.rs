//! Background task that re-scrapes tracked titles.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use log::debug;
use log::error;
use log::info;
use tokio::time::Sleep;
use tokio::time::sleep;

use crate::event::NewChaptersEvent;
use crate::event::event_bus::EventBus;
use crate::model::ScraperResponse;
use crate::provider::providers::Providers;
use crate::reconcile::Reconciliation;
use crate::service::reconcile_service::ReconcileService;
use crate::service::reconcile_service::TrackedTitle;

/// Task that periodically refreshes every title referenced by a list.
pub struct RefreshPublisher {
    service: Arc<ReconcileService>,
    providers: Arc<Providers>,
    event_bus: Arc<EventBus>,
    poll_interval: Duration,
    running: AtomicBool,
}

impl RefreshPublisher {
    pub fn new(
        service: Arc<ReconcileService>,
        providers: Arc<Providers>,
        event_bus: Arc<EventBus>,
        poll_interval: Duration,
    ) -> Arc<Self> {
        info!(
            "Initializing RefreshPublisher with poll interval {:?}",
            poll_interval
        );
        Arc::new(Self {
            service,
            providers,
            event_bus,
            poll_interval,
            running: AtomicBool::new(false),
        })
    }

    /// Starts the refresh loop.
    pub fn start(self: Arc<Self>) -> anyhow::Result<()> {
        if !self.running.swap(true, Ordering::SeqCst) {
            info!("Starting RefreshPublisher check loop.");
            self.spawn_check_loop();
        }
        Ok(())
    }

    /// Stops the refresh loop after the current tick.
    pub fn stop(self: Arc<Self>) -> anyhow::Result<()> {
        info!("Stopping RefreshPublisher check loop.");
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn spawn_check_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        tokio::spawn(async move {
            loop {
                interval.tick().await;
                if !self.running.load(Ordering::SeqCst) {
                    info!("Stopping check loop.");
                    break;
                }
                if let Err(e) = self.refresh_all().await {
                    error!("Error refreshing titles: {}", e);
                }
            }
        });
    }

    /// Refreshes every tracked title once, spreading the requests over the
    /// poll interval.
    pub async fn refresh_all(&self) -> anyhow::Result<()> {
        debug!("Refreshing tracked titles.");

        let titles = self.service.tracked_titles().await;
        let titles_len = titles.len();
        info!("Found {} titles to refresh.", titles_len);

        for (i, tracked) in titles.into_iter().enumerate() {
            if let Err(e) = self.refresh_title(&tracked).await {
                error!("Error refreshing {}: {e:?}", Self::describe(&tracked));
            }
            if i + 1 < titles_len {
                Self::refresh_wait(titles_len, &self.poll_interval).await;
            }
        }

        debug!("Finished refreshing tracked titles.");
        Ok(())
    }

    /// Scrapes and reconciles one title, publishing its new chapters.
    pub async fn refresh_title(&self, tracked: &TrackedTitle) -> anyhow::Result<Reconciliation> {
        let response = self
            .providers
            .fetch(&tracked.slug, tracked.provider.as_deref())
            .await?;
        let outcome = self.service.reconcile(&tracked.slug, &response).await?;

        match (&outcome, &response) {
            (Reconciliation::Updated(update), ScraperResponse::Success(data))
                if !update.new_chapters.is_empty() =>
            {
                info!(
                    "Publishing {} new chapters for {}.",
                    update.new_chapters.len(),
                    Self::describe(tracked)
                );
                self.event_bus.publish(NewChaptersEvent::new(
                    tracked.slug.clone(),
                    data.provider.clone(),
                    data.constant.title.clone(),
                    update.new_chapters.clone(),
                ));
            }
            (Reconciliation::ScrapeFailed { status, .. }, _) => {
                debug!(
                    "Skipped {} after failed scrape ({status}).",
                    Self::describe(tracked)
                );
            }
            _ => debug!("No new chapters for {}.", Self::describe(tracked)),
        }
        Ok(outcome)
    }

    fn describe(tracked: &TrackedTitle) -> String {
        match &tracked.provider {
            Some(provider) => format!("title `{}` ({provider})", tracked.slug),
            None => format!("title `{}`", tracked.slug),
        }
    }

    fn refresh_wait(titles_length: usize, poll_interval: &Duration) -> Sleep {
        sleep(Self::calculate_refresh_interval(titles_length, poll_interval))
    }

    fn calculate_refresh_interval(titles_length: usize, poll_interval: &Duration) -> Duration {
        let titles_count = titles_length.max(1) as u64;
        Duration::from_millis(poll_interval.as_millis() as u64 / titles_count)
    }
}
