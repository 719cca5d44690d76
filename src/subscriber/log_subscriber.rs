use anyhow::Result;
use async_trait::async_trait;
use log::info;

use crate::event::NewChaptersEvent;
use crate::subscriber::Subscriber;

/// Reports newly surfaced chapters through the application log.
pub struct LogSubscriber;

impl LogSubscriber {
    pub fn new() -> Self {
        Self
    }

    fn describe(event: &NewChaptersEvent) -> String {
        let name = if event.title.is_empty() {
            event.slug.as_str()
        } else {
            event.title.as_str()
        };
        format!(
            "{} new chapter(s) for {} on {}: {}",
            event.chapters.len(),
            name,
            event.provider,
            event.chapters.join(", ")
        )
    }
}

#[async_trait]
impl Subscriber<NewChaptersEvent> for LogSubscriber {
    async fn callback(&self, event: NewChaptersEvent) -> Result<()> {
        info!("{}", Self::describe(&event));
        Ok(())
    }
}
