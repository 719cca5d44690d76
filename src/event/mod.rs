//! Events published after reconciliation.

pub mod event_bus;

/// Marker trait for events that can be dispatched through the event bus.
pub trait Event: std::any::Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;

    /// Get the name of the event type.
    fn event_name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Fired when a refresh surfaced chapters the reader has not seen yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewChaptersEvent {
    pub slug: String,
    pub provider: String,
    pub title: String,
    /// Chapter ids, in reading order.
    pub chapters: Vec<String>,
}

impl NewChaptersEvent {
    pub fn new(
        slug: impl Into<String>,
        provider: impl Into<String>,
        title: impl Into<String>,
        chapters: Vec<String>,
    ) -> Self {
        Self {
            slug: slug.into(),
            provider: provider.into(),
            title: title.into(),
            chapters,
        }
    }
}

impl Event for NewChaptersEvent {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
