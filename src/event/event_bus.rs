use std::any::Any;
use std::any::TypeId;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::RwLock;

use anyhow::Result;
use log::error;
use log::warn;

use crate::subscriber::Subscriber;

type AsyncSubscriber<E> =
    Box<dyn Fn(E) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send + Sync>;
type Subscribers = Arc<RwLock<HashMap<TypeId, Vec<Box<dyn Any + Send + Sync>>>>>;

/// Type keyed fan-out of events to async subscribers.
///
/// Callbacks run on the ambient tokio runtime, so [`EventBus::publish`] must
/// be called from within one.
pub struct EventBus {
    subscribers: Subscribers,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn register_callback<E, F, Fut>(&self, callback: F) -> &Self
    where
        E: 'static + Send + Sync,
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let type_id = TypeId::of::<E>();

        let wrapped_sub: AsyncSubscriber<E> = Box::new(move |event| Box::pin(callback(event)));

        match self.subscribers.write() {
            Ok(mut subs) => subs.entry(type_id).or_default().push(Box::new(wrapped_sub)),
            Err(e) => error!("Event bus lock poisoned, dropping subscriber: {e}"),
        }
        self
    }

    pub fn register_subcriber<E, S>(&self, subscriber: Arc<S>) -> &Self
    where
        E: 'static + Send + Sync + Clone,
        S: Subscriber<E> + Send + Sync + 'static,
    {
        self.register_callback(move |event: E| {
            let h = subscriber.clone();
            async move { h.callback(event).await }
        })
    }

    pub fn publish<E>(&self, event: E)
    where
        E: 'static + Send + Sync + Clone,
    {
        let type_id = TypeId::of::<E>();
        let Ok(subs) = self.subscribers.read() else {
            error!("Event bus lock poisoned, dropping event.");
            return;
        };

        if let Some(subs_list) = subs.get(&type_id) {
            let mut futures = Vec::new();
            for subs_box in subs_list {
                if let Some(sub) = subs_box.downcast_ref::<AsyncSubscriber<E>>() {
                    futures.push(sub(event.clone()));
                }
            }
            tokio::spawn(async move {
                for result in futures::future::join_all(futures).await {
                    if let Err(e) = result {
                        warn!("Subscriber failed: {e:#}");
                    }
                }
            });
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
