//! Services orchestrating the reconciliation engine and persistence.

use std::sync::Arc;

use crate::database::Database;
use crate::reconcile::cache::MergeMode;
use crate::service::reconcile_service::ReconcileService;

pub mod error;
pub mod reconcile_service;

pub struct Services {
    pub reconcile: Arc<ReconcileService>,
}

impl Services {
    pub fn new(db: Arc<Database>, mode: MergeMode) -> Self {
        Self {
            reconcile: Arc::new(ReconcileService::new(db, mode)),
        }
    }
}
