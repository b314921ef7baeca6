use crate::core::rates::RateSnapshot;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Holds the most recent successfully fetched snapshot, if any.
///
/// Readers get a shared handle to the whole snapshot; writers swap in a new one. The
/// lock only guards the pointer, so it is held for a clone or an assignment and never
/// across an await point.
#[derive(Clone, Default)]
pub struct RateCache {
    inner: Arc<RwLock<Option<Arc<RateSnapshot>>>>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> Option<Arc<RateSnapshot>> {
        // A poisoned lock still holds a whole value: assignment is the only write.
        let slot = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let value = slot.as_ref().map(Arc::clone);
        if value.is_some() {
            debug!("Cache HIT");
        } else {
            debug!("Cache MISS");
        }
        value
    }

    pub fn replace(&self, snapshot: RateSnapshot) {
        let snapshot = Arc::new(snapshot);
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        debug!(base = %snapshot.base(), fetched_at = %snapshot.fetched_at(), "Cache REPLACE");
        *slot = Some(snapshot);
    }
}
