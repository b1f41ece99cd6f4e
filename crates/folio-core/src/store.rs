// ── Confirmed collection ──
//
// Server-truth sequence for one resource kind, owned by the dashboard and
// shared with its controller. Every mutation publishes a fresh `Arc`
// snapshot through a `watch` channel so followers see a new reference.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::Resource;
use folio_api::ResourceId;

/// Cloneable handle to a shared, watch-backed record list.
pub struct ConfirmedCollection<R: Resource> {
    snapshot: Arc<watch::Sender<Arc<Vec<R>>>>,
}

impl<R: Resource> Clone for ConfirmedCollection<R> {
    fn clone(&self) -> Self {
        Self {
            snapshot: Arc::clone(&self.snapshot),
        }
    }
}

impl<R: Resource> Default for ConfirmedCollection<R> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<R: Resource> ConfirmedCollection<R> {
    pub fn new(records: Vec<R>) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(records));
        Self {
            snapshot: Arc::new(snapshot),
        }
    }

    /// Current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<R>> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<R>>> {
        self.snapshot.subscribe()
    }

    pub fn get(&self, id: ResourceId) -> Option<R> {
        self.snapshot.borrow().iter().find(|r| r.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.borrow().is_empty()
    }

    /// Replace the whole list, e.g. after a fresh load.
    pub fn replace(&self, records: Vec<R>) {
        self.snapshot.send_replace(Arc::new(records));
    }

    /// Insert `record`, or replace the entry with the same id in place.
    pub fn upsert(&self, record: R) {
        self.modify(|records| match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => *slot = record,
            None => records.push(record),
        });
    }

    /// Remove by id, returning the removed record.
    pub fn remove(&self, id: ResourceId) -> Option<R> {
        let mut removed = None;
        self.modify(|records| {
            if let Some(idx) = records.iter().position(|r| r.id() == id) {
                removed = Some(records.remove(idx));
            }
        });
        removed
    }

    fn modify(&self, f: impl FnOnce(&mut Vec<R>)) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| {
            let mut records = Vec::clone(snap);
            f(&mut records);
            *snap = Arc::new(records);
        });
    }
}
