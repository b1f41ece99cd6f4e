// ── Optimistic collection controller ──
//
// Owns the local mirror of one resource kind. Every mutation is applied to
// the mirror synchronously, issued to the backend on a spawned task, then
// settled: confirmed into the shared confirmed collection, or rolled back.
// Per-id sequence numbers make the last issued operation win.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{Resource, ResourceBackend};
use crate::notice::ErrorBanner;
use crate::store::ConfirmedCollection;
use crate::stream::MirrorStream;
use folio_api::ResourceId;

// ── Mirror types ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    Synced,
    /// Optimistic insert awaiting the server.
    Creating,
    /// Optimistic edit awaiting the server.
    Updating,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MirrorEntry<R> {
    pub record: R,
    pub state: EntryState,
    /// The id is client-generated and not yet known to the server.
    pub temporary: bool,
}

impl<R: Resource> MirrorEntry<R> {
    fn synced(record: R) -> Self {
        Self {
            record,
            state: EntryState::Synced,
            temporary: false,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.record.id()
    }

    pub fn is_pending(&self) -> bool {
        self.state != EntryState::Synced
    }
}

/// Display-only key that changes whenever an entry should re-render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderKey {
    pub id: ResourceId,
    pub updated_at: DateTime<Utc>,
    pub generation: u64,
}

impl fmt::Display for RenderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.id,
            self.updated_at.timestamp_millis(),
            self.generation
        )
    }
}

/// Immutable view of the mirror published after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorSnapshot<R> {
    pub entries: Vec<MirrorEntry<R>>,
    /// Bumped on every published change.
    pub generation: u64,
}

impl<R: Resource> MirrorSnapshot<R> {
    pub fn get(&self, id: ResourceId) -> Option<&MirrorEntry<R>> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn records(&self) -> impl Iterator<Item = &R> {
        self.entries.iter().map(|e| &e.record)
    }

    pub fn ids(&self) -> Vec<ResourceId> {
        self.entries.iter().map(MirrorEntry::id).collect()
    }

    pub fn render_key(&self, entry: &MirrorEntry<R>) -> RenderKey {
        RenderKey {
            id: entry.id(),
            updated_at: entry.record.updated_at(),
            generation: self.generation,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Outcomes ─────────────────────────────────────────────────────

/// How an issued mutation settled.
#[derive(Debug)]
pub enum MutationOutcome<R> {
    /// The server accepted it. Carries the server record (the removed
    /// record for deletes).
    Confirmed(R),
    /// The server or network rejected it and the mirror was restored.
    RolledBack(CoreError),
    /// Superseded by a later operation on the same id, or arrived after
    /// unmount. The mirror was left alone.
    Discarded,
}

impl<R> MutationOutcome<R> {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    pub fn is_rolled_back(&self) -> bool {
        matches!(self, Self::RolledBack(_))
    }

    pub fn error(&self) -> Option<&CoreError> {
        match self {
            Self::RolledBack(err) => Some(err),
            _ => None,
        }
    }
}

/// Handle to a mutation whose optimistic effect is already visible.
#[derive(Debug)]
pub struct PendingMutation<R> {
    id: ResourceId,
    handle: JoinHandle<MutationOutcome<R>>,
}

impl<R> PendingMutation<R> {
    /// Target id; temporary for creates.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for settlement.
    pub async fn outcome(self) -> MutationOutcome<R> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(id = self.id, error = %e, "mutation task did not complete");
                MutationOutcome::Discarded
            }
        }
    }
}

// ── Internal state ───────────────────────────────────────────────

enum PendingKind<R> {
    Create(R),
    Update(R),
    Delete,
}

struct PendingOp<R> {
    seq: u64,
    kind: PendingKind<R>,
}

/// How a settling operation stood among those in flight for its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Settled {
    /// Topmost operation for the id: no later one is still in flight.
    latest: bool,
    /// Operations on the id still in flight afterwards.
    remaining: usize,
}

struct MirrorState<R: Resource> {
    entries: Vec<MirrorEntry<R>>,
    /// In-flight operations per id, oldest first.
    pending: HashMap<ResourceId, Vec<PendingOp<R>>>,
    next_seq: u64,
    generation: u64,
    draft: R::Draft,
    editing: Option<R>,
}

impl<R: Resource> MirrorState<R> {
    fn position(&self, id: ResourceId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    /// Index of an entry that may be edited or deleted.
    fn editable(&self, id: ResourceId) -> Result<usize, CoreError> {
        let idx = self.position(id).ok_or(CoreError::NotFound { kind: R::KIND, id })?;
        if self.entries.get(idx).is_some_and(|e| e.temporary) {
            return Err(CoreError::Pending { kind: R::KIND, id });
        }
        Ok(idx)
    }

    fn issue(&mut self, id: ResourceId, kind: PendingKind<R>) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.pending.entry(id).or_default().push(PendingOp { seq, kind });
        seq
    }

    /// Retire `seq` for `id`.
    fn settle(&mut self, id: ResourceId, seq: u64) -> Settled {
        let Some(ops) = self.pending.get_mut(&id) else {
            return Settled {
                latest: false,
                remaining: 0,
            };
        };
        let latest = ops.last().is_some_and(|op| op.seq == seq);
        ops.retain(|op| op.seq != seq);
        let remaining = ops.len();
        if remaining == 0 {
            self.pending.remove(&id);
        }
        Settled { latest, remaining }
    }

    /// Drop every operation still in flight for `id`; their results will
    /// be discarded.
    fn supersede(&mut self, id: ResourceId) {
        self.pending.remove(&id);
    }

    fn latest_op(&self, id: ResourceId) -> Option<&PendingOp<R>> {
        self.pending.get(&id).and_then(|ops| ops.last())
    }

    /// Current time in milliseconds, bumped past every known id.
    fn temporary_id(&self, now: DateTime<Utc>, confirmed: &[R]) -> ResourceId {
        let mut candidate = now.timestamp_millis();
        while self.position(candidate).is_some()
            || self.pending.contains_key(&candidate)
            || confirmed.iter().any(|r| r.id() == candidate)
        {
            candidate += 1;
        }
        candidate
    }

    /// Mirror derived from `confirmed`, keeping optimistic values for ids
    /// with an operation in flight.
    fn rebuild(&self, confirmed: &[R]) -> Vec<MirrorEntry<R>> {
        let mut entries: Vec<MirrorEntry<R>> = confirmed
            .iter()
            .filter_map(|record| match self.latest_op(record.id()).map(|op| &op.kind) {
                Some(PendingKind::Delete) => None,
                Some(PendingKind::Update(optimistic)) => Some(MirrorEntry {
                    record: optimistic.clone(),
                    state: EntryState::Updating,
                    temporary: false,
                }),
                Some(PendingKind::Create(_)) | None => Some(MirrorEntry::synced(record.clone())),
            })
            .collect();

        let mut creates: Vec<(u64, &R)> = self
            .pending
            .values()
            .flatten()
            .filter_map(|op| match &op.kind {
                PendingKind::Create(record) => Some((op.seq, record)),
                _ => None,
            })
            .collect();
        creates.sort_by_key(|(seq, _)| *seq);
        entries.extend(creates.into_iter().map(|(_, record)| MirrorEntry {
            record: record.clone(),
            state: EntryState::Creating,
            temporary: true,
        }));
        entries
    }

    fn clear_editing_of(&mut self, id: ResourceId) {
        if self.editing.as_ref().is_some_and(|r| r.id() == id) {
            self.editing = None;
        }
    }
}

struct Inner<R: Resource> {
    state: Mutex<MirrorState<R>>,
    mirror: watch::Sender<Arc<MirrorSnapshot<R>>>,
    confirmed: ConfirmedCollection<R>,
    banner: ErrorBanner,
    cancel: CancellationToken,
}

impl<R: Resource> Inner<R> {
    fn lock(&self) -> MutexGuard<'_, MirrorState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish `state.entries` if they differ from the last snapshot.
    fn commit(&self, state: &mut MirrorState<R>) {
        if self.mirror.borrow().entries == state.entries {
            return;
        }
        state.generation += 1;
        self.mirror.send_replace(Arc::new(MirrorSnapshot {
            entries: state.entries.clone(),
            generation: state.generation,
        }));
    }

    /// The confirmed snapshot is read under the state lock so a concurrent
    /// settle cannot interleave between read and rebuild.
    fn resync_locked(&self, state: &mut MirrorState<R>) {
        let confirmed = self.confirmed.snapshot();
        state.entries = state.rebuild(&confirmed);
        self.commit(state);
    }

    fn resync(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        let mut state = self.lock();
        self.resync_locked(&mut state);
    }

    fn fail(&self, verb: &str, id: ResourceId, err: &CoreError) {
        warn!(
            kind = %R::KIND,
            id,
            status = ?err.status(),
            error = %err,
            "{verb} failed, rolled back"
        );
        self.banner
            .set(format!("Failed to {verb} {}. Please try again.", R::KIND));
    }

    // ── Settlement ───────────────────────────────────────────────

    fn settle_create(
        &self,
        temp_id: ResourceId,
        seq: u64,
        submitted: &R::Draft,
        result: Result<R, folio_api::Error>,
    ) -> MutationOutcome<R> {
        if self.cancel.is_cancelled() {
            debug!(kind = %R::KIND, temp_id, "create settled after unmount, discarded");
            return MutationOutcome::Discarded;
        }

        match result {
            Ok(record) => {
                self.confirmed.upsert(record.clone());
                let mut state = self.lock();
                state.settle(temp_id, seq);
                state.entries.retain(|e| !(e.temporary && e.id() == temp_id));
                // A draft edited while the create was in flight is kept.
                if state.draft == *submitted {
                    state.draft = R::Draft::default();
                }
                self.resync_locked(&mut state);
                info!(kind = %R::KIND, temp_id, id = record.id(), "created");
                MutationOutcome::Confirmed(record)
            }
            Err(err) => {
                let err = CoreError::from(err);
                {
                    let mut state = self.lock();
                    state.settle(temp_id, seq);
                    state.entries.retain(|e| !(e.temporary && e.id() == temp_id));
                    self.commit(&mut state);
                }
                self.fail("add", temp_id, &err);
                MutationOutcome::RolledBack(err)
            }
        }
    }

    /// Server value to fall back to once every operation on `id` failed.
    fn restore_value(&self, id: ResourceId, remembered: R) -> R {
        self.confirmed.get(id).unwrap_or(remembered)
    }

    fn settle_update(
        &self,
        id: ResourceId,
        seq: u64,
        prior: R,
        result: Result<R, folio_api::Error>,
    ) -> MutationOutcome<R> {
        if self.cancel.is_cancelled() {
            debug!(kind = %R::KIND, id, "update settled after unmount, discarded");
            return MutationOutcome::Discarded;
        }

        match result {
            Ok(record) => {
                // A delete confirmed in the meantime must not be undone.
                if self.confirmed.get(id).is_some() {
                    self.confirmed.upsert(record.clone());
                }
                let mut state = self.lock();
                let settled = state.settle(id, seq);
                if settled.latest {
                    state.supersede(id);
                    state.clear_editing_of(id);
                }
                self.resync_locked(&mut state);
                if settled.latest {
                    info!(kind = %R::KIND, id, "updated");
                    MutationOutcome::Confirmed(record)
                } else {
                    debug!(kind = %R::KIND, id, seq, "update superseded");
                    MutationOutcome::Discarded
                }
            }
            Err(err) => {
                let err = CoreError::from(err);
                let settled = {
                    let mut state = self.lock();
                    let settled = state.settle(id, seq);
                    if settled.latest {
                        if settled.remaining > 0 {
                            // Older operations still in flight keep the entry pending.
                            self.resync_locked(&mut state);
                        } else {
                            let restored = self.restore_value(id, prior);
                            if let Some(idx) = state.position(id) {
                                state.entries[idx] = MirrorEntry::synced(restored);
                            }
                            self.commit(&mut state);
                        }
                    }
                    settled
                };
                if settled.latest {
                    self.fail("update", id, &err);
                    MutationOutcome::RolledBack(err)
                } else {
                    debug!(kind = %R::KIND, id, seq, error = %err, "superseded update failed");
                    MutationOutcome::Discarded
                }
            }
        }
    }

    fn settle_delete(
        &self,
        id: ResourceId,
        seq: u64,
        removed: R,
        result: Result<(), folio_api::Error>,
    ) -> MutationOutcome<R> {
        if self.cancel.is_cancelled() {
            debug!(kind = %R::KIND, id, "delete settled after unmount, discarded");
            return MutationOutcome::Discarded;
        }

        match result {
            Ok(()) => {
                self.confirmed.remove(id);
                let mut state = self.lock();
                let settled = state.settle(id, seq);
                state.supersede(id);
                state.clear_editing_of(id);
                self.resync_locked(&mut state);
                info!(kind = %R::KIND, id, "deleted");
                if settled.latest {
                    MutationOutcome::Confirmed(removed)
                } else {
                    MutationOutcome::Discarded
                }
            }
            Err(err) => {
                let err = CoreError::from(err);
                let settled = {
                    let mut state = self.lock();
                    let settled = state.settle(id, seq);
                    if settled.latest {
                        if settled.remaining > 0 {
                            self.resync_locked(&mut state);
                        } else if state.position(id).is_none() {
                            let restored = self.restore_value(id, removed);
                            state.entries.push(MirrorEntry::synced(restored));
                            self.commit(&mut state);
                        }
                    }
                    settled
                };
                if settled.latest {
                    self.fail("delete", id, &err);
                    MutationOutcome::RolledBack(err)
                } else {
                    MutationOutcome::Discarded
                }
            }
        }
    }
}

// ── Controller ───────────────────────────────────────────────────

/// Optimistic controller for one resource kind.
///
/// Cheaply cloneable. Mutating methods must be called from within a
/// tokio runtime: they apply the optimistic change before returning and
/// spawn the network call.
pub struct CollectionController<R: Resource, B> {
    inner: Arc<Inner<R>>,
    backend: Arc<B>,
}

impl<R: Resource, B> Clone for CollectionController<R, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<R: Resource, B: ResourceBackend<R>> CollectionController<R, B> {
    /// Seed the mirror from `confirmed`.
    pub fn new(backend: Arc<B>, confirmed: ConfirmedCollection<R>, banner: ErrorBanner) -> Self {
        let mut state = MirrorState {
            entries: Vec::new(),
            pending: HashMap::new(),
            next_seq: 0,
            generation: 0,
            draft: R::Draft::default(),
            editing: None,
        };
        state.entries = state.rebuild(&confirmed.snapshot());
        let (mirror, _) = watch::channel(Arc::new(MirrorSnapshot {
            entries: state.entries.clone(),
            generation: 0,
        }));

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                mirror,
                confirmed,
                banner,
                cancel: CancellationToken::new(),
            }),
            backend,
        }
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<MirrorSnapshot<R>> {
        self.inner.mirror.borrow().clone()
    }

    pub fn subscribe(&self) -> MirrorStream<R> {
        MirrorStream::new(self.inner.mirror.subscribe())
    }

    pub fn render_key(&self, id: ResourceId) -> Option<RenderKey> {
        let snap = self.snapshot();
        snap.get(id).map(|entry| snap.render_key(entry))
    }

    pub fn confirmed(&self) -> &ConfirmedCollection<R> {
        &self.inner.confirmed
    }

    pub fn banner(&self) -> &ErrorBanner {
        &self.inner.banner
    }

    /// Number of operations still awaiting settlement.
    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.values().map(Vec::len).sum()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Rebuild the mirror from the confirmed collection.
    pub fn resync(&self) {
        self.inner.resync();
    }

    /// Resync on every confirmed-collection change until unmounted.
    pub fn follow_confirmed(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let mut changes = inner.confirmed.subscribe();
        let cancel = inner.cancel.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        inner.resync();
                    }
                }
            }
            debug!(kind = %R::KIND, "stopped following confirmed collection");
        })
    }

    /// Stop accepting work. Results that arrive later touch no state.
    pub fn unmount(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        !self.inner.cancel.is_cancelled()
    }

    fn ensure_mounted(&self) -> Result<(), CoreError> {
        if self.is_mounted() {
            Ok(())
        } else {
            Err(CoreError::Unmounted)
        }
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Optimistically insert a record built from `draft` and issue the
    /// create. Blank required fields fail before anything is applied.
    pub fn create(&self, draft: R::Draft) -> Result<PendingMutation<R>, CoreError> {
        self.ensure_mounted()?;
        let now = Utc::now();

        let (temp_id, seq) = {
            let mut state = self.inner.lock();
            let temp_id = state.temporary_id(now, &self.inner.confirmed.snapshot());
            let optimistic = R::optimistic(temp_id, &draft, now);
            optimistic.validate()?;

            self.inner.banner.clear();
            let seq = state.issue(temp_id, PendingKind::Create(optimistic.clone()));
            state.entries.push(MirrorEntry {
                record: optimistic,
                state: EntryState::Creating,
                temporary: true,
            });
            self.inner.commit(&mut state);
            (temp_id, seq)
        };
        debug!(kind = %R::KIND, temp_id, seq, "create applied");

        let inner = Arc::clone(&self.inner);
        let backend = Arc::clone(&self.backend);
        let handle = tokio::spawn(async move {
            let result = backend.create(&draft).await;
            inner.settle_create(temp_id, seq, &draft, result)
        });
        Ok(PendingMutation { id: temp_id, handle })
    }

    /// Optimistically merge `patch` into the entry and issue the update.
    pub fn update(
        &self,
        id: ResourceId,
        patch: R::Patch,
    ) -> Result<PendingMutation<R>, CoreError> {
        self.ensure_mounted()?;
        if R::patch_is_empty(&patch) {
            return Err(CoreError::validation("patch", "nothing to update"));
        }

        let (seq, prior) = {
            let mut state = self.inner.lock();
            let idx = state.editable(id)?;
            let prior = state.entries[idx].record.clone();
            let mut optimistic = prior.clone();
            optimistic.apply_patch(&patch, Utc::now());
            optimistic.validate()?;

            self.inner.banner.clear();
            let seq = state.issue(id, PendingKind::Update(optimistic.clone()));
            state.entries[idx] = MirrorEntry {
                record: optimistic,
                state: EntryState::Updating,
                temporary: false,
            };
            self.inner.commit(&mut state);
            (seq, prior)
        };
        debug!(kind = %R::KIND, id, seq, "update applied");

        let inner = Arc::clone(&self.inner);
        let backend = Arc::clone(&self.backend);
        let handle = tokio::spawn(async move {
            let result = backend.update(id, &patch).await;
            inner.settle_update(id, seq, prior, result)
        });
        Ok(PendingMutation { id, handle })
    }

    /// Optimistically remove the entry and issue the delete.
    pub fn delete(&self, id: ResourceId) -> Result<PendingMutation<R>, CoreError> {
        self.ensure_mounted()?;

        let (seq, removed) = {
            let mut state = self.inner.lock();
            let idx = state.editable(id)?;
            let removed = state.entries.remove(idx).record;

            self.inner.banner.clear();
            let seq = state.issue(id, PendingKind::Delete);
            self.inner.commit(&mut state);
            (seq, removed)
        };
        debug!(kind = %R::KIND, id, seq, "delete applied");

        let inner = Arc::clone(&self.inner);
        let backend = Arc::clone(&self.backend);
        let handle = tokio::spawn(async move {
            let result = backend.delete(id).await;
            inner.settle_delete(id, seq, removed, result)
        });
        Ok(PendingMutation { id, handle })
    }

    // ── Form state ───────────────────────────────────────────────

    pub fn draft(&self) -> R::Draft {
        self.inner.lock().draft.clone()
    }

    pub fn set_draft(&self, draft: R::Draft) {
        self.inner.lock().draft = draft;
    }

    /// Create from the current draft. The draft survives a rollback and
    /// is cleared on confirmation.
    pub fn submit_draft(&self) -> Result<PendingMutation<R>, CoreError> {
        let draft = self.draft();
        self.create(draft)
    }

    pub fn editing(&self) -> Option<R> {
        self.inner.lock().editing.clone()
    }

    /// Start editing a copy of the mirror entry.
    pub fn begin_edit(&self, id: ResourceId) -> Result<R, CoreError> {
        let mut state = self.inner.lock();
        let idx = state.editable(id)?;
        let record = state.entries[idx].record.clone();
        state.editing = Some(record.clone());
        Ok(record)
    }

    /// Replace the in-progress edit.
    pub fn set_editing(&self, record: R) -> Result<(), CoreError> {
        let mut state = self.inner.lock();
        state.editable(record.id())?;
        state.editing = Some(record);
        Ok(())
    }

    pub fn cancel_edit(&self) {
        self.inner.lock().editing = None;
    }

    /// Issue an update with the fields that differ between the mirror
    /// entry and the edited copy.
    pub fn submit_edit(&self) -> Result<PendingMutation<R>, CoreError> {
        let (id, patch) = {
            let state = self.inner.lock();
            let edited = state
                .editing
                .as_ref()
                .ok_or_else(|| CoreError::validation("editing", "no record is being edited"))?;
            let idx = state.editable(edited.id())?;
            let original = &state.entries[idx].record;
            (edited.id(), R::patch_between(original, edited))
        };
        self.update(id, patch)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;

    use chrono::TimeZone;
    use folio_api::{BlogPost, BlogPostDraft, Project, ProjectDraft, ProjectPatch};
    use pretty_assertions::assert_eq;
    use tokio::sync::oneshot;

    use super::*;

    // ── Scripted backend ─────────────────────────────────────────

    type Scripted<R> = Result<Option<R>, u16>;

    /// Scripted status that fails before any response arrives.
    const OFFLINE: u16 = 0;

    fn offline() -> folio_api::Error {
        let err = reqwest::Client::new().get("not a url").build().unwrap_err();
        folio_api::Error::Network(err)
    }

    enum Reply<R> {
        Now(Scripted<R>),
        Later(oneshot::Receiver<Scripted<R>>),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Call {
        Create,
        Update(ResourceId),
        Delete(ResourceId),
    }

    /// Replies are queued per call so task scheduling order is irrelevant.
    struct FakeBackend<R> {
        replies: Mutex<HashMap<Call, VecDeque<Reply<R>>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl<R: Resource> FakeBackend<R> {
        fn new() -> Self {
            Self {
                replies: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn push(&self, call: Call, reply: Reply<R>) {
            self.replies
                .lock()
                .unwrap()
                .entry(call)
                .or_default()
                .push_back(reply);
        }

        fn reply_ok(&self, call: Call, record: Option<R>) {
            self.push(call, Reply::Now(Ok(record)));
        }

        fn reply_status(&self, call: Call, status: u16) {
            self.push(call, Reply::Now(Err(status)));
        }

        /// Queue a reply released through the returned sender.
        fn reply_later(&self, call: Call) -> oneshot::Sender<Scripted<R>> {
            let (tx, rx) = oneshot::channel();
            self.push(call, Reply::Later(rx));
            tx
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        async fn next(&self, call: Call) -> Result<Option<R>, folio_api::Error> {
            let reply = {
                self.calls.lock().unwrap().push(call);
                self.replies
                    .lock()
                    .unwrap()
                    .get_mut(&call)
                    .and_then(VecDeque::pop_front)
            };
            let scripted = match reply {
                Some(Reply::Now(scripted)) => scripted,
                Some(Reply::Later(rx)) => rx.await.unwrap_or(Err(599)),
                None => Err(501),
            };
            scripted.map_err(|status| match status {
                OFFLINE => offline(),
                status => folio_api::Error::Api {
                    status,
                    message: "scripted failure".into(),
                },
            })
        }

        async fn next_record(&self, call: Call) -> Result<R, folio_api::Error> {
            self.next(call).await?.ok_or(folio_api::Error::Api {
                status: 502,
                message: "no record scripted".into(),
            })
        }
    }

    impl<R: Resource> ResourceBackend<R> for FakeBackend<R> {
        async fn list(&self) -> Result<Vec<R>, folio_api::Error> {
            Ok(Vec::new())
        }

        async fn create(&self, _draft: &R::Draft) -> Result<R, folio_api::Error> {
            self.next_record(Call::Create).await
        }

        async fn update(&self, id: ResourceId, _patch: &R::Patch) -> Result<R, folio_api::Error> {
            self.next_record(Call::Update(id)).await
        }

        async fn delete(&self, id: ResourceId) -> Result<(), folio_api::Error> {
            self.next(Call::Delete(id)).await.map(|_| ())
        }
    }

    // ── Fixtures ─────────────────────────────────────────────────

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    fn project(id: ResourceId, name: &str, description: &str) -> Project {
        Project {
            id,
            name: name.into(),
            title: Some(name.into()),
            description: description.into(),
            technologies: vec!["rust".into()],
            created_at: ts(1),
            updated_at: ts(1),
            live_url: None,
            repo_url: Some(format!("https://git.example/{id}")),
        }
    }

    fn draft(name: &str) -> ProjectDraft {
        ProjectDraft {
            name: name.into(),
            description: format!("{name} description"),
            ..ProjectDraft::default()
        }
    }

    type Fixture<R> = (
        CollectionController<R, FakeBackend<R>>,
        Arc<FakeBackend<R>>,
        ConfirmedCollection<R>,
        ErrorBanner,
    );

    fn setup<R: Resource>(records: Vec<R>) -> Fixture<R> {
        let backend = Arc::new(FakeBackend::new());
        let confirmed = ConfirmedCollection::new(records);
        let banner = ErrorBanner::new();
        let ctl = CollectionController::new(Arc::clone(&backend), confirmed.clone(), banner.clone());
        (ctl, backend, confirmed, banner)
    }

    fn entries<R: Resource>(ctl: &CollectionController<R, FakeBackend<R>>) -> Vec<MirrorEntry<R>> {
        ctl.snapshot().entries.clone()
    }

    // ── Create ───────────────────────────────────────────────────

    #[tokio::test]
    async fn create_shows_temporary_entry_then_server_record() {
        let (ctl, backend, confirmed, _) = setup(vec![project(1, "Existing", "x")]);
        let reply = backend.reply_later(Call::Create);

        ctl.set_draft(draft("Alpha"));
        let pending = ctl.submit_draft().unwrap();

        let snap = ctl.snapshot();
        let temp = snap.get(pending.id()).unwrap();
        assert!(temp.temporary);
        assert_eq!(temp.state, EntryState::Creating);
        assert_eq!(temp.record.name, "Alpha");
        assert_eq!(snap.len(), 2);

        reply.send(Ok(Some(project(42, "Alpha", "Alpha description")))).unwrap();
        let outcome = pending.outcome().await;
        assert!(outcome.is_confirmed());

        let ids: Vec<_> = confirmed.snapshot().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 42]);
        assert_eq!(ctl.snapshot().ids(), vec![1, 42]);
        assert!(entries(&ctl).iter().all(|e| !e.temporary && !e.is_pending()));
        assert_eq!(ctl.draft(), ProjectDraft::default());
        assert_eq!(backend.calls(), vec![Call::Create]);
    }

    #[tokio::test]
    async fn create_of_an_id_already_present_appears_once() {
        let (ctl, backend, confirmed, _) = setup(vec![project(42, "Alpha", "old")]);
        backend.reply_ok(Call::Create, Some(project(42, "Alpha", "new")));

        ctl.create(draft("Alpha")).unwrap().outcome().await;

        assert_eq!(confirmed.len(), 1);
        assert_eq!(ctl.snapshot().ids(), vec![42]);
        assert_eq!(confirmed.get(42).unwrap().description, "new");
    }

    #[tokio::test]
    async fn failed_blog_post_create_restores_mirror_and_keeps_draft() {
        let (ctl, backend, _, banner) = setup::<BlogPost>(Vec::new());
        backend.reply_status(Call::Create, 500);
        let before = entries(&ctl);

        let post_draft = BlogPostDraft {
            title: "Hello".into(),
            content: "<p>World</p>".into(),
            ..BlogPostDraft::default()
        };
        ctl.set_draft(post_draft.clone());
        let outcome = ctl.submit_draft().unwrap().outcome().await;

        assert!(matches!(outcome.error(), Some(CoreError::Api { status: 500, .. })));
        assert_eq!(entries(&ctl), before);
        assert_eq!(
            banner.current().as_deref(),
            Some("Failed to add blog post. Please try again.")
        );
        assert_eq!(ctl.draft(), post_draft);
    }

    #[tokio::test]
    async fn blank_draft_is_rejected_before_the_network() {
        let (ctl, backend, _, banner) = setup::<Project>(Vec::new());
        banner.set("stale");

        let err = ctl.create(draft("   ")).unwrap_err();

        assert!(err.is_validation());
        assert!(backend.calls().is_empty());
        assert!(ctl.snapshot().is_empty());
        assert_eq!(ctl.snapshot().generation, 0);
        assert_eq!(banner.current().as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn temporary_ids_are_unique() {
        let (ctl, backend, _, _) = setup::<Project>(Vec::new());
        let _a = backend.reply_later(Call::Create);
        let _b = backend.reply_later(Call::Create);

        let first = ctl.create(draft("One")).unwrap();
        let second = ctl.create(draft("Two")).unwrap();

        assert_ne!(first.id(), second.id());
        assert_eq!(ctl.snapshot().len(), 2);
    }

    // ── Update ───────────────────────────────────────────────────

    #[tokio::test]
    async fn pending_edit_is_visible_immediately() {
        let (ctl, backend, confirmed, _) = setup(vec![project(7, "Seven", "old")]);
        let reply = backend.reply_later(Call::Update(7));

        ctl.begin_edit(7).unwrap();
        let mut edited = ctl.editing().unwrap();
        edited.description = "new".into();
        ctl.set_editing(edited).unwrap();
        let pending = ctl.submit_edit().unwrap();

        let entry = ctl.snapshot().get(7).cloned().unwrap();
        assert_eq!(entry.record.description, "new");
        assert_eq!(entry.state, EntryState::Updating);
        assert_eq!(confirmed.get(7).unwrap().description, "old");

        let mut server = project(7, "Seven", "new");
        server.updated_at = ts(9);
        reply.send(Ok(Some(server.clone()))).unwrap();
        assert!(pending.outcome().await.is_confirmed());

        assert_eq!(confirmed.get(7).unwrap(), server);
        assert_eq!(ctl.snapshot().get(7).unwrap().record, server);
        assert!(ctl.editing().is_none());
    }

    #[tokio::test]
    async fn failed_update_restores_pre_edit_value() {
        let original = project(7, "Seven", "old");
        let (ctl, backend, _, banner) = setup(vec![original.clone()]);
        backend.reply_status(Call::Update(7), 409);

        ctl.begin_edit(7).unwrap();
        let patch = ProjectPatch {
            description: Some("new".into()),
            ..ProjectPatch::default()
        };
        let outcome = ctl.update(7, patch).unwrap().outcome().await;

        assert!(outcome.is_rolled_back());
        let entry = ctl.snapshot().get(7).cloned().unwrap();
        assert_eq!(entry.record, original);
        assert_eq!(entry.state, EntryState::Synced);
        assert_eq!(
            banner.current().as_deref(),
            Some("Failed to update project. Please try again.")
        );
        assert!(ctl.editing().is_some());
    }

    #[tokio::test]
    async fn update_preconditions() {
        let (ctl, backend, _, _) = setup(vec![project(7, "Seven", "old")]);
        let _gate = backend.reply_later(Call::Create);

        let unknown = ctl.update(99, ProjectPatch {
            name: Some("x".into()),
            ..ProjectPatch::default()
        });
        assert!(matches!(unknown, Err(CoreError::NotFound { id: 99, .. })));

        let temp = ctl.create(draft("Fresh")).unwrap();
        let on_temp = ctl.delete(temp.id());
        assert!(matches!(on_temp, Err(CoreError::Pending { .. })));

        let blanking = ctl.update(7, ProjectPatch {
            name: Some(String::new()),
            ..ProjectPatch::default()
        });
        assert!(blanking.unwrap_err().is_validation());

        let empty = ctl.update(7, ProjectPatch::default());
        assert!(empty.unwrap_err().is_validation());

        assert!(backend.calls().iter().all(|c| *c == Call::Create));
    }

    // ── Delete ───────────────────────────────────────────────────

    #[tokio::test]
    async fn failed_delete_reappends_the_record_intact() {
        let three = project(3, "Three", "third");
        let (ctl, backend, confirmed, banner) = setup(vec![project(1, "One", "a"), three.clone()]);
        let reply = backend.reply_later(Call::Delete(3));

        let pending = ctl.delete(3).unwrap();
        assert!(ctl.snapshot().get(3).is_none());

        reply.send(Err(404)).unwrap();
        let outcome = pending.outcome().await;

        assert!(matches!(outcome.error(), Some(CoreError::Api { status: 404, .. })));
        assert_eq!(ctl.snapshot().get(3).unwrap().record, three);
        assert_eq!(confirmed.len(), 2);
        assert_eq!(
            banner.current().as_deref(),
            Some("Failed to delete project. Please try again.")
        );
    }

    #[tokio::test]
    async fn confirmed_delete_leaves_both_collections() {
        let (ctl, backend, confirmed, _) = setup(vec![project(1, "One", "a"), project(2, "Two", "b")]);
        backend.reply_ok(Call::Delete(2), None);
        ctl.begin_edit(2).unwrap();

        let outcome = ctl.delete(2).unwrap().outcome().await;

        assert!(outcome.is_confirmed());
        assert_eq!(ctl.snapshot().ids(), vec![1]);
        assert!(confirmed.get(2).is_none());
        assert!(ctl.editing().is_none());
    }

    // ── Resync ───────────────────────────────────────────────────

    #[tokio::test]
    async fn resync_is_idempotent() {
        let (ctl, _, confirmed, _) = setup(vec![project(1, "One", "a")]);
        confirmed.replace(vec![project(1, "One", "a"), project(2, "Two", "b")]);

        ctl.resync();
        let first = ctl.snapshot();
        ctl.resync();
        let second = ctl.snapshot();

        assert_eq!(first, second);
        assert_eq!(second.ids(), vec![1, 2]);
    }

    #[tokio::test]
    async fn resync_preserves_in_flight_operations() {
        let (ctl, backend, confirmed, _) = setup(vec![
            project(1, "One", "a"),
            project(2, "Two", "b"),
            project(3, "Three", "c"),
        ]);
        let _update = backend.reply_later(Call::Update(1));
        let _delete = backend.reply_later(Call::Delete(2));
        let _create = backend.reply_later(Call::Create);

        ctl.update(1, ProjectPatch {
            description: Some("optimistic".into()),
            ..ProjectPatch::default()
        })
        .unwrap();
        ctl.delete(2).unwrap();
        let temp = ctl.create(draft("Fresh")).unwrap();

        confirmed.replace(vec![
            project(1, "One", "server"),
            project(2, "Two", "b"),
            project(3, "Three", "server"),
            project(4, "Four", "d"),
        ]);
        ctl.resync();

        let snap = ctl.snapshot();
        assert_eq!(snap.ids(), vec![1, 3, 4, temp.id()]);
        assert_eq!(snap.get(1).unwrap().record.description, "optimistic");
        assert_eq!(snap.get(3).unwrap().record.description, "server");
        assert!(snap.get(temp.id()).unwrap().temporary);
    }

    #[tokio::test]
    async fn follow_confirmed_tracks_parent_changes() {
        let (ctl, _, confirmed, _) = setup::<Project>(Vec::new());
        let follower = ctl.follow_confirmed();
        let mut stream = ctl.subscribe();

        confirmed.replace(vec![project(5, "Five", "e")]);
        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.ids(), vec![5]);

        ctl.unmount();
        follower.await.unwrap();
    }

    // ── Races & lifecycle ────────────────────────────────────────

    #[tokio::test]
    async fn last_issued_operation_wins() {
        let (ctl, backend, confirmed, banner) = setup(vec![project(5, "Five", "old")]);
        let update_reply = backend.reply_later(Call::Update(5));
        let delete_reply = backend.reply_later(Call::Delete(5));

        let update = ctl
            .update(5, ProjectPatch {
                description: Some("edited".into()),
                ..ProjectPatch::default()
            })
            .unwrap();
        let delete = ctl.delete(5).unwrap();
        assert!(ctl.snapshot().get(5).is_none());

        update_reply.send(Ok(Some(project(5, "Five", "edited")))).unwrap();
        assert!(matches!(update.outcome().await, MutationOutcome::Discarded));
        assert!(ctl.snapshot().get(5).is_none());
        assert_eq!(confirmed.get(5).unwrap().description, "edited");

        delete_reply.send(Ok(None)).unwrap();
        assert!(delete.outcome().await.is_confirmed());
        assert!(ctl.snapshot().is_empty());
        assert!(confirmed.is_empty());
        assert!(banner.current().is_none());
        assert_eq!(backend.calls(), vec![Call::Update(5), Call::Delete(5)]);
    }

    #[tokio::test]
    async fn superseded_failure_does_not_roll_back() {
        let (ctl, backend, _, banner) = setup(vec![project(5, "Five", "old")]);
        let first = backend.reply_later(Call::Update(5));
        let _second = backend.reply_later(Call::Update(5));

        let patch = |d: &str| ProjectPatch {
            description: Some(d.into()),
            ..ProjectPatch::default()
        };
        let stale = ctl.update(5, patch("one")).unwrap();
        ctl.update(5, patch("two")).unwrap();

        first.send(Err(500)).unwrap();
        assert!(matches!(stale.outcome().await, MutationOutcome::Discarded));
        assert_eq!(ctl.snapshot().get(5).unwrap().record.description, "two");
        assert!(banner.current().is_none());
    }

    #[tokio::test]
    async fn later_failure_keeps_older_update_pending_until_it_settles() {
        let (ctl, backend, confirmed, banner) = setup(vec![project(5, "Five", "old")]);
        let first = backend.reply_later(Call::Update(5));
        let second = backend.reply_later(Call::Update(5));

        let patch = |d: &str| ProjectPatch {
            description: Some(d.into()),
            ..ProjectPatch::default()
        };
        let older = ctl.update(5, patch("one")).unwrap();
        let newer = ctl.update(5, patch("two")).unwrap();

        second.send(Err(500)).unwrap();
        assert!(newer.outcome().await.is_rolled_back());
        let entry = ctl.snapshot().get(5).cloned().unwrap();
        assert_eq!(entry.record.description, "one");
        assert_eq!(entry.state, EntryState::Updating);
        assert_eq!(ctl.pending_count(), 1);

        first.send(Err(500)).unwrap();
        assert!(older.outcome().await.is_rolled_back());
        let entry = ctl.snapshot().get(5).cloned().unwrap();
        assert_eq!(entry.record, confirmed.get(5).unwrap());
        assert_eq!(entry.record.description, "old");
        assert_eq!(entry.state, EntryState::Synced);
        assert_eq!(ctl.pending_count(), 0);
        assert_eq!(
            banner.current().as_deref(),
            Some("Failed to update project. Please try again.")
        );
    }

    #[tokio::test]
    async fn failed_update_then_failed_delete_restores_server_value() {
        let (ctl, backend, _, banner) = setup(vec![project(5, "Five", "old")]);
        let update_reply = backend.reply_later(Call::Update(5));
        let delete_reply = backend.reply_later(Call::Delete(5));

        let update = ctl
            .update(5, ProjectPatch {
                description: Some("edited".into()),
                ..ProjectPatch::default()
            })
            .unwrap();
        let delete = ctl.delete(5).unwrap();

        delete_reply.send(Err(500)).unwrap();
        assert!(delete.outcome().await.is_rolled_back());
        let entry = ctl.snapshot().get(5).cloned().unwrap();
        assert_eq!(entry.record.description, "edited");
        assert!(entry.is_pending());

        update_reply.send(Err(500)).unwrap();
        assert!(update.outcome().await.is_rolled_back());
        let snap = ctl.snapshot();
        assert_eq!(snap.ids(), vec![5]);
        let entry = snap.get(5).unwrap();
        assert_eq!(entry.record.description, "old");
        assert_eq!(entry.state, EntryState::Synced);
        assert_eq!(ctl.pending_count(), 0);
        assert!(banner.current().is_some());
    }

    #[tokio::test]
    async fn update_and_delete_failing_oldest_first_restore_server_value() {
        let (ctl, backend, _, _) = setup(vec![project(5, "Five", "old")]);
        backend.reply_status(Call::Update(5), 500);
        let delete_reply = backend.reply_later(Call::Delete(5));

        let update = ctl
            .update(5, ProjectPatch {
                description: Some("edited".into()),
                ..ProjectPatch::default()
            })
            .unwrap();
        let delete = ctl.delete(5).unwrap();

        assert!(matches!(update.outcome().await, MutationOutcome::Discarded));
        assert!(ctl.snapshot().get(5).is_none());

        delete_reply.send(Err(500)).unwrap();
        assert!(delete.outcome().await.is_rolled_back());
        let entry = ctl.snapshot().get(5).cloned().unwrap();
        assert_eq!(entry.record.description, "old");
        assert_eq!(entry.state, EntryState::Synced);
    }

    #[tokio::test]
    async fn network_failure_rolls_back_with_generic_banner() {
        let original = project(7, "Seven", "old");
        let (ctl, backend, confirmed, banner) = setup(vec![original.clone()]);
        backend.reply_status(Call::Update(7), OFFLINE);
        backend.reply_status(Call::Create, OFFLINE);

        let outcome = ctl
            .update(7, ProjectPatch {
                description: Some("new".into()),
                ..ProjectPatch::default()
            })
            .unwrap()
            .outcome()
            .await;

        assert!(matches!(outcome.error(), Some(CoreError::Network { .. })));
        assert_eq!(ctl.snapshot().get(7).unwrap().record, original);
        assert_eq!(
            banner.current().as_deref(),
            Some("Failed to update project. Please try again.")
        );

        let outcome = ctl.create(draft("Offline")).unwrap().outcome().await;
        assert!(matches!(outcome.error(), Some(CoreError::Network { .. })));
        assert_eq!(ctl.snapshot().ids(), vec![7]);
        assert_eq!(confirmed.len(), 1);
        assert_eq!(
            banner.current().as_deref(),
            Some("Failed to add project. Please try again.")
        );
    }

    #[tokio::test]
    async fn draft_edited_during_create_survives_confirmation() {
        let (ctl, backend, _, _) = setup::<Project>(Vec::new());
        let reply = backend.reply_later(Call::Create);

        ctl.set_draft(draft("Alpha"));
        let pending = ctl.submit_draft().unwrap();
        ctl.set_draft(draft("Beta"));

        reply.send(Ok(Some(project(42, "Alpha", "Alpha description")))).unwrap();
        assert!(pending.outcome().await.is_confirmed());
        assert_eq!(ctl.draft(), draft("Beta"));
    }

    #[tokio::test]
    async fn results_after_unmount_are_discarded() {
        let (ctl, backend, confirmed, banner) = setup::<Project>(Vec::new());
        let reply = backend.reply_later(Call::Create);

        let pending = ctl.create(draft("Late")).unwrap();
        let before = ctl.snapshot();
        ctl.unmount();

        reply.send(Err(500)).unwrap();
        assert!(matches!(pending.outcome().await, MutationOutcome::Discarded));
        assert_eq!(ctl.snapshot(), before);
        assert!(confirmed.is_empty());
        assert!(banner.current().is_none());
        assert!(matches!(ctl.create(draft("Again")), Err(CoreError::Unmounted)));
    }

    #[tokio::test]
    async fn render_key_changes_with_generation() {
        let (ctl, backend, _, _) = setup(vec![project(1, "One", "a"), project(2, "Two", "b")]);
        let _gate = backend.reply_later(Call::Delete(2));
        let before = ctl.render_key(1).unwrap();

        ctl.delete(2).unwrap();

        let after = ctl.render_key(1).unwrap();
        assert_eq!(before.id, after.id);
        assert_ne!(before, after);
        assert_ne!(before.to_string(), after.to_string());
    }
}
