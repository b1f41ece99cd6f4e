// ── Mirror subscriptions ──
//
// Point-in-time and reactive access to a controller's local mirror.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::controller::MirrorSnapshot;
use crate::model::Resource;

/// A subscription to one controller's mirror.
pub struct MirrorStream<R: Resource> {
    current: Arc<MirrorSnapshot<R>>,
    receiver: watch::Receiver<Arc<MirrorSnapshot<R>>>,
}

impl<R: Resource> MirrorStream<R> {
    pub(crate) fn new(receiver: watch::Receiver<Arc<MirrorSnapshot<R>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<MirrorSnapshot<R>> {
        &self.current
    }

    pub fn latest(&self) -> Arc<MirrorSnapshot<R>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change. `None` once the controller is gone.
    pub async fn changed(&mut self) -> Option<Arc<MirrorSnapshot<R>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    pub fn into_stream(self) -> MirrorWatchStream<R> {
        MirrorWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` of mirror snapshots, starting with the current one.
pub struct MirrorWatchStream<R: Resource> {
    inner: WatchStream<Arc<MirrorSnapshot<R>>>,
}

impl<R: Resource> Stream for MirrorWatchStream<R> {
    type Item = Arc<MirrorSnapshot<R>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
