// ── Reactive state streams ──
//
// Subscription type for consuming state changes from the MonitorStore.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A subscription to a watched value.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via the `changed()` method or by converting to a `Stream`.
pub struct StateStream<T: Clone + Send + Sync + 'static> {
    current: T,
    receiver: watch::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> StateStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<T>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Get the snapshot captured at creation time.
    pub fn current(&self) -> &T {
        &self.current
    }

    /// Get the latest snapshot (may have changed since creation).
    pub fn latest(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the sender (MonitorStore) has been dropped.
    pub async fn changed(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> StateWatchStream<T> {
        StateWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields a new snapshot each time the underlying state is replaced.
pub struct StateWatchStream<T: Clone + Send + Sync + 'static> {
    inner: WatchStream<T>,
}

impl<T: Clone + Send + Sync + 'static> Stream for StateWatchStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // WatchStream is Unpin when the inner type is Unpin, and our
        // snapshots always are.
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
