//! Multicast observer registry and the subscription handle it vends.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Stream of values delivered by a container (states or effects).
///
/// Each subscription owns an unbounded buffer, so a slow reader never
/// blocks the producer and never loses a value it was subscribed for.
/// The stream ends when the producer is torn down.
pub struct Subscription<T> {
    receiver: UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Create a connected sender/subscription pair.
    ///
    /// Producers outside the container (repositories, tests) use this to
    /// hand out the same stream type the container does.
    pub fn channel() -> (UnboundedSender<T>, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self { receiver })
    }

    /// A subscription that is already complete.
    pub fn closed() -> Self {
        let (_, subscription) = Self::channel();
        subscription
    }

    /// Wait for the next value. `None` once the producer is gone and the
    /// buffer is drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Take a buffered value without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// True when the producer is gone and nothing is left to read.
    pub fn is_finished(&self) -> bool {
        self.receiver.is_closed() && self.receiver.is_empty()
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.receiver.poll_recv(cx)
    }
}

/// Registry of live subscribers. `None` once closed.
pub(crate) struct Observers<T> {
    senders: Mutex<Option<Vec<UnboundedSender<T>>>>,
}

impl<T: Clone> Observers<T> {
    pub(crate) fn new() -> Self {
        Self {
            senders: Mutex::new(Some(Vec::new())),
        }
    }

    /// Subscribe to values broadcast from now on.
    pub(crate) fn subscribe(&self) -> Subscription<T> {
        self.register(None)
    }

    /// Subscribe and receive `initial` before anything broadcast later.
    pub(crate) fn subscribe_with(&self, initial: T) -> Subscription<T> {
        self.register(Some(initial))
    }

    fn register(&self, initial: Option<T>) -> Subscription<T> {
        let mut guard = self.senders.lock();
        let Some(senders) = guard.as_mut() else {
            return Subscription::closed();
        };
        let (sender, subscription) = Subscription::channel();
        if let Some(value) = initial {
            // Cannot fail: the receiver is alive in `subscription`.
            let _ = sender.send(value);
        }
        senders.push(sender);
        subscription
    }

    /// Deliver `value` to every live subscriber, pruning dropped ones.
    /// Returns how many subscribers received it.
    pub(crate) fn broadcast(&self, value: T) -> usize {
        let mut guard = self.senders.lock();
        let Some(senders) = guard.as_mut() else {
            return 0;
        };
        senders.retain(|sender| sender.send(value.clone()).is_ok());
        senders.len()
    }
}

impl<T> Observers<T> {
    /// Detach every subscriber; later subscriptions start closed.
    pub(crate) fn close(&self) {
        self.senders.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_without_subscribers_is_dropped() {
        let observers = Observers::new();
        assert_eq!(observers.broadcast(1), 0);

        let mut late = observers.subscribe();
        assert_eq!(late.try_recv(), None);
        observers.broadcast(2);
        assert_eq!(late.try_recv(), Some(2));
    }

    #[test]
    fn subscribe_with_delivers_initial_first() {
        let observers = Observers::new();
        let mut subscription = observers.subscribe_with("seed");
        observers.broadcast("next");
        assert_eq!(subscription.try_recv(), Some("seed"));
        assert_eq!(subscription.try_recv(), Some("next"));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let observers = Observers::new();
        let kept = observers.subscribe();
        let dropped = observers.subscribe();
        drop(dropped);
        assert_eq!(observers.broadcast(7), 1);
        drop(kept);
        assert_eq!(observers.broadcast(8), 0);
    }

    #[test]
    fn close_finishes_existing_and_future_subscriptions() {
        let observers = Observers::new();
        let mut existing = observers.subscribe();
        observers.broadcast(1);
        observers.close();

        assert_eq!(existing.try_recv(), Some(1));
        assert!(existing.is_finished());
        assert!(observers.subscribe().is_finished());
        assert_eq!(observers.broadcast(2), 0);
    }
}
