use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Teardown flag shared between a container, its loop, and its scopes.
#[derive(Clone)]
pub(crate) struct Lifecycle {
    torn_down: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            torn_down: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Returns `true` only for the call that actually flipped the flag.
    pub(crate) fn tear_down(&self) -> bool {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.notify.notify_waiters();
        true
    }

    pub(crate) fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    pub(crate) async fn wait(&self) {
        // Register with Notify BEFORE checking the flag: tear_down() could
        // fire between the check and the await, and notify_waiters() does not
        // store a permit for late subscribers.
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_torn_down() {
            return;
        }
        notified.await;
    }
}

/// Counts intents that were submitted but not yet fully processed.
#[derive(Clone)]
pub(crate) struct PendingIntents {
    count: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl PendingIntents {
    pub(crate) fn new() -> Self {
        Self {
            count: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
        }
    }

    pub(crate) fn increment(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn decrement(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    /// Wake every `wait_idle` caller regardless of the count (used on teardown).
    pub(crate) fn release_waiters(&self) {
        self.idle.notify_waiters();
    }

    pub(crate) async fn wait_idle(&self, lifecycle: &Lifecycle) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if lifecycle.is_torn_down() || self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn tear_down_reports_first_call_only() {
        let lifecycle = Lifecycle::new();
        assert!(!lifecycle.is_torn_down());
        assert!(lifecycle.tear_down());
        assert!(!lifecycle.tear_down());
        assert!(lifecycle.is_torn_down());
    }

    #[tokio::test]
    async fn wait_returns_immediately_after_tear_down() {
        let lifecycle = Lifecycle::new();
        lifecycle.tear_down();
        tokio::time::timeout(Duration::from_millis(100), lifecycle.wait())
            .await
            .expect("wait should not block once torn down");
    }

    #[tokio::test]
    async fn wait_wakes_on_tear_down_from_other_task() {
        let lifecycle = Lifecycle::new();
        let waiter = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.wait().await })
        };
        tokio::task::yield_now().await;
        lifecycle.tear_down();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .expect("waiter task");
    }

    #[tokio::test]
    async fn wait_idle_tracks_pending_count() {
        let lifecycle = Lifecycle::new();
        let pending = PendingIntents::new();
        pending.wait_idle(&lifecycle).await;

        pending.increment();
        pending.increment();
        let waiter = {
            let pending = pending.clone();
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { pending.wait_idle(&lifecycle).await })
        };
        pending.decrement();
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        pending.decrement();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("idle waiter should wake")
            .expect("waiter task");
    }

    #[tokio::test]
    async fn release_waiters_unblocks_on_tear_down() {
        let lifecycle = Lifecycle::new();
        let pending = PendingIntents::new();
        pending.increment();
        let waiter = {
            let pending = pending.clone();
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { pending.wait_idle(&lifecycle).await })
        };
        tokio::task::yield_now().await;
        lifecycle.tear_down();
        pending.release_waiters();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake on teardown")
            .expect("waiter task");
    }
}
