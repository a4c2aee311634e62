//! Per-view request scoping.
//!
//! A [`ViewScope`] belongs to one view instance. Each refresh of the view is
//! wrapped in [`ViewScope::guard`], which stamps it with a sequence number
//! when it is issued. A response is applied only if the scope is still alive
//! and no newer refresh was issued in the meantime, so a slow early request
//! can never overwrite the result of a faster later one.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::debug;

/// Cancellation and ordering guard for one view.
#[derive(Debug)]
pub struct ViewScope {
    name: &'static str,
    cancel_tx: watch::Sender<bool>,
    sequence: AtomicU64,
}

impl ViewScope {
    /// Creates a live scope for the named view.
    pub fn new(name: &'static str) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            name,
            cancel_tx,
            sequence: AtomicU64::new(0),
        }
    }

    /// Name of the owning view.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// True until [`teardown`](Self::teardown) runs.
    pub fn is_alive(&self) -> bool {
        !*self.cancel_tx.borrow()
    }

    /// Sequence number of the most recently issued request.
    pub fn latest(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Stamps `fut` with the next sequence number and races it against
    /// teardown.
    ///
    /// The stamp is taken when `guard` is called, not when the returned
    /// future is first polled. The result is `Some` only when the scope is
    /// still alive and no newer request was issued; otherwise the output is
    /// discarded. Teardown drops the in-flight future immediately.
    pub fn guard<'a, F>(&'a self, fut: F) -> impl Future<Output = Option<F::Output>> + 'a
    where
        F: Future + 'a,
    {
        let ticket = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel_rx = self.cancel_tx.subscribe();

        async move {
            if !self.is_alive() {
                return None;
            }

            let output = tokio::select! {
                biased;
                _ = cancelled(cancel_rx) => {
                    debug!(view = self.name, ticket, "Request cancelled by teardown");
                    return None;
                }
                output = fut => output,
            };

            if !self.is_alive() {
                debug!(view = self.name, ticket, "Discarding response after teardown");
                return None;
            }
            let latest = self.latest();
            if latest != ticket {
                debug!(view = self.name, ticket, latest, "Discarding stale response");
                return None;
            }
            Some(output)
        }
    }

    /// Cancels every pending guarded request. Idempotent.
    pub fn teardown(&self) {
        if !self.cancel_tx.send_replace(true) {
            debug!(view = self.name, "View scope torn down");
        }
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn cancelled(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_live_scope_applies_result() {
        let scope = ViewScope::new("overview");
        assert_eq!(scope.guard(async { 7 }).await, Some(7));
        assert_eq!(scope.latest(), 1);
    }

    #[tokio::test]
    async fn test_guard_accepts_borrowing_future() {
        let scope = ViewScope::new("case");
        let case_id = String::from("c-1");
        let fetch = async { case_id.len() };
        assert_eq!(scope.guard(fetch).await, Some(3));
    }

    #[tokio::test]
    async fn test_sequential_requests_both_apply() {
        let scope = ViewScope::new("cases");
        assert_eq!(scope.guard(async { "first" }).await, Some("first"));
        assert_eq!(scope.guard(async { "second" }).await, Some("second"));
    }

    #[tokio::test]
    async fn test_slow_earlier_response_is_discarded() {
        let scope = ViewScope::new("cases");

        let slow = scope.guard(async {
            sleep(Duration::from_millis(50)).await;
            "slow"
        });
        let fast = scope.guard(async { "fast" });

        let (slow, fast) = tokio::join!(slow, fast);
        assert_eq!(fast, Some("fast"));
        assert_eq!(slow, None);
    }

    #[tokio::test]
    async fn test_earlier_response_discarded_even_if_later_is_pending() {
        let scope = ViewScope::new("cases");

        let early = scope.guard(async { "early" });
        let _later = scope.guard(std::future::pending::<&str>());

        assert_eq!(early.await, None);
    }

    #[tokio::test]
    async fn test_teardown_cancels_pending_request() {
        let scope = ViewScope::new("case_detail");
        let dropped = Arc::new(AtomicBool::new(false));

        struct Flag(Arc<AtomicBool>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let flag = Flag(dropped.clone());
        let pending = scope.guard(async move {
            let _flag = flag;
            std::future::pending::<()>().await
        });

        let (result, _) = tokio::join!(pending, async {
            sleep(Duration::from_millis(5)).await;
            scope.teardown();
        });

        assert_eq!(result, None);
        assert!(dropped.load(Ordering::SeqCst));
        assert!(!scope.is_alive());
    }

    #[tokio::test]
    async fn test_everything_resolves_to_none_after_teardown() {
        let scope = ViewScope::new("experiments");
        scope.teardown();
        scope.teardown();

        assert_eq!(scope.guard(async { 1 }).await, None);
        assert_eq!(scope.guard(async { 2 }).await, None);
    }
}
