//! Shared one-shot flags used between supervisors and their workers
//!
//! Both flags are written at most once and read many times, so a plain
//! atomic is enough. `Interrupt` also carries a `Notify` so sleepers wake
//! immediately instead of at their next poll.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Process-wide user interrupt (Ctrl+C).
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    inner: Arc<InterruptInner>,
}

#[derive(Debug, Default)]
struct InterruptInner {
    fired: AtomicBool,
    notify: Notify,
}

impl Interrupt {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark as interrupted and wake every waiter.
    pub fn trigger(&self) {
        self.inner.fired.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    #[inline]
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.inner.fired.load(Ordering::SeqCst)
    }

    /// Resolves once `trigger` has been called.
    pub async fn triggered(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }

    /// Sleep for `duration` unless interrupted first. Returns `true` when interrupted.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => self.is_triggered(),
            _ = self.triggered() => true,
        }
    }
}

/// Per-session "handshake found" flag. The first confirmation wins.
#[derive(Debug, Clone, Default)]
pub struct HandshakeLatch {
    found: Arc<AtomicBool>,
}

impl HandshakeLatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only for the call that flipped the latch.
    pub fn confirm(&self) -> bool {
        self.found
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[inline]
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.found.load(Ordering::Acquire)
    }
}
