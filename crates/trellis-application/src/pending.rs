//! In-flight work tracking for the exit guard and busy flags.
//!
//! Sends and extractions hold a [`PendingGuard`] for as long as they run.
//! The tracker publishes whether any guard is alive on a watch channel so
//! the shell can wait for the flag to drop before exiting.

use std::sync::{Arc, Mutex};
use tokio::sync::watch;

struct Inner {
    count: Mutex<usize>,
    pending_tx: watch::Sender<bool>,
}

/// Counts live guards and publishes `has_pending_tasks`.
#[derive(Clone)]
pub struct PendingTasks {
    inner: Arc<Inner>,
}

impl PendingTasks {
    pub fn new() -> Self {
        let (pending_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                count: Mutex::new(0),
                pending_tx,
            }),
        }
    }

    /// Registers a unit of work; it stays pending until the guard drops.
    pub fn register(&self) -> PendingGuard {
        let mut count = self.inner.count.lock().unwrap_or_else(|e| e.into_inner());
        *count += 1;
        if *count == 1 {
            self.inner.pending_tx.send_replace(true);
        }
        PendingGuard {
            inner: self.inner.clone(),
        }
    }

    pub fn active_count(&self) -> usize {
        *self.inner.count.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn has_pending_tasks(&self) -> bool {
        *self.inner.pending_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.pending_tx.subscribe()
    }

    /// Resolves once no work is pending. There is no timeout.
    pub async fn wait_until_idle(&self) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|pending| !*pending).await;
    }
}

impl Default for PendingTasks {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps its unit of work pending until dropped.
pub struct PendingGuard {
    inner: Arc<Inner>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut count = self.inner.count.lock().unwrap_or_else(|e| e.into_inner());
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.inner.pending_tx.send_replace(false);
        }
    }
}
