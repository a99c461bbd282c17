//! Cancellation tokens for fire-and-forget refreshes.
//!
//! Each refresh target (the feed, one topic's summary) has at most one live
//! token. Starting a new refresh for a target cancels the previous one, so a
//! slower, older refresh can never overwrite a newer result.

use std::collections::HashMap;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct BackgroundTasks {
    tokens: Mutex<HashMap<String, CancellationToken>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh token for `target`, cancelling the one it replaces.
    pub fn begin(&self, target: &str) -> CancellationToken {
        let token = CancellationToken::new();
        let mut tokens = self.tokens.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = tokens.insert(target.to_string(), token.clone()) {
            tracing::debug!("Superseding background refresh for {}", target);
            previous.cancel();
        }
        token
    }

    pub fn cancel(&self, target: &str) {
        let mut tokens = self.tokens.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = tokens.remove(target) {
            token.cancel();
        }
    }

    pub fn cancel_all(&self) {
        let mut tokens = self.tokens.lock().unwrap_or_else(|e| e.into_inner());
        for (_, token) in tokens.drain() {
            token.cancel();
        }
    }
}
