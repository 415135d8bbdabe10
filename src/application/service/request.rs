// src/application/service/request.rs
// Request tokens so only the newest response for a slot is applied

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type RequestToken = u64;

/// Clones share the same counter, so a spawned fetch can check whether it
/// was superseded before reporting back.
#[derive(Debug, Clone, Default)]
pub struct RequestSlot {
    latest: Arc<AtomicU64>,
}

impl RequestSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request, superseding every earlier token.
    pub fn issue(&self) -> RequestToken {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token != 0 && self.latest.load(Ordering::SeqCst) == token
    }

    /// Abandons the in-flight request without starting another.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_token_supersedes_older() {
        let slot = RequestSlot::new();
        let first = slot.issue();
        let second = slot.issue();
        assert!(!slot.is_current(first));
        assert!(slot.is_current(second));
    }

    #[test]
    fn invalidate_abandons_current_token() {
        let slot = RequestSlot::new();
        let token = slot.issue();
        slot.invalidate();
        assert!(!slot.is_current(token));
        assert!(!slot.is_current(0));
    }

    #[test]
    fn clones_share_state() {
        let slot = RequestSlot::new();
        let handle = slot.clone();
        let token = slot.issue();
        assert!(handle.is_current(token));
        handle.issue();
        assert!(!slot.is_current(token));
    }
}
