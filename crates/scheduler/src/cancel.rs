//! Cancellation tokens and subscription handles
//!
//! A [`Subscription`] is handed to the host when the engine attaches to a
//! document. The engine keeps a clone of its [`CancellationToken`] and stops
//! reacting to events once the subscription is closed or dropped.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared cancellation flag
///
/// Multiple tokens can share the same underlying state via Arc.
///
/// # Example
///
/// ```
/// use pdf_highlighter_scheduler::CancellationToken;
///
/// let token = CancellationToken::new();
/// let observer = token.clone();
///
/// token.cancel();
/// assert!(observer.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new token in the non-cancelled state
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel this token and every clone of it. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether two tokens share the same flag
    pub fn same_as(&self, other: &CancellationToken) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for an attached document session
///
/// Closing (or dropping) the handle cancels its token, which detaches every
/// listener that observes it.
#[derive(Debug)]
pub struct Subscription {
    token: CancellationToken,
}

impl Subscription {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Token observers use to check whether the session is still live
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Whether `token` belongs to this subscription
    pub fn owns(&self, token: &CancellationToken) -> bool {
        self.token.same_as(token)
    }

    /// Close the session explicitly
    pub fn close(self) {
        // Drop does the work
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.token.is_cancelled() {
            log::trace!("subscription closed");
        }
        self.token.cancel();
    }
}
