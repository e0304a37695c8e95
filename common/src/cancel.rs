//! Cooperative stop signal shared between the acquisition loop and whoever wants it to end.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable token; cancelling any clone cancels them all.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
}

impl Cancellation {
    /// Create a token that has not been cancelled.
    pub fn new() -> Cancellation {
        Cancellation::default()
    }

    /// Request a stop.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true once a stop has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn clones_share_state() {
        let token = Cancellation::new();
        let remote = token.clone();
        assert!(!token.is_cancelled());

        thread::spawn(move || remote.cancel())
            .join()
            .unwrap();
        assert!(token.is_cancelled());
    }
}
