//! Cancellation signal for a reindex run.

use std::sync::Arc;

use tokio::sync::watch;

/// A signal the caller raises to stop a reindex from issuing new batches.
///
/// Clones share the same state: raising the signal through any clone is seen
/// by all of them. Once raised it stays raised.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Raise the signal.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}
