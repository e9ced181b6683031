//! Cancellation scope for in-flight verification
//!
//! The caller keeps the handle for as long as it cares about the result and
//! passes the token into the operation. Calling `cancel()` or dropping the
//! handle (view teardown) abandons the operation: the eventual result is
//! discarded without touching session state.

use tokio::sync::watch;

pub fn cancel_scope() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// True once the scope is cancelled, explicitly or because the owning
    /// handle was dropped.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once the scope is cancelled.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Handle dropped: the owning scope is gone.
                return;
            }
        }
    }
}
