//! Cooperative cancellation for solver jobs
//!
//! A job's [`CancelHandle`] lives in the manager's registry; its
//! [`CancelSignal`] is handed to the pipeline and to the solver. Cancelling
//! never interrupts anything, it only publishes a request that both sides
//! observe at their next check.

use tokio::sync::watch;

/// A cancellation request and what to do with the last best solution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelRequest {
    /// Discard the stored solution instead of keeping it
    pub clear: bool,
}

/// Creates a connected handle/signal pair
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(None);
    (CancelHandle { tx }, CancelSignal { rx })
}

/// Sending side, owned by the registry
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<Option<CancelRequest>>,
}

impl CancelHandle {
    /// Publishes a cancellation request
    ///
    /// The first request wins, except that a later `clear` request upgrades
    /// an earlier keep request.
    pub fn cancel(&self, clear: bool) {
        self.tx.send_if_modified(|current| match current {
            Some(request) if request.clear || !clear => false,
            _ => {
                *current = Some(CancelRequest { clear });
                true
            }
        });
    }

    pub fn is_cancelled(&self) -> bool {
        self.tx.borrow().is_some()
    }
}

/// Receiving side, observed by the pipeline and the solver
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<Option<CancelRequest>>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// The pending request, if any
    pub fn requested(&self) -> Option<CancelRequest> {
        *self.rx.borrow()
    }

    /// Waits until cancellation is requested
    ///
    /// Never resolves if the handle is dropped without cancelling.
    pub async fn cancelled(&mut self) -> CancelRequest {
        let requested = match self.rx.wait_for(Option::is_some).await {
            Ok(request) => *request,
            Err(_) => None,
        };
        match requested {
            Some(request) => request,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_pair_is_not_cancelled() {
        let (handle, signal) = cancel_pair();
        assert!(!handle.is_cancelled());
        assert!(!signal.is_cancelled());
        assert_eq!(signal.requested(), None);
    }

    #[test]
    fn test_first_request_wins() {
        let (handle, signal) = cancel_pair();
        handle.cancel(true);
        handle.cancel(false);
        assert_eq!(signal.requested(), Some(CancelRequest { clear: true }));
    }

    #[test]
    fn test_clear_upgrades_keep_request() {
        let (handle, signal) = cancel_pair();
        handle.cancel(false);
        handle.cancel(true);
        assert_eq!(signal.requested(), Some(CancelRequest { clear: true }));
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let (handle, signal) = cancel_pair();
        let mut waiter = signal.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel(false);

        let request = task.await.unwrap();
        assert_eq!(request, CancelRequest { clear: false });
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_handle_never_cancels() {
        let (handle, mut signal) = cancel_pair();
        drop(handle);

        let result = tokio::time::timeout(Duration::from_millis(20), signal.cancelled()).await;
        assert!(result.is_err());
    }
}
