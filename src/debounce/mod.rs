//! Time-windowed call coalescing.
//!
//! A [`Debouncer`] owns one background task and at most one pending
//! invocation. Each [`Debouncer::call`] replaces the pending arguments and
//! restarts the window; the wrapped function runs once the window elapses
//! with no further calls. Dropping the debouncer discards anything pending.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Coalesces bursts of calls into a single trailing invocation.
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the debounce task on the current tokio runtime.
    pub fn new<F>(delay: Duration, mut func: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();

        let task = tokio::spawn(async move {
            // Idle until the first call of a burst.
            while let Some(mut latest) = rx.recv().await {
                loop {
                    tokio::select! {
                        next = rx.recv() => match next {
                            Some(args) => latest = args,
                            // Handle dropped with a call pending.
                            None => return,
                        },
                        _ = tokio::time::sleep(delay) => {
                            func(latest);
                            break;
                        }
                    }
                }
            }
        });

        Self { tx, task }
    }

    /// Schedule `func(args)`, superseding any pending invocation.
    pub fn call(&self, args: T) {
        if self.tx.send(args).is_err() {
            tracing::debug!("debounced call after cancellation ignored");
        }
    }

    /// Cancel the pending invocation and stop the task.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
