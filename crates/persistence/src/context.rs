//! Per-operation context: cancellation plus an optional deadline.
//!
//! Every [`Database`](crate::core::Database) operation takes an [`OpContext`].
//! Backends wrap their I/O in [`OpContext::run`], which stops waiting as soon
//! as the context is cancelled or its deadline passes.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{StorageError, StorageResult};

/// Cancellation and deadline carried by a single storage operation.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl OpContext {
    /// A context with no deadline that is cancelled only explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline_in(timeout)
    }

    /// Returns a copy whose deadline is at most `timeout` from now.
    ///
    /// An existing earlier deadline is kept.
    pub fn deadline_in(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns a copy whose deadline is at most `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// A child context: cancelled when this one is, but cancelling the child
    /// leaves the parent untouched. The deadline is inherited.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancels this context and all of its children.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fails fast when the context is already cancelled or expired.
    pub fn check(&self, operation: &str) -> StorageResult<()> {
        if self.cancel.is_cancelled() {
            return Err(StorageError::Cancelled {
                operation: operation.to_string(),
            });
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(StorageError::DeadlineExceeded {
                    operation: operation.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Drives `fut` until it completes, the context is cancelled, or the
    /// deadline passes, whichever happens first.
    ///
    /// When the context wins, `fut` is dropped. Work already handed to a
    /// remote server may still complete there.
    pub async fn run<T, F>(&self, operation: &str, fut: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        self.check(operation)?;

        let guarded = async {
            match self.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(StorageError::DeadlineExceeded {
                        operation: operation.to_string(),
                    }),
                },
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StorageError::Cancelled {
                operation: operation.to_string(),
            }),
            result = guarded => result,
        }
    }
}
