//! Deadline context for the upload call
//!
//! The deadline clock starts when the context is created, not when the put
//! is issued, so time spent listing buckets and opening the file counts
//! against the budget.

use std::time::Duration;
use tokio::time::Instant;

/// Cancellation signal attached to a single upload
#[derive(Debug, Clone)]
pub struct UploadContext {
    timeout: Duration,
    deadline: Option<Instant>,
}

impl UploadContext {
    /// A context that never fires
    pub fn background() -> Self {
        Self {
            timeout: Duration::ZERO,
            deadline: None,
        }
    }

    /// A context that fires `timeout` from now; zero means no deadline
    pub fn with_timeout(timeout: Duration) -> Self {
        if timeout.is_zero() {
            return Self::background();
        }
        Self {
            timeout,
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// The configured timeout, zero when there is no deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the deadline has already passed
    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Resolves once the deadline passes; pending forever without one
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}
