//! Deadlines and cooperative cancellation for planning sessions.
//!
//! Every completion call made during [`Orchestrator::plan_with`](crate::orchestration::Orchestrator::plan_with)
//! is raced against the session's [`CallOptions`]. A fired deadline becomes
//! [`ServiceError::DeadlineExceeded`] and a fired token
//! [`ServiceError::Cancelled`]; the agent turns either into a terminal result
//! and nothing is raised out of `plan_with`.
//!
//! ```rust
//! use tripllm::cancel::{CallOptions, CancellationToken};
//! use std::time::Duration;
//!
//! let token = CancellationToken::new();
//! let options = CallOptions::default()
//!     .with_deadline(Duration::from_secs(30))
//!     .with_cancellation(token.clone());
//!
//! assert!(!token.is_cancelled());
//! token.cancel();
//! assert!(options.is_cancelled());
//! ```

use crate::client_wrapper::ServiceError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Cloneable handle that signals every clone when [`cancel`](Self::cancel) is called.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once the token is cancelled. Returns immediately if it
    /// already is.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // `wait_for` checks the current value first; the sender lives in
        // `self`, so the channel cannot close underneath us.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

/// Per-session limits applied to each completion call.
#[derive(Clone, Debug, Default)]
pub struct CallOptions {
    /// Overall budget for the session, measured from [`start`](Self::start).
    pub deadline: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl CallOptions {
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, CancellationToken::is_cancelled)
    }

    /// Pin the relative deadline to an absolute instant for one session.
    pub fn start(&self) -> ActiveCall {
        ActiveCall {
            deadline: self.deadline.map(|d| Instant::now() + d),
            cancel: self.cancel.clone(),
        }
    }
}

/// [`CallOptions`] bound to a session start time.
#[derive(Clone, Debug, Default)]
pub struct ActiveCall {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl ActiveCall {
    /// No deadline, no cancellation.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Drive `call` to completion unless the deadline passes or the token
    /// fires first.
    pub async fn run<F, T>(&self, call: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                return Err(ServiceError::Cancelled);
            }
        }

        let bounded = async {
            match self.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, call).await {
                    Ok(result) => result,
                    Err(_) => Err(ServiceError::DeadlineExceeded),
                },
                None => call.await,
            }
        };

        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    result = bounded => result,
                    _ = token.cancelled() => Err(ServiceError::Cancelled),
                }
            }
            None => bounded.await,
        }
    }
}
