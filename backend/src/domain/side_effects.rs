//! Bounded, best-effort execution of side-channel calls.
//!
//! Authenticity scoring and certification anchoring talk to external
//! services. Their failures and timeouts are logged and reported as a
//! [`SideEffectOutcome`], never as errors of the surrounding operation.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Default upper bound for one side-channel call.
pub const DEFAULT_SIDE_EFFECT_TIMEOUT: Duration = Duration::from_secs(5);

/// How a best-effort call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffectOutcome<T> {
    /// The call returned a value in time.
    Completed(T),
    /// The call returned an error.
    Failed {
        /// Rendered error.
        message: String,
    },
    /// The call did not finish within the timeout.
    TimedOut,
}

impl<T> SideEffectOutcome<T> {
    /// The completed value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Failed { .. } | Self::TimedOut => None,
        }
    }
}

/// Runs fallible futures under a timeout and swallows their failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestEffort {
    timeout: Duration,
}

impl Default for BestEffort {
    fn default() -> Self {
        Self::new(DEFAULT_SIDE_EFFECT_TIMEOUT)
    }
}

impl BestEffort {
    /// Create a runner with the given timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Await `call`, logging and absorbing failures.
    ///
    /// `operation` names the side channel in log events.
    pub async fn run<T, E, F>(&self, operation: &'static str, call: F) -> SideEffectOutcome<T>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => SideEffectOutcome::Completed(value),
            Ok(Err(error)) => {
                warn!(operation, error = %error, "side channel call failed");
                SideEffectOutcome::Failed {
                    message: error.to_string(),
                }
            }
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    "side channel call timed out"
                );
                SideEffectOutcome::TimedOut
            }
        }
    }
}
