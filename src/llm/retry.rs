//! Retry policy for remote purify calls.
//!
//! [`RetryPolicy::decide`] is a pure mapping from a [`FaultKind`] and the
//! number of retries already spent to a [`RetryDecision`].  Only transient
//! server/transport faults are retried, with linear backoff
//! (`base_delay × retry number`).

use std::time::Duration;

use crate::config::RetryConfig;
use crate::llm::client::FaultKind;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait for the given delay, then repeat the call with the same arguments.
    RetryAfter(Duration),
    /// Surface the failure.
    GiveUp,
}

/// Linear-backoff retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
        }
    }

    /// Decide whether to retry after a failure of kind `kind`, given that
    /// `retries_done` retries have already been attempted.
    ///
    /// ```
    /// use std::time::Duration;
    /// use transcript_purifier::llm::{FaultKind, RetryDecision, RetryPolicy};
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(
    ///     policy.decide(FaultKind::TransientServer, 1),
    ///     RetryDecision::RetryAfter(Duration::from_millis(4000))
    /// );
    /// assert_eq!(policy.decide(FaultKind::RateLimited, 0), RetryDecision::GiveUp);
    /// ```
    pub fn decide(&self, kind: FaultKind, retries_done: u32) -> RetryDecision {
        match kind {
            FaultKind::TransientServer if retries_done < self.max_retries => {
                RetryDecision::RetryAfter(self.base_delay * (retries_done + 1))
            }
            _ => RetryDecision::GiveUp,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_faults_back_off_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(FaultKind::TransientServer, 0),
            RetryDecision::RetryAfter(Duration::from_millis(2000))
        );
        assert_eq!(
            policy.decide(FaultKind::TransientServer, 1),
            RetryDecision::RetryAfter(Duration::from_millis(4000))
        );
    }

    #[test]
    fn transient_faults_stop_after_max_retries() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(FaultKind::TransientServer, 2),
            RetryDecision::GiveUp
        );
    }

    #[test]
    fn other_kinds_never_retry() {
        let policy = RetryPolicy::default();
        for kind in [
            FaultKind::Configuration,
            FaultKind::RateLimited,
            FaultKind::MalformedResponse,
            FaultKind::Unknown,
        ] {
            assert_eq!(policy.decide(kind, 0), RetryDecision::GiveUp, "{kind:?}");
        }
    }

    #[test]
    fn zero_retries_disables_retrying() {
        let policy = RetryPolicy {
            max_retries: 0,
            base_delay: Duration::from_millis(10),
        };
        assert_eq!(
            policy.decide(FaultKind::TransientServer, 0),
            RetryDecision::GiveUp
        );
    }
}
