//! Bounded retry for requests whose responses could not be handled
//!
//! The attempt count lives on each request's context, so one member's
//! failures never consume another member's retries.

use crate::config::RetryConfig;
use std::time::Duration;

/// Consecutive failed attempts of one request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryBudget {
    attempts: u32,
}

impl RetryBudget {
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Send the request again after `delay`, carrying `budget`
    Reissue { budget: RetryBudget, delay: Duration },
    /// Give up; the budget is reset
    Abandon { budget: RetryBudget },
}

/// Decides whether a failed request is reissued or abandoned
#[derive(Debug, Clone)]
pub struct RetryGovernor {
    delays: Vec<Duration>,
}

impl RetryGovernor {
    /// Creates a governor from a backoff schedule
    ///
    /// The schedule length is the number of reissues allowed.
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.backoff())
    }

    pub fn max_reissues(&self) -> usize {
        self.delays.len()
    }

    /// Escalates a failure
    ///
    /// # Arguments
    ///
    /// * `budget` - The budget carried by the request that just failed
    ///
    /// # Returns
    ///
    /// `Reissue` with the next delay while the schedule lasts, then
    /// `Abandon` with a zeroed budget.
    pub fn escalate(&self, budget: RetryBudget) -> RetryDecision {
        let attempt = budget.attempts + 1;
        match self.delays.get(budget.attempts as usize) {
            Some(delay) => RetryDecision::Reissue {
                budget: RetryBudget { attempts: attempt },
                delay: *delay,
            },
            None => RetryDecision::Abandon {
                budget: RetryBudget::default(),
            },
        }
    }
}

impl Default for RetryGovernor {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
