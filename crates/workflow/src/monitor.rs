//! Build-status polling.
//!
//! A build runs asynchronously on the service, so the workflow polls its
//! status until it reaches a terminal state. The status source and the
//! sleep are both traits so the loop can be driven without a network or a
//! real clock.

use std::time::Duration;

use async_trait::async_trait;
use reco_client::{BuildStatus, RecommendationClient};
use tracing::{debug, info, warn};

use crate::error::{Result, WorkflowError};

/// Default wait between two status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Anything that can report the status of a build
#[async_trait]
pub trait BuildStatusSource: Send + Sync {
    async fn build_status(&self, model_id: &str, build_id: &str) -> reco_client::Result<BuildStatus>;
}

#[async_trait]
impl BuildStatusSource for RecommendationClient {
    async fn build_status(&self, model_id: &str, build_id: &str) -> reco_client::Result<BuildStatus> {
        self.get_build_status(model_id, build_id).await
    }
}

/// Blocks the current task for a duration
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Polls a build until it succeeds, fails or is cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMonitor {
    interval: Duration,
    max_attempts: Option<u32>,
}

impl Default for BuildMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl BuildMonitor {
    /// Unbounded monitor checking every `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    /// Give up after `max_attempts` non-terminal answers
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Query the status until it is terminal and return it.
    ///
    /// Every non-terminal answer is reported to `on_status` together with
    /// the wait before the next check, then followed by exactly one sleep.
    /// The terminal answer is reported with `None` and not followed by a
    /// sleep. Errors from the source abort the loop unchanged.
    pub async fn wait_for_completion<S, Z, F>(
        &self,
        source: &S,
        sleeper: &Z,
        model_id: &str,
        build_id: &str,
        mut on_status: F,
    ) -> Result<BuildStatus>
    where
        S: BuildStatusSource + ?Sized,
        Z: Sleeper + ?Sized,
        F: FnMut(BuildStatus, Option<Duration>),
    {
        let mut attempts: u32 = 0;

        loop {
            let status = source.build_status(model_id, build_id).await?;
            attempts += 1;
            debug!("build {} status check #{}: {}", build_id, attempts, status);

            if status.is_terminal() {
                on_status(status, None);
                info!("build {} ended with status {} after {} checks", build_id, status, attempts);
                return Ok(status);
            }

            if self.max_attempts.is_some_and(|max| attempts >= max) {
                on_status(status, None);
                warn!("giving up on build {} after {} checks", build_id, attempts);
                return Err(WorkflowError::PollLimitReached {
                    build_id: build_id.to_string(),
                    attempts,
                    last_status: status,
                });
            }

            on_status(status, Some(self.interval));
            sleeper.sleep(self.interval).await;
        }
    }
}
