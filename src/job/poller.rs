//! Historical search poller module.
//!
//! Drives a submitted historical search to a terminal state, polling
//! on a fixed cadence within a wait budget. Waiting never blocks the
//! runtime and can be interrupted with a cancellation token.

use log::{debug, trace};
use serde::Serialize;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::report::{ReportQuery, Result};

use super::{HistoricalJob, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL};

/// Why the poller stopped.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PollState {
    /// The server reported a terminal status.
    Finished,
    /// The wait budget ran out while the search was still running.
    TimedOut,
    /// The caller asked to stop waiting.
    Cancelled,
}

/// Last observed state of a historical search, and how it was reached.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollOutcome {
    pub job: HistoricalJob,
    pub state: PollState,
    pub polls: u32,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl PollOutcome {
    pub fn job(&self) -> &HistoricalJob {
        &self.job
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Whether the search may still complete and can be resumed with
    /// its job id.
    pub fn is_timeout(&self) -> bool {
        self.state == PollState::TimedOut
    }
}

type PollHandler<'a> = Box<dyn Fn(&HistoricalJob) + Send + Sync + 'a>;

pub struct Poller<'a, Q: ReportQuery + ?Sized> {
    query: &'a Q,
    interval: Duration,
    max_wait: Duration,
    handler: Option<PollHandler<'a>>,
}

impl<'a, Q: ReportQuery + ?Sized> Poller<'a, Q> {
    pub fn new(query: &'a Q) -> Self {
        Self {
            query,
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
            handler: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Registers a callback invoked after every poll.
    pub fn with_handler(mut self, handler: impl Fn(&HistoricalJob) + Send + Sync + 'a) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Polls the given job until it reaches a terminal state, the wait
    /// budget is exhausted or the token is cancelled.
    ///
    /// The job is polled at least once unless the token is already
    /// cancelled. A poll that would start after the budget is never
    /// attempted.
    pub async fn await_completion(
        &self,
        mut job: HistoricalJob,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome> {
        let start = Instant::now();
        let mut polls: u32 = 0;

        let outcome = |job: HistoricalJob, state: PollState, polls: u32| PollOutcome {
            job,
            state,
            polls,
            elapsed: start.elapsed(),
        };

        loop {
            if cancel.is_cancelled() {
                debug!("stop polling {}: cancelled", job.job_id);
                return Ok(outcome(job, PollState::Cancelled, polls));
            }

            job = self.query.poll_job_status(&job.job_id).await?;
            polls += 1;
            trace!("poll #{polls}: {job}");

            if let Some(handler) = &self.handler {
                handler(&job);
            }

            if job.is_terminal() {
                debug!("{job} after {polls} poll(s)");
                return Ok(outcome(job, PollState::Finished, polls));
            }

            if start.elapsed() + self.interval > self.max_wait {
                debug!("stop polling {}: wait budget exhausted", job.job_id);
                return Ok(outcome(job, PollState::TimedOut, polls));
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("stop polling {}: cancelled", job.job_id);
                    return Ok(outcome(job, PollState::Cancelled, polls));
                }
                _ = sleep(self.interval) => (),
            }
        }
    }
}
