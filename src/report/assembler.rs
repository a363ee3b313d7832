//! Report assembler module.
//!
//! Orchestrates the directory lookup, both trace queries and the
//! optional historical search into one [`ActivityReport`]. Every query
//! is isolated: one failing is recorded next to the others' results
//! instead of aborting the run.

use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;
use std::{fmt, time::Duration};
use tokio_util::sync::CancellationToken;

use crate::{
    activity::{summarize, ActivitySummary},
    job::{
        HistoricalJob, JobStatus, PollOutcome, Poller, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL,
    },
    recipient::{DirectoryQuery, MembersPage, Recipient, DEFAULT_MEMBERS_PAGE_SIZE},
    report::DEFAULT_LOOKBACK_DAYS,
};

use super::{ActivityWindow, Direction, Error, ErrorKind, ReportQuery, Result, TraceRecord};

/// What a run should do, decided before the assembler is called.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReportOptions {
    pub days_back: u32,
    pub perform_historical_search: bool,
    pub show_members: bool,
    pub members_page_size: usize,
    pub report_title: Option<String>,
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            days_back: DEFAULT_LOOKBACK_DAYS,
            perform_historical_search: false,
            show_members: false,
            members_page_size: DEFAULT_MEMBERS_PAGE_SIZE,
            report_title: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

/// The query a failure comes from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryKind {
    Received,
    Sent,
    Members,
    HistoricalSubmit,
    HistoricalPoll,
    HistoricalResult,
}

impl From<Direction> for QueryKind {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Received => Self::Received,
            Direction::Sent => Self::Sent,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let query = match self {
            Self::Received => "received messages",
            Self::Sent => "sent messages",
            Self::Members => "members",
            Self::HistoricalSubmit => "historical search submission",
            Self::HistoricalPoll => "historical search status",
            Self::HistoricalResult => "historical search result",
        };
        write!(f, "{query}")
    }
}

/// A query that failed, with the original cause.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct QueryFailure {
    pub query: QueryKind,
    pub kind: ErrorKind,
    pub message: String,
}

impl QueryFailure {
    pub fn new(query: QueryKind, err: &Error) -> Self {
        Self {
            query,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "cannot get {}: {}", self.query, self.message)
    }
}

/// Result of the historical search step.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HistoricalReport {
    pub window: ActivityWindow,
    /// Submitted search whose polling failed, kept so that it can be
    /// resumed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<HistoricalJob>,
    /// Last poll outcome, absent when the submission or a poll failed.
    pub outcome: Option<PollOutcome>,
    pub result_location: Option<String>,
    pub failure: Option<QueryFailure>,
}

impl HistoricalReport {
    pub fn job(&self) -> Option<&HistoricalJob> {
        self.outcome
            .as_ref()
            .map(PollOutcome::job)
            .or(self.job.as_ref())
    }
}

/// Everything gathered about one mailing list or group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ActivityReport {
    pub recipient: Recipient,
    pub window: ActivityWindow,
    pub summary: ActivitySummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<MembersPage>,
    pub failures: Vec<QueryFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical: Option<HistoricalReport>,
}

type PollHandler<'a> = Box<dyn Fn(&HistoricalJob) + Send + Sync + 'a>;

pub struct ReportAssembler<'a, C: ReportQuery + DirectoryQuery + ?Sized> {
    client: &'a C,
    poll_handler: Option<PollHandler<'a>>,
}

impl<'a, C: ReportQuery + DirectoryQuery + ?Sized> ReportAssembler<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            poll_handler: None,
        }
    }

    /// Registers a callback invoked after every historical search poll.
    pub fn with_poll_handler(mut self, handler: impl Fn(&HistoricalJob) + Send + Sync + 'a) -> Self {
        self.poll_handler = Some(Box::new(handler));
        self
    }

    /// Resolves the address, then gathers the recent activity and,
    /// when opted in, the historical search.
    pub async fn assemble(
        &self,
        address: &str,
        opts: &ReportOptions,
        cancel: &CancellationToken,
    ) -> Result<ActivityReport> {
        let mut report = self.assemble_recent(address, opts).await?;

        if opts.perform_historical_search {
            report.historical = Some(self.search_history(address, opts, cancel).await);
        }

        Ok(report)
    }

    /// Gathers the short window activity.
    ///
    /// Only an invalid lookback, a failed address resolution or a
    /// rejected session is returned as an error, every other failure is
    /// recorded in the report.
    pub async fn assemble_recent(
        &self,
        address: &str,
        opts: &ReportOptions,
    ) -> Result<ActivityReport> {
        let window = ActivityWindow::short(opts.days_back, Utc::now())?;

        let recipient = self.client.resolve_recipient(address).await?;
        info!("checking activity of {} {address}", recipient.kind);

        let mut failures = Vec::new();

        let received = self
            .query_direction(address, Direction::Received, opts.days_back, &mut failures)
            .await?;
        let sent = self
            .query_direction(address, Direction::Sent, opts.days_back, &mut failures)
            .await?;
        let summary = summarize(received, sent);
        debug!(
            "{} received, {} sent, {} failed",
            summary.received_count,
            summary.sent_count,
            summary.failed_records.len()
        );

        let members = if opts.show_members {
            match self
                .client
                .list_members(address, 1, opts.members_page_size)
                .await
            {
                Ok(page) => Some(page),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!("cannot list members of {address}: {err}");
                    failures.push(QueryFailure::new(QueryKind::Members, &err));
                    None
                }
            }
        } else {
            None
        };

        Ok(ActivityReport {
            recipient,
            window,
            summary,
            members,
            failures,
            historical: None,
        })
    }

    async fn query_direction(
        &self,
        address: &str,
        direction: Direction,
        days_back: u32,
        failures: &mut Vec<QueryFailure>,
    ) -> Result<Vec<TraceRecord>> {
        match self
            .client
            .query_short_window(address, direction, days_back)
            .await
        {
            Ok(records) => Ok(records),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                warn!("cannot query {direction} messages of {address}: {err}");
                failures.push(QueryFailure::new(direction.into(), &err));
                Ok(Vec::new())
            }
        }
    }

    /// Submits a historical search over the widest window that does
    /// not overlap the short one, then waits for it.
    ///
    /// Never fails: submission, poll and result errors are kept in the
    /// returned report.
    pub async fn search_history(
        &self,
        address: &str,
        opts: &ReportOptions,
        cancel: &CancellationToken,
    ) -> HistoricalReport {
        let window = ActivityWindow::historical(Utc::now());
        let title = opts
            .report_title
            .clone()
            .unwrap_or_else(|| default_title(address));

        let mut report = HistoricalReport {
            window,
            job: None,
            outcome: None,
            result_location: None,
            failure: None,
        };

        let job = match self
            .client
            .submit_long_window_job(address, &title, window.start, window.end)
            .await
        {
            Ok(job) => job,
            Err(err) => {
                warn!("cannot submit historical search for {address}: {err}");
                report.failure = Some(QueryFailure::new(QueryKind::HistoricalSubmit, &err));
                return report;
            }
        };
        info!("submitted historical search {} for {address}", job.job_id);

        let outcome = match self.await_job(job.clone(), opts, cancel).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("cannot poll historical search {}: {err}", job.job_id);
                report.job = Some(job);
                report.failure = Some(QueryFailure::new(QueryKind::HistoricalPoll, &err));
                return report;
            }
        };

        if outcome.job().status == JobStatus::Done {
            match self
                .client
                .fetch_job_result_location(&outcome.job().job_id)
                .await
            {
                Ok(location) => report.result_location = location,
                Err(err) => {
                    report.failure = Some(QueryFailure::new(QueryKind::HistoricalResult, &err))
                }
            }
        }

        report.outcome = Some(outcome);
        report
    }

    /// Polls an existing historical search, for instance one that
    /// timed out during a previous run.
    pub async fn await_job(
        &self,
        job: HistoricalJob,
        opts: &ReportOptions,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome> {
        let poller = Poller::new(self.client)
            .with_interval(opts.poll_interval)
            .with_max_wait(opts.max_wait);

        let poller = match &self.poll_handler {
            Some(handler) => poller.with_handler(move |job| handler(job)),
            None => poller,
        };

        poller.await_completion(job, cancel).await
    }
}

fn default_title(address: &str) -> String {
    format!(
        "{} {address} {}",
        env!("CARGO_PKG_NAME"),
        Utc::now().format("%Y-%m-%d")
    )
}
