use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use list_activity::{
    job::{poller::PollState, HistoricalJob, JobStatus},
    recipient::{DirectoryQuery, Member, MembersPage, Recipient, RecipientKind},
    report::{
        DeliveryStatus, Direction, Error, ErrorKind, QueryKind, ReportAssembler, ReportOptions,
        ReportQuery, Result, TraceRecord,
    },
};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};
use tokio_util::sync::CancellationToken;

/// Canned answer of a fake endpoint.
#[derive(Clone)]
enum Reply<T> {
    Ok(T),
    Transient,
    License,
    NotFound,
    Unauthorized,
}

impl<T> Reply<T> {
    fn into_result(self, target: &str) -> Result<T> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Transient => Err(Error::TransientQueryFailure("503: service busy".into())),
            Self::License => Err(Error::InsufficientLicense(
                "Historical search requires a higher plan".into(),
            )),
            Self::NotFound => Err(Error::NotFound(target.to_owned())),
            Self::Unauthorized => Err(Error::Unauthorized("token expired".into())),
        }
    }
}

struct FakeApi {
    recipient: Reply<Recipient>,
    received: Reply<Vec<TraceRecord>>,
    sent: Reply<Vec<TraceRecord>>,
    members: Reply<MembersPage>,
    submit: Reply<HistoricalJob>,
    statuses: Vec<JobStatus>,
    poll: Reply<()>,
    result_location: Option<String>,
    trace_queries: AtomicUsize,
    polls: AtomicUsize,
    submitted: Mutex<Option<(String, DateTime<Utc>, DateTime<Utc>)>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            recipient: Reply::Ok(Recipient {
                address: "team@localhost".into(),
                display_name: "Team".into(),
                kind: RecipientKind::MailingList,
                member_count: Some(2),
            }),
            received: Reply::Ok(vec![]),
            sent: Reply::Ok(vec![]),
            members: Reply::Ok(MembersPage {
                members: vec![Member {
                    address: "alice@localhost".into(),
                    display_name: "Alice".into(),
                    kind: None,
                }],
                page: 1,
                next_page: None,
            }),
            submit: Reply::Ok(HistoricalJob::new("8d1f", JobStatus::Submitted)),
            statuses: vec![JobStatus::Done],
            poll: Reply::Ok(()),
            result_location: None,
            trace_queries: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            submitted: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ReportQuery for FakeApi {
    async fn query_short_window(
        &self,
        address: &str,
        direction: Direction,
        _days_back: u32,
    ) -> Result<Vec<TraceRecord>> {
        self.trace_queries.fetch_add(1, Ordering::SeqCst);
        match direction {
            Direction::Received => self.received.clone().into_result(address),
            Direction::Sent => self.sent.clone().into_result(address),
        }
    }

    async fn submit_long_window_job(
        &self,
        address: &str,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HistoricalJob> {
        *self.submitted.lock().unwrap() = Some((title.to_owned(), start, end));
        self.submit.clone().into_result(address)
    }

    async fn poll_job_status(&self, job_id: &str) -> Result<HistoricalJob> {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst);
        self.poll.clone().into_result(job_id)?;

        let status = self
            .statuses
            .get(poll)
            .or(self.statuses.last())
            .copied()
            .unwrap_or(JobStatus::InProgress);

        let mut job = HistoricalJob::new(job_id, status);
        if status == JobStatus::Done {
            job.result_location = self.result_location.clone();
        }
        Ok(job)
    }
}

#[async_trait]
impl DirectoryQuery for FakeApi {
    async fn resolve_recipient(&self, address: &str) -> Result<Recipient> {
        self.recipient.clone().into_result(address)
    }

    async fn list_members(
        &self,
        address: &str,
        _page: u32,
        _page_size: usize,
    ) -> Result<MembersPage> {
        self.members.clone().into_result(address)
    }
}

fn record(hours_ago: i64, sender: &str, status: DeliveryStatus) -> TraceRecord {
    TraceRecord {
        timestamp: Utc::now() - ChronoDuration::hours(hours_ago),
        sender: sender.into(),
        recipient: "team@localhost".into(),
        subject: String::new(),
        delivery_status: status,
        message_id: None,
        size: None,
    }
}

fn historical_opts() -> ReportOptions {
    ReportOptions {
        perform_historical_search: true,
        ..ReportOptions::default()
    }
}

#[tokio::test]
async fn received_failure_does_not_hide_sent() {
    let api = FakeApi {
        received: Reply::Transient,
        sent: Reply::Ok(vec![
            record(5, "team@localhost", DeliveryStatus::Delivered),
            record(2, "team@localhost", DeliveryStatus::Delivered),
        ]),
        ..FakeApi::default()
    };

    let report = ReportAssembler::new(&api)
        .assemble_recent("team@localhost", &ReportOptions::default())
        .await
        .unwrap();

    assert_eq!(2, api.trace_queries.load(Ordering::SeqCst));
    assert_eq!(0, report.summary.received_count);
    assert_eq!(2, report.summary.sent_count);
    assert_eq!(1, report.failures.len());
    assert_eq!(QueryKind::Received, report.failures[0].query);
    assert_eq!(ErrorKind::TransientQueryFailure, report.failures[0].kind);
    assert!(report.failures[0].message.contains("service busy"));
}

#[tokio::test]
async fn summary_of_received_records() {
    let api = FakeApi {
        received: Reply::Ok(vec![
            record(30, "a@localhost", DeliveryStatus::Delivered),
            record(20, "b@localhost", DeliveryStatus::Failed),
            record(10, "c@localhost", DeliveryStatus::Delivered),
        ]),
        ..FakeApi::default()
    };

    let report = ReportAssembler::new(&api)
        .assemble_recent("team@localhost", &ReportOptions::default())
        .await
        .unwrap();

    let summary = &report.summary;
    assert_eq!(3, summary.received_count);
    assert_eq!(
        Some("c@localhost"),
        summary.latest_received.as_ref().map(|r| r.sender.as_str())
    );
    assert_eq!(1, summary.failed_records.len());
    assert_eq!("b@localhost", summary.failed_records[0].sender);
    assert_eq!(9, report.window.days());
    assert!(report.failures.is_empty());
    assert!(report.historical.is_none());
}

#[tokio::test]
async fn unknown_address_ends_the_run() {
    let api = FakeApi {
        recipient: Reply::NotFound,
        ..FakeApi::default()
    };

    let err = ReportAssembler::new(&api)
        .assemble(
            "ghost@localhost",
            &historical_opts(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(address) if address == "ghost@localhost"));
    assert_eq!(0, api.trace_queries.load(Ordering::SeqCst));
    assert!(api.submitted.lock().unwrap().is_none());
}

#[tokio::test]
async fn rejected_credentials_abort_the_run() {
    let api = FakeApi {
        received: Reply::Unauthorized,
        ..FakeApi::default()
    };

    let err = ReportAssembler::new(&api)
        .assemble_recent("team@localhost", &ReportOptions::default())
        .await
        .unwrap_err();

    assert_eq!(ErrorKind::Unauthorized, err.kind());
}

#[tokio::test]
async fn invalid_lookback_is_rejected_before_any_query() {
    let api = FakeApi::default();
    let opts = ReportOptions {
        days_back: 11,
        ..ReportOptions::default()
    };

    let err = ReportAssembler::new(&api)
        .assemble_recent("team@localhost", &opts)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidWindow(_)));
    assert_eq!(0, api.trace_queries.load(Ordering::SeqCst));
}

#[tokio::test]
async fn members_failure_is_recorded() {
    let api = FakeApi {
        members: Reply::Transient,
        ..FakeApi::default()
    };
    let opts = ReportOptions {
        show_members: true,
        ..ReportOptions::default()
    };

    let report = ReportAssembler::new(&api)
        .assemble_recent("team@localhost", &opts)
        .await
        .unwrap();

    assert!(report.members.is_none());
    assert_eq!(QueryKind::Members, report.failures[0].query);
}

#[tokio::test]
async fn members_are_listed_on_demand() {
    let api = FakeApi::default();

    let report = ReportAssembler::new(&api)
        .assemble_recent("team@localhost", &ReportOptions::default())
        .await
        .unwrap();
    assert!(report.members.is_none());

    let opts = ReportOptions {
        show_members: true,
        ..ReportOptions::default()
    };
    let report = ReportAssembler::new(&api)
        .assemble_recent("team@localhost", &opts)
        .await
        .unwrap();
    assert_eq!(1, report.members.unwrap().members.len());
}

#[tokio::test]
async fn license_failure_is_kept_distinct() {
    let api = FakeApi {
        received: Reply::Ok(vec![record(1, "a@localhost", DeliveryStatus::Delivered)]),
        submit: Reply::License,
        ..FakeApi::default()
    };

    let report = ReportAssembler::new(&api)
        .assemble(
            "team@localhost",
            &historical_opts(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(1, report.summary.received_count);
    assert!(report.failures.is_empty());

    let historical = report.historical.unwrap();
    let failure = historical.failure.unwrap();
    assert_eq!(QueryKind::HistoricalSubmit, failure.query);
    assert_eq!(ErrorKind::InsufficientLicense, failure.kind);
    assert!(failure.message.contains("higher plan"));
    assert!(historical.outcome.is_none());
    assert_eq!(0, api.polls.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn historical_search_done_with_location() {
    use JobStatus::*;

    let api = FakeApi {
        statuses: vec![InProgress, InProgress, InProgress, Done],
        result_location: Some("https://reports.localhost/8d1f.csv".into()),
        ..FakeApi::default()
    };
    let opts = ReportOptions {
        report_title: Some("audit team@localhost".into()),
        ..historical_opts()
    };

    let report = ReportAssembler::new(&api)
        .assemble("team@localhost", &opts, &CancellationToken::new())
        .await
        .unwrap();

    let historical = report.historical.unwrap();
    let outcome = historical.outcome.as_ref().unwrap();
    assert_eq!(PollState::Finished, outcome.state);
    assert_eq!(Done, outcome.job().status);
    // four polls plus the one reading the result
    assert_eq!(5, api.polls.load(Ordering::SeqCst));
    assert_eq!(4, outcome.polls());
    assert_eq!(Duration::from_secs(30), outcome.elapsed());
    assert_eq!(
        Some("https://reports.localhost/8d1f.csv"),
        historical.result_location.as_deref()
    );
    assert!(historical.failure.is_none());

    let (title, start, end) = api.submitted.lock().unwrap().clone().unwrap();
    assert_eq!("audit team@localhost", title);
    assert_eq!(80, (end - start).num_days());
    assert!(end <= report.window.start);
}

#[tokio::test(start_paused = true)]
async fn historical_search_timeout_keeps_job_id() {
    let api = FakeApi {
        statuses: vec![JobStatus::InProgress],
        ..FakeApi::default()
    };
    let opts = ReportOptions {
        poll_interval: Duration::from_secs(10),
        max_wait: Duration::from_secs(30),
        ..historical_opts()
    };

    let historical = ReportAssembler::new(&api)
        .search_history("team@localhost", &opts, &CancellationToken::new())
        .await;

    let outcome = historical.outcome.as_ref().unwrap();
    assert!(outcome.is_timeout());
    assert_eq!("8d1f", outcome.job().job_id);
    assert_eq!(4, outcome.polls());
    assert!(outcome.elapsed() <= opts.max_wait);
    assert!(historical.result_location.is_none());
    assert!(historical.failure.is_none());
}

#[tokio::test(start_paused = true)]
async fn historical_search_reports_every_poll() {
    use JobStatus::*;

    let api = FakeApi {
        statuses: vec![Submitted, InProgress, Done],
        ..FakeApi::default()
    };
    let seen = Mutex::new(Vec::new());

    let historical = ReportAssembler::new(&api)
        .with_poll_handler(|job| seen.lock().unwrap().push(job.status))
        .search_history("team@localhost", &historical_opts(), &CancellationToken::new())
        .await;

    assert_eq!(vec![Submitted, InProgress, Done], *seen.lock().unwrap());
    assert!(historical.result_location.is_none());
}

#[tokio::test(start_paused = true)]
async fn cancelled_search_returns_last_state() {
    let api = FakeApi {
        statuses: vec![JobStatus::InProgress],
        ..FakeApi::default()
    };
    let cancel = CancellationToken::new();
    cancel.cancel();

    let historical = ReportAssembler::new(&api)
        .search_history("team@localhost", &historical_opts(), &cancel)
        .await;

    let outcome = historical.outcome.unwrap();
    assert_eq!(PollState::Cancelled, outcome.state);
    assert_eq!(0, outcome.polls());
    assert_eq!(JobStatus::Submitted, outcome.job().status);
}

#[tokio::test(start_paused = true)]
async fn failed_poll_keeps_submitted_job() {
    let api = FakeApi {
        submit: Reply::Ok(HistoricalJob::new("JOB-42", JobStatus::Submitted)),
        poll: Reply::Transient,
        ..FakeApi::default()
    };

    let historical = ReportAssembler::new(&api)
        .search_history("team@localhost", &historical_opts(), &CancellationToken::new())
        .await;

    assert_eq!(1, api.polls.load(Ordering::SeqCst));
    assert!(historical.outcome.is_none());
    assert_eq!(Some("JOB-42"), historical.job().map(|job| job.job_id.as_str()));

    let failure = historical.failure.as_ref().unwrap();
    assert_eq!(QueryKind::HistoricalPoll, failure.query);
    assert_eq!(ErrorKind::TransientQueryFailure, failure.kind);

    let json = serde_json::to_value(&historical).unwrap();
    assert_eq!("JOB-42", json["job"]["jobId"]);
}
