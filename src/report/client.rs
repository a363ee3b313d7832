//! Report query client module.
//!
//! This module wraps the read operations of the reporting API: the
//! synchronous trace query, the asynchronous historical search and
//! the directory lookups.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, trace, warn};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    job::{HistoricalJob, JobStatus},
    recipient::{DirectoryQuery, Member, MembersPage, Recipient},
    session::AccountSession,
};

use super::{
    ActivityWindow, Direction, Error, Result, TraceRecord, MAX_TRACE_PAGES, TRACE_PAGE_SIZE,
};

/// Read operations of the reporting API.
#[async_trait]
pub trait ReportQuery: Send + Sync {
    /// Lists the messages received by or sent from the given address
    /// during the last `days_back` days.
    async fn query_short_window(
        &self,
        address: &str,
        direction: Direction,
        days_back: u32,
    ) -> Result<Vec<TraceRecord>>;

    /// Submits a historical search. Does not wait for its completion.
    async fn submit_long_window_job(
        &self,
        address: &str,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HistoricalJob>;

    /// Reads the current state of a historical search.
    async fn poll_job_status(&self, job_id: &str) -> Result<HistoricalJob>;

    /// Returns where the report of a done historical search can be
    /// downloaded, or `None` when the search matched nothing.
    async fn fetch_job_result_location(&self, job_id: &str) -> Result<Option<String>> {
        let job = self.poll_job_status(job_id).await?;

        if job.status != JobStatus::Done {
            return Err(Error::JobNotDone(job_id.to_owned()));
        }

        Ok(job.result_location.filter(|_| job.rows != Some(0)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Paged<T> {
    value: Vec<T>,
    #[serde(default)]
    next_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoricalSearchRequest<'a> {
    report_title: &'a str,
    report_type: &'static str,
    recipient_address: &'a str,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notify_address: Option<&'a str>,
}

/// Reporting API client, borrowing a connected account session.
pub struct ApiClient<'a, S: AccountSession> {
    session: &'a S,
    notify_address: Option<String>,
}

impl<'a, S: AccountSession> ApiClient<'a, S> {
    pub fn new(session: &'a S) -> Self {
        Self {
            session,
            notify_address: None,
        }
    }

    /// Address notified by the mail service when a historical search
    /// completes.
    pub fn with_notify_address(mut self, address: Option<String>) -> Self {
        self.notify_address = address;
        self
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, target: &str) -> Result<T> {
        let res = req.send().await?;
        let res = check_status(res, target).await?;
        Ok(res.json().await?)
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Maps an error response to the matching [`Error`], keeping the
/// server's message verbatim.
async fn check_status(res: Response, target: &str) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    trace!("error response {status}: {body}");
    let (code, message) = match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(ApiErrorBody { error }) => (error.code, error.message),
        Err(_) => (String::new(), body),
    };

    Err(map_api_error(status, &code, message, target))
}

fn map_api_error(status: StatusCode, code: &str, message: String, target: &str) -> Error {
    let message = if message.trim().is_empty() {
        status.to_string()
    } else {
        message
    };

    match (status, code) {
        (_, "InsufficientLicense") | (StatusCode::PAYMENT_REQUIRED, _) => {
            Error::InsufficientLicense(message)
        }
        (_, "InvalidWindow" | "InvalidDateRange") => Error::InvalidWindow(message),
        (StatusCode::NOT_FOUND, _) => Error::NotFound(target.to_owned()),
        (StatusCode::UNAUTHORIZED, _) => Error::Unauthorized(message),
        (status, _) => Error::TransientQueryFailure(format!("{status}: {message}")),
    }
}

#[async_trait]
impl<S: AccountSession> ReportQuery for ApiClient<'_, S> {
    async fn query_short_window(
        &self,
        address: &str,
        direction: Direction,
        days_back: u32,
    ) -> Result<Vec<TraceRecord>> {
        let window = ActivityWindow::short(days_back, self.now())?;
        debug!("querying {direction} messages of {address} over {window}");

        let mut records = Vec::new();
        let mut page = 1;
        let mut fetched = 0;

        loop {
            let req = self
                .session
                .request(Method::GET, &["messageTrace"])?
                .query(&[
                    (direction.query_param(), address.to_owned()),
                    ("startDate", window.start.to_rfc3339()),
                    ("endDate", window.end.to_rfc3339()),
                    ("page", page.to_string()),
                    ("pageSize", TRACE_PAGE_SIZE.to_string()),
                ]);

            let paged: Paged<TraceRecord> = self.send(req, address).await?;
            fetched += 1;
            trace!("page {page}: {} record(s)", paged.value.len());
            records.extend(paged.value);

            match paged.next_page {
                None => break,
                Some(next) if next <= page => {
                    warn!("{direction} trace of {address} points back to page {next} after page {page}, stopping");
                    break;
                }
                Some(_) if fetched >= MAX_TRACE_PAGES => {
                    warn!(
                        "{direction} trace of {address} truncated to {} record(s)",
                        records.len()
                    );
                    break;
                }
                Some(next) => page = next,
            }
        }

        debug!("found {} {direction} message(s)", records.len());
        Ok(records)
    }

    async fn submit_long_window_job(
        &self,
        address: &str,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HistoricalJob> {
        let window = ActivityWindow::long(start, end, self.now())?;
        debug!("submitting historical search {title:?} for {address} over {window}");

        let body = HistoricalSearchRequest {
            report_title: title,
            report_type: "MessageTrace",
            recipient_address: address,
            start_date: window.start,
            end_date: window.end,
            notify_address: self.notify_address.as_deref(),
        };

        let req = self
            .session
            .request(Method::POST, &["historicalSearches"])?
            .json(&body);

        self.send(req, address).await
    }

    async fn poll_job_status(&self, job_id: &str) -> Result<HistoricalJob> {
        let req = self
            .session
            .request(Method::GET, &["historicalSearches", job_id])?;
        let job: HistoricalJob = self.send(req, job_id).await?;
        trace!("historical search {job_id} is {}", job.status);
        Ok(job)
    }
}

#[async_trait]
impl<S: AccountSession> DirectoryQuery for ApiClient<'_, S> {
    async fn resolve_recipient(&self, address: &str) -> Result<Recipient> {
        let req = self.session.request(Method::GET, &["recipients", address])?;
        self.send(req, address).await
    }

    async fn list_members(&self, address: &str, page: u32, page_size: usize) -> Result<MembersPage> {
        let req = self
            .session
            .request(Method::GET, &["recipients", address, "members"])?
            .query(&[("page", page.to_string()), ("pageSize", page_size.to_string())]);

        let paged: Paged<Member> = self.send(req, address).await?;

        Ok(MembersPage {
            members: paged.value,
            page,
            next_page: paged.next_page,
        })
    }
}
