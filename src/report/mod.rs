pub mod assembler;
pub mod client;
pub mod command;
pub mod error;
mod print;
pub mod window;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use self::{
    assembler::{
        ActivityReport, HistoricalReport, QueryFailure, QueryKind, ReportAssembler, ReportOptions,
    },
    client::{ApiClient, ReportQuery},
    error::{Error, ErrorKind, Result},
    print::{HistoricalView, ReportView},
    window::ActivityWindow,
};

/// Upper bound of the synchronous trace query lookback, in days.
pub const MAX_SHORT_WINDOW_DAYS: u32 = 10;

/// Lookback used when none is given. One day under the server bound
/// so that a query issued around midnight is still accepted.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 9;

/// Upper bound of the historical search span and lookback, in days.
pub const MAX_LONG_WINDOW_DAYS: u32 = 90;

/// Page size requested from the trace endpoint.
pub const TRACE_PAGE_SIZE: usize = 5000;

/// Maximum amount of pages fetched for one trace query.
pub const MAX_TRACE_PAGES: u32 = 10;

/// Which side of the conversation the list is on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Messages addressed to the list.
    Received,
    /// Messages sent by the list.
    Sent,
}

impl Direction {
    /// Name of the trace query parameter used to filter this direction.
    pub fn query_param(&self) -> &'static str {
        match self {
            Self::Received => "recipientAddress",
            Self::Sent => "senderAddress",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Received => write!(f, "received"),
            Self::Sent => write!(f, "sent"),
        }
    }
}

/// Delivery outcome of a message as reported by the mail service.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum DeliveryStatus {
    Delivered,
    Failed,
    Pending,
    Expanded,
    Quarantined,
    FilteredAsSpam,
    GettingStatus,
    Resolved,
    Unknown(String),
}

impl DeliveryStatus {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl From<String> for DeliveryStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            s if s.eq_ignore_ascii_case("delivered") => Self::Delivered,
            s if s.eq_ignore_ascii_case("failed") => Self::Failed,
            s if s.eq_ignore_ascii_case("pending") => Self::Pending,
            s if s.eq_ignore_ascii_case("expanded") => Self::Expanded,
            s if s.eq_ignore_ascii_case("quarantined") => Self::Quarantined,
            s if s.eq_ignore_ascii_case("filteredasspam") => Self::FilteredAsSpam,
            s if s.eq_ignore_ascii_case("gettingstatus") => Self::GettingStatus,
            s if s.eq_ignore_ascii_case("resolved") => Self::Resolved,
            _ => Self::Unknown(status),
        }
    }
}

impl From<DeliveryStatus> for String {
    fn from(status: DeliveryStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let status = match self {
            Self::Delivered => "Delivered",
            Self::Failed => "Failed",
            Self::Pending => "Pending",
            Self::Expanded => "Expanded",
            Self::Quarantined => "Quarantined",
            Self::FilteredAsSpam => "FilteredAsSpam",
            Self::GettingStatus => "GettingStatus",
            Self::Resolved => "Resolved",
            Self::Unknown(status) => status,
        };
        write!(f, "{status}")
    }
}

/// One message observed by the trace query.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceRecord {
    /// When the mail system observed the message.
    #[serde(alias = "received")]
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "senderAddress")]
    pub sender: String,
    #[serde(alias = "recipientAddress")]
    pub recipient: String,
    #[serde(default)]
    pub subject: String,
    #[serde(alias = "status")]
    pub delivery_status: DeliveryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delivery_status() {
        assert_eq!(
            DeliveryStatus::Delivered,
            DeliveryStatus::from(String::from("Delivered"))
        );
        assert_eq!(
            DeliveryStatus::FilteredAsSpam,
            DeliveryStatus::from(String::from("FilteredAsSpam"))
        );
        assert_eq!(
            DeliveryStatus::Unknown(String::from("Deferred")),
            DeliveryStatus::from(String::from("Deferred"))
        );
    }

    #[test]
    fn deserialize_trace_record() {
        let record: TraceRecord = serde_json::from_str(
            r#"{
                "received": "2024-03-01T10:00:00Z",
                "senderAddress": "alice@localhost",
                "recipientAddress": "team@localhost",
                "subject": "Hello",
                "status": "Failed",
                "messageId": "<1@localhost>"
            }"#,
        )
        .unwrap();

        assert_eq!("alice@localhost", record.sender);
        assert_eq!("team@localhost", record.recipient);
        assert_eq!(DeliveryStatus::Failed, record.delivery_status);
        assert_eq!(Some("<1@localhost>"), record.message_id.as_deref());
        assert_eq!(None, record.size);
    }
}
