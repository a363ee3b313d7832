//! Activity module.
//!
//! Derives a summary out of the raw trace records of both directions.
//! The computation is pure: no truncation, no formatting.

use serde::Serialize;

use crate::{
    printer::{PrintTable, PrintTableOpts, WriteColor},
    report::TraceRecord,
    ui::table::{Cell, Row, Table},
};

/// Failed records shown when no limit is configured.
pub const DEFAULT_FAILED_DISPLAY_LIMIT: usize = 10;

/// Activity derived from the trace records of one run.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ActivitySummary {
    pub latest_received: Option<TraceRecord>,
    pub latest_sent: Option<TraceRecord>,
    pub received_count: usize,
    pub sent_count: usize,
    /// Received records not delivered, most recent first.
    pub failed_records: Vec<TraceRecord>,
}

impl ActivitySummary {
    /// Whether nothing was received nor sent during the window.
    pub fn is_dormant(&self) -> bool {
        self.received_count == 0 && self.sent_count == 0
    }

    /// The failed records to display, and how many were left out.
    pub fn failed_records_shown(&self, limit: usize) -> (&[TraceRecord], usize) {
        let shown = self.failed_records.len().min(limit);
        (
            &self.failed_records[..shown],
            self.failed_records.len() - shown,
        )
    }
}

/// Sorts records by timestamp, most recent first. Records sharing a
/// timestamp keep their input order.
fn sort_latest_first(records: &mut [TraceRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

pub fn summarize(mut received: Vec<TraceRecord>, mut sent: Vec<TraceRecord>) -> ActivitySummary {
    sort_latest_first(&mut received);
    sort_latest_first(&mut sent);

    let failed_records = received
        .iter()
        .filter(|record| !record.delivery_status.is_delivered())
        .cloned()
        .collect();

    ActivitySummary {
        latest_received: received.first().cloned(),
        latest_sent: sent.first().cloned(),
        received_count: received.len(),
        sent_count: sent.len(),
        failed_records,
    }
}

/// Failed deliveries printed as a table.
#[derive(Debug, Serialize)]
pub struct FailedRecords<'a> {
    pub records: &'a [TraceRecord],
    pub hidden: usize,
}

impl Table for TraceRecord {
    fn head() -> Row {
        Row::new()
            .cell(Cell::new("DATE").bold().underline().white())
            .cell(Cell::new("SENDER").bold().underline().white())
            .cell(Cell::new("SUBJECT").shrinkable().bold().underline().white())
            .cell(Cell::new("STATUS").bold().underline().white())
    }

    fn row(&self) -> Row {
        let status = Cell::new(self.delivery_status.to_string());
        let status = if self.delivery_status.is_delivered() {
            status.green()
        } else {
            status.red()
        };

        Row::new()
            .cell(Cell::new(self.timestamp.format("%Y-%m-%d %H:%M").to_string()).yellow())
            .cell(Cell::new(&self.sender).blue())
            .cell(Cell::new(&self.subject).shrinkable())
            .cell(status)
    }
}

impl PrintTable for FailedRecords<'_> {
    fn print_table(&self, writer: &mut dyn WriteColor, opts: PrintTableOpts) -> anyhow::Result<()> {
        Table::print(writer, self.records, opts)?;
        if self.hidden > 0 {
            writeln!(writer, "… and {} more", self.hidden)?;
        }
        Ok(())
    }
}
