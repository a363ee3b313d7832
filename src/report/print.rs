use anyhow::Result;
use serde::Serialize;
use termcolor::{Color, ColorSpec};

use crate::{
    activity::FailedRecords,
    job::{poller::PollState, JobStatus},
    printer::{Print, PrintTable, PrintTableOpts, WriteColor},
    report::TraceRecord,
};

use super::{ActivityReport, HistoricalReport, QueryFailure};

/// Plain rendering of an [`ActivityReport`].
///
/// Serializes as the bare report.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ReportView<'a> {
    report: &'a ActivityReport,
    #[serde(skip)]
    failed_display_limit: usize,
    #[serde(skip)]
    table_opts: PrintTableOpts,
}

impl<'a> ReportView<'a> {
    pub fn new(
        report: &'a ActivityReport,
        failed_display_limit: usize,
        table_opts: PrintTableOpts,
    ) -> Self {
        Self {
            report,
            failed_display_limit,
            table_opts,
        }
    }
}

/// Plain rendering of a [`HistoricalReport`].
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct HistoricalView<'a> {
    report: &'a HistoricalReport,
}

impl<'a> HistoricalView<'a> {
    pub fn new(report: &'a HistoricalReport) -> Self {
        Self { report }
    }
}

fn colored(writer: &mut dyn WriteColor, color: Color, bold: bool, text: &str) -> Result<()> {
    writer.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold))?;
    write!(writer, "{text}")?;
    writer.reset()?;
    Ok(())
}

fn print_latest(
    writer: &mut dyn WriteColor,
    label: &str,
    count: usize,
    latest: Option<&TraceRecord>,
) -> Result<()> {
    write!(writer, "{label:<10}{count} message(s)")?;

    if let Some(record) = latest {
        write!(writer, ", latest on ")?;
        colored(
            writer,
            Color::Yellow,
            false,
            &record.timestamp.format("%Y-%m-%d %H:%M").to_string(),
        )?;
        write!(writer, " from ")?;
        colored(writer, Color::Blue, false, &record.sender)?;
        if !record.subject.is_empty() {
            write!(writer, " ({:?})", record.subject)?;
        }
    }

    writeln!(writer)?;
    Ok(())
}

fn print_failure(writer: &mut dyn WriteColor, failure: &QueryFailure) -> Result<()> {
    colored(writer, Color::Red, true, "error:")?;
    writeln!(writer, " {failure}")?;
    Ok(())
}

fn print_resume_hint(writer: &mut dyn WriteColor, job_id: &str) -> Result<()> {
    writeln!(
        writer,
        "Resume with: {} job {job_id} --wait",
        env!("CARGO_PKG_NAME")
    )?;
    Ok(())
}

impl Print for ReportView<'_> {
    fn print(&self, writer: &mut dyn WriteColor) -> Result<()> {
        let report = self.report;
        let recipient = &report.recipient;
        let summary = &report.summary;

        colored(writer, Color::White, true, &recipient.kind.to_string())?;
        write!(writer, " ")?;
        if recipient.display_name.is_empty() {
            colored(writer, Color::Blue, true, &recipient.address)?;
        } else {
            write!(writer, "{} ", recipient.display_name)?;
            colored(writer, Color::Blue, true, &format!("<{}>", recipient.address))?;
        }
        if let Some(count) = recipient.member_count {
            write!(writer, " ({count} member(s))")?;
        }
        writeln!(writer)?;
        writeln!(
            writer,
            "Window    {} ({} days)",
            report.window,
            report.window.days()
        )?;
        writeln!(writer)?;

        print_latest(
            writer,
            "Received",
            summary.received_count,
            summary.latest_received.as_ref(),
        )?;
        print_latest(
            writer,
            "Sent",
            summary.sent_count,
            summary.latest_sent.as_ref(),
        )?;

        if summary.is_dormant() && report.failures.is_empty() {
            writeln!(writer)?;
            colored(
                writer,
                Color::Yellow,
                true,
                &format!(
                    "No activity during the last {} days.",
                    report.window.days()
                ),
            )?;
            writeln!(writer)?;
        }

        let (records, hidden) = summary.failed_records_shown(self.failed_display_limit);
        if !records.is_empty() {
            writeln!(writer)?;
            writeln!(
                writer,
                "Undelivered messages ({}):",
                summary.failed_records.len()
            )?;
            FailedRecords { records, hidden }.print_table(writer, self.table_opts)?;
        }

        if let Some(members) = &report.members {
            members.print_table(writer, self.table_opts)?;
        }

        if !report.failures.is_empty() {
            writeln!(writer)?;
            for failure in &report.failures {
                print_failure(writer, failure)?;
            }
        }

        if let Some(historical) = &report.historical {
            writeln!(writer)?;
            HistoricalView::new(historical).print(writer)?;
        }

        Ok(writer.reset()?)
    }
}

impl Print for HistoricalView<'_> {
    fn print(&self, writer: &mut dyn WriteColor) -> Result<()> {
        let report = self.report;

        writeln!(
            writer,
            "Historical search {} ({} days)",
            report.window,
            report.window.days()
        )?;

        if let Some(outcome) = &report.outcome {
            let job = outcome.job();

            match (outcome.state, job.status) {
                (PollState::Finished, JobStatus::Done) => {
                    colored(writer, Color::Green, true, "done")?;
                    writeln!(writer, " after {}s", outcome.elapsed().as_secs())?;
                    match &report.result_location {
                        Some(location) => writeln!(writer, "Report    {location}")?,
                        None => writeln!(writer, "No message found during the historical window.")?,
                    }
                }
                (PollState::Finished, _) => {
                    colored(writer, Color::Red, true, "failed")?;
                    match &job.error {
                        Some(err) => writeln!(writer, ": {err}")?,
                        None => writeln!(writer)?,
                    }
                }
                (state, status) => {
                    let reason = match state {
                        PollState::Cancelled => "cancelled",
                        _ => "timed out",
                    };
                    colored(writer, Color::Yellow, true, &format!("{status}"))?;
                    writeln!(
                        writer,
                        ", {reason} after {}s",
                        outcome.elapsed().as_secs()
                    )?;
                    print_resume_hint(writer, &job.job_id)?;
                }
            }
        }

        if let Some(failure) = &report.failure {
            print_failure(writer, failure)?;
        }

        // polling failed after the submission
        if let (None, Some(job)) = (&report.outcome, report.job()) {
            print_resume_hint(writer, &job.job_id)?;
        }

        Ok(writer.reset()?)
    }
}
