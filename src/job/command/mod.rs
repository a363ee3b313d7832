use anyhow::{Context, Result};
use clap::Parser;
use indicatif::ProgressBar;
use log::info;
use serde::Serialize;
use std::time::Duration;
use termcolor::{Color, ColorSpec};

use crate::{
    account::arg::name::AccountNameFlag,
    config::TomlConfig,
    job::{poller::PollState, HistoricalJob, JobStatus, PollOutcome},
    printer::{Print, Printer, WriteColor},
    report::{command::cancel_on_ctrl_c, ApiClient, ReportAssembler, ReportOptions, ReportQuery},
    session::{AccountSession, HttpSession},
};

/// Check a historical search.
///
/// This command reads the state of a historical search submitted by a
/// previous check, for instance one that did not complete in time. It
/// prints where its report can be downloaded once it is done.
#[derive(Debug, Parser)]
pub struct JobCommand {
    /// Identifier of the historical search.
    #[arg(value_name = "JOB_ID")]
    pub job_id: String,

    /// Wait for the search to complete instead of polling it once.
    #[arg(long, short = 'W')]
    pub wait: bool,

    #[command(flatten)]
    pub account: AccountNameFlag,
}

impl JobCommand {
    pub async fn execute(self, printer: &mut impl Printer, config: &TomlConfig) -> Result<()> {
        info!("executing job command");

        let account_config = config
            .clone()
            .into_account_config(self.account.name.as_deref())?;

        let mut session = HttpSession::new(&account_config)?;
        session
            .connect()
            .await
            .with_context(|| format!("cannot connect account {}", account_config.name))?;
        let client = ApiClient::new(&session);

        let outcome = if self.wait {
            let opts = ReportOptions {
                poll_interval: account_config.poll_interval,
                max_wait: account_config.max_wait,
                ..ReportOptions::default()
            };

            let progress = (!printer.is_json()).then(|| {
                let progress = ProgressBar::new_spinner();
                progress.enable_steady_tick(Duration::from_millis(100));
                progress
            });

            let mut assembler = ReportAssembler::new(&client);
            if let Some(progress) = progress.clone() {
                assembler =
                    assembler.with_poll_handler(move |job| progress.set_message(job.to_string()));
            }

            let job = HistoricalJob::new(&self.job_id, JobStatus::Submitted);
            let cancel = cancel_on_ctrl_c();
            let outcome = assembler.await_job(job, &opts, &cancel).await;

            if let Some(progress) = progress {
                progress.finish_and_clear();
            }

            outcome
        } else {
            client
                .poll_job_status(&self.job_id)
                .await
                .map(|job| PollOutcome {
                    state: if job.is_terminal() {
                        PollState::Finished
                    } else {
                        PollState::TimedOut
                    },
                    job,
                    polls: 1,
                    elapsed: Duration::ZERO,
                })
        };
        let outcome =
            outcome.with_context(|| format!("cannot get historical search {}", self.job_id))?;

        let result_location = if outcome.job().status == JobStatus::Done {
            client
                .fetch_job_result_location(&self.job_id)
                .await
                .with_context(|| format!("cannot get report of historical search {}", self.job_id))?
        } else {
            None
        };

        printer.print(JobReport {
            outcome,
            result_location,
            waited: self.wait,
        })
    }
}

/// State of a historical search checked on its own.
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobReport {
    #[serde(flatten)]
    pub outcome: PollOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_location: Option<String>,
    #[serde(skip)]
    pub waited: bool,
}

impl Print for JobReport {
    fn print(&self, writer: &mut dyn WriteColor) -> Result<()> {
        let job = self.outcome.job();

        write!(writer, "Historical search {}", job.job_id)?;
        if !job.title.is_empty() {
            write!(writer, " ({})", job.title)?;
        }
        write!(writer, ": ")?;

        let color = match job.status {
            JobStatus::Done => Color::Green,
            JobStatus::Failed => Color::Red,
            _ => Color::Yellow,
        };
        writer.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(writer, "{}", job.status)?;
        writer.reset()?;
        writeln!(writer)?;

        match job.status {
            JobStatus::Done => match &self.result_location {
                Some(location) => writeln!(writer, "Report    {location}")?,
                None => writeln!(writer, "No message found during the historical window.")?,
            },
            JobStatus::Failed => {
                if let Some(err) = &job.error {
                    writeln!(writer, "Reason    {err}")?;
                }
            }
            _ if self.outcome.state == PollState::Cancelled || self.waited => {
                writeln!(
                    writer,
                    "Still running after {}s, try again later.",
                    self.outcome.elapsed().as_secs()
                )?;
            }
            _ => {
                writeln!(
                    writer,
                    "Wait for it with: {} job {} --wait",
                    env!("CARGO_PKG_NAME"),
                    job.job_id
                )?;
            }
        }

        Ok(writer.reset()?)
    }
}
