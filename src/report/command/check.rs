use anyhow::{bail, Context, Result};
use clap::Parser;
use email_address::EmailAddress;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use once_cell::sync::Lazy;
use std::{
    io::{self, IsTerminal},
    str::FromStr,
    time::Duration,
};
use tokio_util::sync::CancellationToken;

use crate::{
    account::{arg::name::AccountNameFlag, AccountConfig},
    config::TomlConfig,
    printer::{PrintTableOpts, Printer},
    report::{
        ActivityReport, ApiClient, Error, HistoricalView, ReportAssembler, ReportOptions,
        ReportView, MAX_SHORT_WINDOW_DAYS,
    },
    session::{AccountSession, HttpSession},
    ui::{prompt, table::arg::max_width::TableMaxWidthFlag},
};

static SPINNER_STYLE: Lazy<ProgressStyle> = Lazy::new(|| {
    ProgressStyle::with_template(" {spinner:.dim} {msg:.dim} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
});

/// Check the activity of a mailing list or a group.
///
/// This command looks for the messages received by and sent from the
/// given address during the last days, then optionally starts a
/// historical search covering the last 90 days.
#[derive(Debug, Parser)]
pub struct CheckCommand {
    /// Address of the mailing list or group.
    ///
    /// If omitted, the address is asked interactively.
    #[arg(value_name = "ADDRESS", value_parser = address_parser)]
    pub address: Option<String>,

    /// Number of days to look back, up to 10.
    ///
    /// Defaults to the lookback-days of the account configuration.
    #[arg(long, short = 'd', value_name = "DAYS")]
    #[arg(value_parser = clap::value_parser!(u32).range(1..=MAX_SHORT_WINDOW_DAYS as i64))]
    pub days: Option<u32>,

    /// Start the historical search without asking.
    #[arg(long, conflicts_with = "no_historical")]
    pub historical: bool,

    /// Never start the historical search.
    #[arg(long)]
    pub no_historical: bool,

    /// Also list the first page of members.
    #[arg(long, short = 'm')]
    pub members: bool,

    #[command(flatten)]
    pub table: TableMaxWidthFlag,

    #[command(flatten)]
    pub account: AccountNameFlag,
}

impl CheckCommand {
    pub async fn execute(self, printer: &mut impl Printer, config: &TomlConfig) -> Result<()> {
        info!("executing check command");

        let account_config = config
            .clone()
            .into_account_config(self.account.name.as_deref())?;

        let address = match self.address.clone() {
            Some(address) => address,
            None if printer.is_json() || !io::stdin().is_terminal() => {
                bail!("missing address of the mailing list or group to check")
            }
            None => prompt::address()?,
        };

        let mut session = HttpSession::new(&account_config)?;
        session
            .connect()
            .await
            .with_context(|| format!("cannot connect account {}", account_config.name))?;

        let client =
            ApiClient::new(&session).with_notify_address(account_config.notify_address.clone());

        let opts = self.report_options(&account_config, &address);
        let assembler = ReportAssembler::new(&client);

        // JSON output never prompts, the whole report is gathered at once
        let report = if printer.is_json() {
            let cancel = if opts.perform_historical_search {
                cancel_on_ctrl_c()
            } else {
                CancellationToken::new()
            };
            assembler.assemble(&address, &opts, &cancel).await
        } else {
            assembler.assemble_recent(&address, &opts).await
        };

        let report = match report {
            Ok(report) => report,
            Err(Error::NotFound(address)) => {
                printer.print(format!("Cannot find mailing list or group {address}."))?;
                return Ok(());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("cannot check activity of {address}"))
            }
        };

        let table_opts = PrintTableOpts {
            max_width: self.table.max_width,
        };

        printer.print(ReportView::new(
            &report,
            account_config.failed_display_limit,
            table_opts,
        ))?;

        if printer.is_json() {
            return Ok(());
        }

        if !self.wants_historical_search(&report)? {
            debug!("skipping historical search of {address}");
            return Ok(());
        }

        let progress = ProgressBar::new_spinner()
            .with_style(SPINNER_STYLE.clone())
            .with_message("Submitting historical search…");
        progress.enable_steady_tick(Duration::from_millis(100));

        let assembler = assembler.with_poll_handler({
            let progress = progress.clone();
            move |job| progress.set_message(format!("Waiting, {job}…"))
        });

        let cancel = cancel_on_ctrl_c();
        let historical = assembler.search_history(&address, &opts, &cancel).await;
        progress.finish_and_clear();

        printer.print_log("")?;
        printer.print(HistoricalView::new(&historical))
    }

    fn report_options(&self, account_config: &AccountConfig, address: &str) -> ReportOptions {
        ReportOptions {
            days_back: self.days.unwrap_or(account_config.lookback_days),
            perform_historical_search: self.historical,
            show_members: self.members,
            members_page_size: account_config.members_page_size,
            report_title: account_config.report_title(address),
            poll_interval: account_config.poll_interval,
            max_wait: account_config.max_wait,
        }
    }

    fn wants_historical_search(&self, report: &ActivityReport) -> Result<bool> {
        if self.historical {
            return Ok(true);
        }

        if self.no_historical || !io::stdin().is_terminal() {
            return Ok(false);
        }

        prompt::historical_search(report.summary.is_dormant())
    }
}

/// Cancels the returned token on the first Ctrl-C.
pub(crate) fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("received Ctrl-C, cancelling historical search");
            token.cancel();
        }
    });

    cancel
}

fn address_parser(address: &str) -> Result<String, String> {
    let address = address.trim();
    EmailAddress::from_str(address)
        .map(|_| address.to_owned())
        .map_err(|err| format!("invalid address {address:?}: {err}"))
}
