//! Deserialized account config module.
//!
//! This module contains the raw deserialized representation of an
//! account in the accounts section of the user configuration file,
//! and the resolved [`AccountConfig`] the commands work with.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::{env, time::Duration};
use url::Url;

use crate::{
    activity::DEFAULT_FAILED_DISPLAY_LIMIT,
    job::{DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL},
    recipient::DEFAULT_MEMBERS_PAGE_SIZE,
    report::{DEFAULT_LOOKBACK_DAYS, MAX_SHORT_WINDOW_DAYS},
};

/// Environment variable read when an account has no token.
pub const TOKEN_ENV_VAR: &str = "LIST_ACTIVITY_TOKEN";

/// Seconds before an API request is abandoned.
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Represents an account as written in the TOML configuration.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TomlAccountConfig {
    pub default: Option<bool>,
    pub api_url: Url,
    pub token: Option<String>,
    pub request_timeout: Option<u64>,
    pub report: Option<ReportConfig>,
    pub historical: Option<HistoricalConfig>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ReportConfig {
    pub lookback_days: Option<u32>,
    pub failed_display_limit: Option<usize>,
    pub members_page_size: Option<usize>,
}

/// Durations are expressed in seconds.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct HistoricalConfig {
    pub poll_interval: Option<u64>,
    pub max_wait: Option<u64>,
    pub notify_address: Option<String>,
    pub title_prefix: Option<String>,
}

/// Account configuration with every default applied.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountConfig {
    pub name: String,
    pub api_url: Url,
    pub token: Option<String>,
    /// Request timeout, in seconds.
    pub request_timeout: u64,
    pub lookback_days: u32,
    pub failed_display_limit: usize,
    pub members_page_size: usize,
    pub poll_interval: Duration,
    pub max_wait: Duration,
    pub notify_address: Option<String>,
    pub title_prefix: Option<String>,
}

impl AccountConfig {
    pub fn new(name: impl ToString, api_url: Url) -> Self {
        Self {
            name: name.to_string(),
            api_url,
            token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            failed_display_limit: DEFAULT_FAILED_DISPLAY_LIMIT,
            members_page_size: DEFAULT_MEMBERS_PAGE_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
            notify_address: None,
            title_prefix: None,
        }
    }

    /// Builds the title of a historical search for the given address.
    pub fn report_title(&self, address: &str) -> Option<String> {
        self.title_prefix
            .as_ref()
            .map(|prefix| format!("{prefix} {address}"))
    }
}

impl TomlAccountConfig {
    /// Applies the defaults and validates the result.
    ///
    /// The token falls back to the [`TOKEN_ENV_VAR`] environment
    /// variable.
    pub fn into_account_config(self, name: impl ToString) -> Result<AccountConfig> {
        let name = name.to_string();
        let mut config = AccountConfig::new(&name, self.api_url);

        config.token = self
            .token
            .or_else(|| env::var(TOKEN_ENV_VAR).ok())
            .filter(|token| !token.trim().is_empty());

        if let Some(timeout) = self.request_timeout {
            config.request_timeout = timeout;
        }

        let report = self.report.unwrap_or_default();

        if let Some(days) = report.lookback_days {
            if !(1..=MAX_SHORT_WINDOW_DAYS).contains(&days) {
                bail!("lookback-days of account {name} must be between 1 and {MAX_SHORT_WINDOW_DAYS}, got {days}");
            }
            config.lookback_days = days;
        }

        if let Some(limit) = report.failed_display_limit {
            config.failed_display_limit = limit;
        }

        if let Some(size) = report.members_page_size {
            if size == 0 {
                bail!("members-page-size of account {name} cannot be 0");
            }
            config.members_page_size = size;
        }

        let historical = self.historical.unwrap_or_default();

        if let Some(secs) = historical.poll_interval {
            if secs == 0 {
                bail!("poll-interval of account {name} cannot be 0");
            }
            config.poll_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = historical.max_wait {
            config.max_wait = Duration::from_secs(secs);
        }

        config.notify_address = historical.notify_address;
        config.title_prefix = historical.title_prefix;

        Ok(config)
    }
}
