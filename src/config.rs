//! Deserialized config module.
//!
//! This module contains the raw deserialized representation of the
//! user configuration file.

use anyhow::{anyhow, bail, Context, Result};
use dirs::{config_dir, home_dir};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::account::{AccountConfig, TomlAccountConfig};

/// Represents the user config file.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub accounts: HashMap<String, TomlAccountConfig>,
}

impl TomlConfig {
    /// Reads and parses the TOML configuration at the given path.
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!("reading config from {path:?}");

        let content =
            fs::read_to_string(path).with_context(|| format!("cannot read config file {path:?}"))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("cannot parse config file {path:?}"))?;

        if config.accounts.is_empty() {
            bail!("config file must contain at least one account");
        }

        trace!("config: {config:#?}");
        Ok(config)
    }

    /// Reads and parses the TOML configuration at the optional given
    /// path, or at the first existing default path.
    pub fn from_opt_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => {
                let path = Self::path().ok_or_else(|| {
                    anyhow!("cannot find config file, use --config to give its path")
                })?;
                Self::from_path(&path)
            }
        }
    }

    /// Returns the first existing default config path.
    ///
    /// Tries paths in this order:
    ///
    /// - `"$XDG_CONFIG_HOME/list-activity/config.toml"` (or its
    ///   equivalent on other OSes)
    /// - `"$HOME/.config/list-activity/config.toml"`
    /// - `"$HOME/.list-activityrc"`
    pub fn path() -> Option<PathBuf> {
        let name = env!("CARGO_PKG_NAME");

        config_dir()
            .map(|p| p.join(name).join("config.toml"))
            .filter(|p| p.exists())
            .or_else(|| home_dir().map(|p| p.join(".config").join(name).join("config.toml")))
            .filter(|p| p.exists())
            .or_else(|| home_dir().map(|p| p.join(format!(".{name}rc"))))
            .filter(|p| p.exists())
    }

    /// Picks the account with the given name, otherwise the one marked
    /// as default, otherwise the only one.
    pub fn into_account_config(mut self, account_name: Option<&str>) -> Result<AccountConfig> {
        let name = match account_name {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => self.default_account_name()?,
        };

        let toml_account_config = self
            .accounts
            .remove(&name)
            .ok_or_else(|| anyhow!("cannot find account {name}"))?;

        toml_account_config
            .into_account_config(&name)
            .with_context(|| format!("invalid configuration for account {name}"))
    }

    fn default_account_name(&self) -> Result<String> {
        let defaults: Vec<_> = self
            .accounts
            .iter()
            .filter(|(_, account)| account.default.unwrap_or(false))
            .map(|(name, _)| name.clone())
            .collect();

        match defaults.as_slice() {
            [name] => Ok(name.clone()),
            [] if self.accounts.len() == 1 => self
                .accounts
                .keys()
                .next()
                .cloned()
                .ok_or_else(|| anyhow!("cannot find default account")),
            [] => bail!("cannot find default account, use --account to pick one"),
            _ => bail!("several accounts are marked as default"),
        }
    }
}

/// Parses a configuration file path as [`PathBuf`], canonicalized when
/// it exists.
pub fn path_parser(path: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path);
    Ok(fs::canonicalize(&path).unwrap_or(path))
}
