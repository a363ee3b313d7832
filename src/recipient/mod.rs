//! Recipient module.
//!
//! A recipient is the address being checked: either a mailing list
//! (distribution list) or a group. This module also exposes its
//! members, page by page.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    printer::{PrintTable, PrintTableOpts, WriteColor},
    report::Result,
    ui::table::{Cell, Row, Table},
};

/// Members shown per page when none is configured.
pub const DEFAULT_MEMBERS_PAGE_SIZE: usize = 25;

/// Directory lookups of the reporting API.
#[async_trait]
pub trait DirectoryQuery: Send + Sync {
    /// Resolves an address to a mailing list or a group. Fails with
    /// [`crate::report::Error::NotFound`] otherwise.
    async fn resolve_recipient(&self, address: &str) -> Result<Recipient>;

    /// Lists one page of members. Pages start at 1.
    async fn list_members(&self, address: &str, page: u32, page_size: usize)
        -> Result<MembersPage>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RecipientKind {
    #[serde(alias = "distributionList", alias = "DistributionGroup")]
    MailingList,
    #[serde(alias = "unifiedGroup", alias = "GroupMailbox")]
    Group,
}

impl fmt::Display for RecipientKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MailingList => write!(f, "mailing list"),
            Self::Group => write!(f, "group"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    #[serde(alias = "primarySmtpAddress")]
    pub address: String,
    #[serde(default)]
    pub display_name: String,
    pub kind: RecipientKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u64>,
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(alias = "primarySmtpAddress")]
    pub address: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, alias = "recipientType", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Table for Member {
    fn head() -> Row {
        Row::new()
            .cell(Cell::new("NAME").shrinkable().bold().underline().white())
            .cell(Cell::new("ADDRESS").bold().underline().white())
            .cell(Cell::new("TYPE").bold().underline().white())
    }

    fn row(&self) -> Row {
        Row::new()
            .cell(Cell::new(&self.display_name).shrinkable().green())
            .cell(Cell::new(&self.address).blue())
            .cell(Cell::new(self.kind.as_deref().unwrap_or_default()).white())
    }
}

/// One page of members.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MembersPage {
    pub members: Vec<Member>,
    pub page: u32,
    pub next_page: Option<u32>,
}

impl MembersPage {
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }
}

impl PrintTable for MembersPage {
    fn print_table(&self, writer: &mut dyn WriteColor, opts: PrintTableOpts) -> anyhow::Result<()> {
        writeln!(writer)?;
        Table::print(writer, &self.members, opts)?;
        if self.has_more() {
            writeln!(writer, "… more members on page {}", self.page + 1)?;
        }
        writeln!(writer)?;
        Ok(())
    }
}
