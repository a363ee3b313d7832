use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::{
    completion::command::CompletionGenerateCommand,
    config::{self, TomlConfig},
    job::command::JobCommand,
    manual::command::ManualGenerateCommand,
    output::{ColorFmt, OutputFmt},
    printer::Printer,
    report::command::CheckCommand,
};

#[derive(Parser, Debug)]
#[command(
    name = "list-activity",
    author,
    version,
    about,
    propagate_version = true,
    infer_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: ListActivityCommand,

    /// Override the default configuration file path
    ///
    /// The given path is canonicalized (if applicable). Without it,
    /// the configuration is read from the first existing file among
    /// $XDG_CONFIG_HOME/list-activity/config.toml,
    /// ~/.config/list-activity/config.toml and ~/.list-activityrc.
    #[arg(long, short, global = true)]
    #[arg(value_name = "PATH", value_parser = config::path_parser)]
    pub config: Option<PathBuf>,

    /// Customize the output format
    ///
    /// The possible values are:
    ///
    ///  - json: output will be in a form of a JSON-compatible object
    ///
    ///  - plain: output will be in a form of either a plain text or
    ///    table, depending on the command
    ///
    /// Prompts are disabled when the output is JSON.
    #[arg(long, short, global = true)]
    #[arg(value_name = "FORMAT", value_enum, default_value_t = Default::default())]
    pub output: OutputFmt,

    /// Control when to use colors
    ///
    /// The default setting is 'auto': colors are used when printing
    /// to a terminal, and suppressed when redirected to a file or a
    /// pipe, or when TERM is unset or 'dumb'.
    ///
    /// The possible values are:
    ///
    ///  - never: colors will never be used
    ///
    ///  - always: colors will always be used regardless of where output is sent
    ///
    ///  - ansi: like 'always', but emits ANSI escapes (even in a Windows console)
    ///
    ///  - auto: list-activity tries to be smart
    #[arg(long, short = 'C', global = true)]
    #[arg(value_name = "MODE", value_enum, default_value_t = Default::default())]
    pub color: ColorFmt,
}

#[derive(Subcommand, Debug)]
pub enum ListActivityCommand {
    /// Check the recent activity of a mailing list or a group
    #[command(alias = "activity")]
    Check(CheckCommand),

    /// Check a historical search
    #[command(alias = "jobs")]
    Job(JobCommand),

    /// Generate manual pages to a directory
    #[command(arg_required_else_help = true)]
    #[command(alias = "manuals", alias = "mans")]
    Manual(ManualGenerateCommand),

    /// Print completion script for a shell to stdout
    #[command(arg_required_else_help = true)]
    #[command(alias = "completions")]
    Completion(CompletionGenerateCommand),
}

impl ListActivityCommand {
    pub async fn execute(
        self,
        printer: &mut impl Printer,
        config_path: Option<&PathBuf>,
    ) -> Result<()> {
        match self {
            Self::Check(cmd) => {
                let config = TomlConfig::from_opt_path(config_path.map(PathBuf::as_path))?;
                cmd.execute(printer, &config).await
            }
            Self::Job(cmd) => {
                let config = TomlConfig::from_opt_path(config_path.map(PathBuf::as_path))?;
                cmd.execute(printer, &config).await
            }
            Self::Manual(cmd) => cmd.execute(printer),
            Self::Completion(cmd) => cmd.execute(),
        }
    }
}
