use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_mangen::Man;
use log::info;
use std::{fs, path::PathBuf};

use crate::{cli::Cli, printer::Printer};

/// Generate manual pages to a directory.
///
/// One page is generated for the main command and one per
/// subcommand. The directory is created when missing, existing pages
/// are overridden.
#[derive(Debug, Parser)]
pub struct ManualGenerateCommand {
    /// Directory where man files should be generated in.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,
}

impl ManualGenerateCommand {
    pub fn execute(self, printer: &mut impl Printer) -> Result<()> {
        info!("executing manual generate command");

        let cmd = Cli::command();
        let cmd_name = cmd.get_name().to_string();
        let subcmds = cmd.get_subcommands().cloned().collect::<Vec<_>>();
        let pages_len = subcmds.len() + 1;

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("cannot create directory {:?}", self.dir))?;

        let mut buffer = Vec::new();
        Man::new(cmd).render(&mut buffer)?;
        printer.print_log(format!("Generating man page for command {cmd_name}…"))?;
        fs::write(self.dir.join(format!("{cmd_name}.1")), buffer)?;

        for subcmd in subcmds {
            let subcmd_name = subcmd.get_name().to_string();

            let mut buffer = Vec::new();
            Man::new(subcmd).render(&mut buffer)?;
            printer.print_log(format!("Generating man page for subcommand {subcmd_name}…"))?;
            fs::write(self.dir.join(format!("{cmd_name}-{subcmd_name}.1")), buffer)?;
        }

        printer.print(format!(
            "{pages_len} man page(s) successfully generated in {:?}!",
            self.dir
        ))?;

        Ok(())
    }
}
