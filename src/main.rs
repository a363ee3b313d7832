use clap::Parser;
use env_logger::{Env, DEFAULT_FILTER_ENV};
use list_activity::{cli::Cli, printer::StdoutPrinter};
use log::{debug, error};
use std::process;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().filter_or(DEFAULT_FILTER_ENV, "warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    debug!("output format: {}", cli.output);

    let mut printer = StdoutPrinter::new(cli.output, cli.color);

    if let Err(err) = cli.command.execute(&mut printer, cli.config.as_ref()).await {
        let mut errs = err.chain();
        if let Some(err) = errs.next() {
            error!("{err}");
        }
        errs.for_each(|err| error!(" ↳ {err}"));
        process::exit(1);
    }
}
