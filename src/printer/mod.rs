pub mod print;
#[allow(clippy::module_inception)]
pub mod printer;

use anyhow::Result;
use std::io;
use termcolor::StandardStream;

pub use print::*;
pub use printer::*;

pub trait WriteColor: io::Write + termcolor::WriteColor {}

impl WriteColor for StandardStream {}

pub trait PrintTable {
    fn print_table(&self, writer: &mut dyn WriteColor, opts: PrintTableOpts) -> Result<()>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PrintTableOpts {
    pub max_width: Option<usize>,
}
