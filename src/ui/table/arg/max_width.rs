use clap::Parser;

/// The table max width argument parser.
#[derive(Debug, Default, Parser)]
pub struct TableMaxWidthFlag {
    /// The maximum width tables should not exceed.
    ///
    /// Applies to the failed deliveries and members tables. Subjects
    /// and names shrink with an ellipsis in order to fit the width.
    /// Defaults to the terminal width.
    #[arg(long, short = 'w', name = "table_max_width", value_name = "PIXELS")]
    pub max_width: Option<usize>,
}
