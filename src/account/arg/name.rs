use clap::Parser;

/// The account name flag parser.
#[derive(Debug, Default, Parser)]
pub struct AccountNameFlag {
    /// Override the default account.
    ///
    /// An account name corresponds to an entry of the accounts table
    /// of your TOML configuration file.
    #[arg(long = "account", short = 'a')]
    #[arg(name = "account_name", value_name = "NAME")]
    pub name: Option<String>,
}
