pub mod arg;
pub mod config;

pub use self::config::{AccountConfig, TomlAccountConfig};
