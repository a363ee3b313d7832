pub(crate) mod prompt;
pub mod table;

use dialoguer::theme::ColorfulTheme;
use once_cell::sync::Lazy;

pub(crate) static THEME: Lazy<ColorfulTheme> = Lazy::new(ColorfulTheme::default);
