mod check;

pub use self::check::CheckCommand;
pub(crate) use self::check::cancel_on_ctrl_c;
