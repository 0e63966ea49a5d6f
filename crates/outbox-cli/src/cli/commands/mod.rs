//! CLI command handlers. Each command is in its own file.

mod check;
mod clear;
mod flush;
mod run;
mod send;
mod status;

pub use check::run_check;
pub use clear::run_clear;
pub use flush::run_flush;
pub use run::run_daemon;
pub use send::run_send;
pub use status::run_status;
