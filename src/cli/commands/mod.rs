//! CLI subcommand implementations.

mod extract;
mod history;
mod preview;

pub use extract::{cmd_extract, ExtractArgs};
pub use history::cmd_history;
pub use preview::cmd_preview;
