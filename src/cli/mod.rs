pub mod commands;
pub mod context;
pub mod progress;
pub mod results;
pub mod start;
pub mod watch;

pub use commands::{Cli, Commands};
pub use context::CliContext;
