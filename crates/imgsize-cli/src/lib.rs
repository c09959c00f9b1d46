pub mod cli;
pub mod config;
pub mod exit;
pub mod files;
pub mod output;
pub mod progress;

pub use cli::{Cli, Commands, ConfigCommands};
pub use config::Config;
pub use exit::Exit;
pub use files::collect_files;
pub use output::OutputFormatter;
pub use progress::ProgressReporter;
