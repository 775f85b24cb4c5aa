//! Engine module for the CLI: argument parsing, discovery, handlers, hashing, progress.

pub mod arg_parser;
pub mod cli;
pub mod discovery;
pub mod handlers;
pub mod hashing;
pub mod progress;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::{Cli, Commands, TransformArgs};
pub use cli::handle_run;
pub use discovery::{artifact_id_for, discover_components};
pub use hashing::digest_file;
pub use tools::{glob_match, path_relative_to, should_include_artifact};
