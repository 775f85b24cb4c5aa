pub mod config;
pub mod fd_limit;
pub mod logger;
pub mod settings_toml;
pub mod tempfiles;

pub use config::*;
pub use fd_limit::{FDS_PER_WORKER, max_open_fds, max_workers_by_fd_limit, workers_for_fd_limit};
pub use logger::setup_logging;
pub use settings_toml::{Settings, apply_env_to_opts, apply_settings_to_opts, load_settings};
pub use tempfiles::write_atomically;
