//! CLI logger. Library code only logs through the `log` facade.

use colored::{ColoredString, Colorize};
use env_logger::Builder;
use log::{Level, LevelFilter, Record};
use std::io::Write;

const WORKER_PREFIX: &str = concat!(env!("CARGO_PKG_NAME"), "-worker-");

fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERROR".red(),
        Level::Warn => "WARN".yellow(),
        Level::Info => "INFO".green(),
        Level::Debug => "DEBUG".blue(),
        Level::Trace => "TRACE".dimmed(),
    }
}

/// `w<N>` when logging from queue worker N.
fn worker_tag() -> Option<String> {
    let current = std::thread::current();
    let n = current.name()?.strip_prefix(WORKER_PREFIX)?;
    Some(format!("w{n}"))
}

fn render(record: &Record) -> String {
    let name = env!("CARGO_PKG_NAME").cyan();
    match record.level() {
        Level::Info => format!("[{name}] {}", record.args()),
        level @ (Level::Error | Level::Warn) => format!(
            "[{name} {} {}] {}",
            level_tag(level),
            record.target().white(),
            record.args()
        ),
        level => match worker_tag() {
            Some(w) => format!("[{name} {} {}] {}", level_tag(level), w.dimmed(), record.args()),
            None => format!("[{name} {}] {}", level_tag(level), record.args()),
        },
    }
}

/// Install the logger: our crate at debug when `verbose` (info otherwise), dependencies at warn.
/// `RUST_LOG` still applies on top. A second call is a no-op.
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), level)
        .format(|buf, record| writeln!(buf, "{}", render(record)))
        .try_init();
}
