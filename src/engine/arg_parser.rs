use clap::{Parser, Subcommand};
use std::path::PathBuf;

struct DefaultArgs;

impl DefaultArgs {
    pub const DIR: &'static str = ".";
}

/// Apply artifact transforms in parallel, once per artifact, and list the results in order.
#[derive(Clone, Parser)]
#[command(name = "artixform")]
#[command(about = "Transform a tree of component artifacts; list produced files in structural order.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output (debug logging and progress bar).
    #[arg(long, short = 'v', global = true, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    /// Transform every artifact under DIR (one component per subdirectory).
    Transform(TransformArgs),
    /// List known toolchain installations from the settings file.
    Toolchains {
        /// Directory holding the settings file. Default: current directory.
        #[arg(value_name = "DIR", default_value = DefaultArgs::DIR)]
        dir: PathBuf,
    },
}

#[derive(Clone, clap::Args)]
pub struct TransformArgs {
    /// Directory of components. Default: current directory.
    #[arg(value_name = "DIR", default_value = DefaultArgs::DIR)]
    pub dir: PathBuf,

    /// Output directory for produced files. Default: `artixform-out` in DIR.
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Transform step, in chain order: copy, digest, filter:<glob>, with-deps. Repeatable.
    #[arg(long = "step", short = 's')]
    pub steps: Vec<String>,

    /// Target attribute `key=value` attached to every produced file. Repeatable.
    #[arg(long = "attr", short = 'a')]
    pub attributes: Vec<String>,

    /// Exclude patterns (glob syntax). Can specify multiple: -e pattern1 pattern2 pattern3
    #[arg(long, short = 'e', num_args = 1..)]
    pub exclude: Vec<String>,

    /// Maximum number of transforms running at once.
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Write module metadata for the produced files to this path.
    #[arg(long, short = 'm')]
    pub metadata: Option<PathBuf>,
}
