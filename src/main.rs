//! Artixform CLI: transform component artifacts in parallel, once each, and list the outputs.

use anyhow::Result;
use artixform::engine::arg_parser::Cli;
use artixform::engine::handle_run;
use clap::Parser;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
