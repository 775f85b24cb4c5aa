//! CLI command handler: layer options (defaults, settings file, environment, flags) and dispatch.

use anyhow::{Result, bail};
use log::debug;
use std::path::Path;

use crate::engine::arg_parser::{Cli, Commands, TransformArgs};
use crate::engine::handlers::{handle_toolchains, handle_transform};
use crate::utils::{Settings, apply_env_to_opts, apply_settings_to_opts, setup_logging};
use crate::{Attributes, Opts};

/// Defaults, then `.artixform.toml` in `dir`, then environment, then flags.
fn setup_opts(cli: &Cli, args: &TransformArgs, settings: Option<&Settings>) -> Result<Opts> {
    let mut opts = Opts::default();
    if let Some(file) = settings {
        apply_settings_to_opts(file, &mut opts);
    }
    apply_env_to_opts(&args.dir, &mut opts);

    if let Some(n) = args.workers {
        opts.num_workers = Some(n);
    }
    if let Some(ref out) = args.out {
        opts.out_dir = Some(out.clone());
    }
    if !args.steps.is_empty() {
        opts.steps = args.steps.clone();
    }
    for pair in &args.attributes {
        let Some((k, v)) = Attributes::parse_pair(pair) else {
            bail!("invalid attribute '{pair}', expected key=value");
        };
        opts.target_attributes.insert(k, v);
    }
    opts.exclude.extend(args.exclude.iter().cloned());
    if let Some(ref m) = args.metadata {
        opts.metadata_path = Some(m.clone());
    }
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    Ok(opts)
}

fn settings_verbose(cli: &Cli, dir: &Path) -> (bool, Result<Option<Settings>>) {
    let settings = crate::utils::load_settings(dir);
    let file_verbose = matches!(&settings, Ok(Some(s)) if s.verbose());
    (cli.verbose.unwrap_or(file_verbose), settings)
}

/// Run the chosen subcommand.
pub fn handle_run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Transform(args) => {
            let (verbose, settings) = settings_verbose(cli, &args.dir);
            setup_logging(verbose);
            let settings = settings?;
            let opts = setup_opts(cli, args, settings.as_ref())?;
            debug!(
                "{} CONFIG:{:#?}",
                env!("CARGO_PKG_NAME").to_uppercase(),
                opts
            );
            handle_transform(&args.dir, &opts, settings.unwrap_or_default())
        }
        Commands::Toolchains { dir } => {
            let (verbose, settings) = settings_verbose(cli, dir);
            setup_logging(verbose);
            handle_toolchains(settings?.unwrap_or_default())
        }
    }
}
