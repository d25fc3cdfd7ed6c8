mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use attrib::RunOptions;
use cli::*;

fn init_logging(verbose: bool) {
    let default = if verbose { "attrib=debug" } else { "attrib=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Configure {
            source,
            output,
            show,
        } => commands::configure::handle(source, output, show),

        Commands::Run {
            source,
            output,
            civ,
            no_icons,
        } => {
            let options = RunOptions { civ };
            options.validate()?;

            let config = Config::load()?;
            let source = config.source_dir(source)?;
            let output = config.output_dir(output)?;
            commands::run::handle(&source, &output, &options, !no_icons)
        }

        Commands::Resolve {
            reference,
            civ,
            source,
        } => {
            let source = Config::load()?.source_dir(source)?;
            commands::inspect::resolve(&source, &reference, &civ)
        }

        Commands::Normalize {
            reference,
            civ,
            source,
        } => {
            let source = Config::load()?.source_dir(source)?;
            commands::inspect::normalize(&source, &reference, &civ)
        }

        Commands::Civs => {
            commands::inspect::civs();
            Ok(())
        }
    }
}
