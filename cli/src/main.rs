use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show(args) => commands::show::run(&cli.target, args),
        Commands::Get(args) => commands::get::run(&cli.target, args),
        Commands::Keys(args) => commands::keys::run(&cli.target, args),
        Commands::Ping(args) => commands::ping::run(&cli.target, args),
    }
}
