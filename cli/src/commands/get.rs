use anyhow::{Result, bail};
use clap::Args;

use super::TargetArgs;

#[derive(Args)]
pub struct GetArgs {
    #[arg(help = "Configuration key")]
    pub key: String
}

/// Prints the raw value, so it can be captured by scripts.
pub fn run(target: &TargetArgs, args: GetArgs) -> Result<()> {
    let config = target.bootstrap()?;
    match config.config_value(&args.key)? {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => bail!("Key '{}' is not set for {}", args.key, config.properties()?.identity()),
    }
}
