use anyhow::Result;
use clap::Args;
use colored::Colorize;
use config::{BootstrapOutcome, CiaoConfig};

use super::{TargetArgs, print_json_error};
use crate::output;

#[derive(Args)]
pub struct ShowArgs {
    #[arg(long, help = "Output as JSON")]
    pub json: bool
}

pub fn run(target: &TargetArgs, args: ShowArgs) -> Result<()> {
    let config = target.bootstrap().inspect_err(|e| {
        if args.json {
            print_json_error(e);
        }
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&to_json(&config)?)?);
        return Ok(());
    }

    if config.outcome() == Some(BootstrapOutcome::Seeded) {
        output::info(&format!(
            "No configuration existed for {}; defaults were written",
            config.properties()?.identity()
        ));
    }

    output::header("CIAO Configuration");
    println!();
    println!("  {:<12}{}", "cip:".bold(), config.cip_name()?);
    println!("  {:<12}{}", "version:".bold(), config.version()?);
    if let Some(classifier) = config.classifier()? {
        println!("  {:<12}{}", "classifier:".bold(), classifier);
    }

    println!();
    output::subheader("Properties:");
    for (key, value) in config.properties()?.entries() {
        output::property(key, value);
    }
    Ok(())
}

fn to_json(config: &CiaoConfig) -> Result<serde_json::Value> {
    let outcome = match config.outcome() {
        Some(BootstrapOutcome::Loaded) => Some("loaded"),
        Some(BootstrapOutcome::Seeded) => Some("seeded"),
        None => None,
    };
    Ok(serde_json::json!({
        "cip": config.cip_name()?,
        "version": config.version()?,
        "classifier": config.classifier()?,
        "outcome": outcome,
        "properties": config.all_properties()?
    }))
}
