use anyhow::Result;
use clap::Args;

use super::{TargetArgs, print_json_error};

#[derive(Args)]
pub struct KeysArgs {
    #[arg(long, help = "Output as JSON")]
    pub json: bool
}

pub fn run(target: &TargetArgs, args: KeysArgs) -> Result<()> {
    let config = target.bootstrap().inspect_err(|e| {
        if args.json {
            print_json_error(e);
        }
    })?;
    let keys = config.config_keys()?;
    if args.json {
        println!("{}", serde_json::to_string(&keys)?);
        return Ok(());
    }
    for key in keys {
        println!("{}", key);
    }
    Ok(())
}
