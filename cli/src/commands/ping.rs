use anyhow::{Context, Result, anyhow};
use clap::Args;
use std::time::Duration;
use storage::{EtcdClient, EtcdClientConfig};

use super::TargetArgs;
use crate::output;

#[derive(Args)]
pub struct PingArgs {
    #[arg(long, help = "Output as JSON")]
    pub json: bool
}

pub fn run(target: &TargetArgs, args: PingArgs) -> Result<()> {
    let url = target
        .etcd_url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| anyhow!("No etcd URL configured (use --etcd-url or CIAO_ETCD_URL)"))?;

    let config =
        EtcdClientConfig::new(url).with_timeout(Duration::from_secs(target.etcd_timeout));
    let client = EtcdClient::with_config(&config)
        .with_context(|| format!("Invalid etcd URL {}", url))?;
    let version = client
        .server_version()
        .with_context(|| format!("etcd at {} did not answer", url))?;

    if args.json {
        let output = serde_json::json!({ "url": url, "etcdserver": version });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        output::success(&format!("etcd {} reachable at {}", version, url));
    }
    Ok(())
}
