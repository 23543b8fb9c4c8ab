pub mod get;
pub mod keys;
pub mod ping;
pub mod show;

use anyhow::{Context, Result, anyhow, bail};
use cip_core::CipIdentity;
use clap::{Args, Parser, Subcommand};
use config::{BootstrapOptions, CiaoConfig, load_defaults};
use errors::{ConfigurationError, ErrorKind};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::output;

#[derive(Parser)]
#[command(
    name = "ciao-config",
    author,
    version,
    about = "Inspect and seed CIAO configuration",
    long_about = "Bootstraps the configuration of a CIP the same way the CIP itself would.\n\nWith \
                  an etcd URL the configuration lives in etcd; otherwise it is read from \
                  .properties files in ~/.ciao or --config-path.\nDefaults are only written \
                  when no configuration exists yet."
)]
pub struct Cli {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Bootstrap and print every configuration value")]
    Show(show::ShowArgs),

    #[command(about = "Print a single configuration value")]
    Get(get::GetArgs),

    #[command(about = "List configuration keys")]
    Keys(keys::KeysArgs),

    #[command(about = "Check that the etcd server answers")]
    Ping(ping::PingArgs)
}

/// Where the configuration lives and which CIP it belongs to.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    #[arg(long, global = true, env = "CIAO_ETCD_URL", help = "etcd base URL")]
    pub etcd_url: Option<String>,

    #[arg(
        long,
        global = true,
        env = "CIAO_CONFIG_PATH",
        help = "Directory holding .properties files (default: ~/.ciao)"
    )]
    pub config_path: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        env = "CIAO_ETCD_TIMEOUT_SECONDS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "etcd request timeout in seconds"
    )]
    pub etcd_timeout: u64,

    #[arg(long, global = true, help = "CIP name")]
    pub name: Option<String>,

    #[arg(long, global = true, help = "CIP version")]
    pub cip_version: Option<String>,

    #[arg(long, global = true, help = "Optional classifier")]
    pub classifier: Option<String>,

    #[arg(
        long,
        global = true,
        help = "Defaults file (.toml, .yaml or .properties) used on first run"
    )]
    pub defaults: Option<PathBuf>,

    #[arg(
        long = "default",
        global = true,
        value_name = "KEY=VALUE",
        value_parser = parse_key_value,
        help = "Default value used on first run (repeatable, overrides --defaults)"
    )]
    pub default_values: Vec<(String, String)>
}

impl TargetArgs {
    pub fn identity(&self) -> Result<CipIdentity> {
        let name = self
            .name
            .clone()
            .ok_or_else(|| anyhow!("--name is required"))?;
        let version = self
            .cip_version
            .clone()
            .ok_or_else(|| anyhow!("--cip-version is required"))?;
        Ok(CipIdentity::new(name, version).with_optional_classifier(self.classifier.clone()))
    }

    /// `None` when neither `--defaults` nor `--default` was given.
    pub fn defaults(&self) -> Result<Option<BTreeMap<String, String>>> {
        if self.defaults.is_none() && self.default_values.is_empty() {
            return Ok(None);
        }

        let mut defaults = match &self.defaults {
            Some(path) => load_defaults(path)
                .with_context(|| format!("Failed to load defaults from {}", path.display()))?,
            None => BTreeMap::new(),
        };
        defaults.extend(self.default_values.iter().cloned());
        Ok(Some(defaults))
    }

    pub fn options(&self) -> Result<BootstrapOptions> {
        let mut options = BootstrapOptions::new(self.identity()?)
            .with_etcd_timeout(Duration::from_secs(self.etcd_timeout));
        if let Some(url) = self.etcd_url.as_deref().filter(|u| !u.trim().is_empty()) {
            options = options.with_network_url(url);
        }
        if let Some(path) = &self.config_path {
            options = options.with_file_path(path);
        }
        if let Some(defaults) = self.defaults()? {
            options = options.with_defaults(defaults);
        }
        Ok(options)
    }

    pub fn bootstrap(&self) -> Result<CiaoConfig> {
        let options = self.options()?;
        let identity = options.identity.to_string();
        CiaoConfig::bootstrap(options).map_err(|e| {
            explain(&e);
            anyhow::Error::new(e).context(format!("Failed to bootstrap configuration for {}", identity))
        })
    }
}

fn explain(err: &ConfigurationError) {
    match err.kind() {
        ErrorKind::MissingDefaults => {
            output::hint("pass --defaults <file> or --default KEY=VALUE to seed it")
        }
        ErrorKind::StoreUnavailable => {
            output::hint("check --etcd-url / --config-path, or run with RUST_LOG=debug")
        }
        _ => {}
    }
}

/// `--json` failures go to stdout as `{"error": {"kind", "message"}}`.
pub fn print_json_error(err: &anyhow::Error) {
    let kind = err
        .downcast_ref::<ConfigurationError>()
        .map(ConfigurationError::kind);
    let output = serde_json::json!({
        "error": {
            "kind": kind,
            "message": format!("{:#}", err)
        }
    });
    println!("{}", output);
}

fn parse_key_value(s: &str) -> Result<(String, String)> {
    let Some((key, value)) = s.split_once('=') else {
        bail!("expected KEY=VALUE, got '{}'", s);
    };
    if key.trim().is_empty() {
        bail!("empty key in '{}'", s);
    }
    Ok((key.trim().to_string(), value.to_string()))
}
