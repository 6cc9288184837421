//! Daemon configuration: CLI flags, an optional TOML file, and defaults.
//!
//! Precedence is flag (or its environment variable) over file over
//! default. The result is an immutable [`Settings`] built once at startup.
//!
//! ```toml
//! # /etc/hpatuner/config.toml
//! namespace = "prod"
//! probe_addr = "0.0.0.0:8081"
//! requeue_interval = "30s"
//! metric_timeout = "10s"
//! api_timeout = "30s"
//! backoff_base = "5s"
//! backoff_max = "5m"
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use hpatuner_controller::ControllerConfig;

/// Default bind address for `/healthz`, `/readyz`, and `/metrics`.
pub const DEFAULT_PROBE_ADDR: &str = "0.0.0.0:8081";

#[derive(Parser, Debug)]
#[command(name = "hpatunerd", about = "hpatuner controller daemon", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the controller.
    Run(RunArgs),
    /// Print the HpaTuner CustomResourceDefinition as JSON.
    Crd,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// TOML configuration file.
    #[arg(long, env = "HPATUNER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Namespace to watch (all namespaces when unset).
    #[arg(long, env = "HPATUNER_NAMESPACE")]
    pub namespace: Option<String>,

    /// Bind address for the probe and metrics server.
    #[arg(long, env = "HPATUNER_PROBE_ADDR")]
    pub probe_addr: Option<SocketAddr>,

    /// Delay between passes for a healthy tuner (e.g. "30s").
    #[arg(long, env = "HPATUNER_REQUEUE_INTERVAL", value_parser = parse_duration)]
    pub requeue_interval: Option<Duration>,

    /// Deadline for one metric fetch (e.g. "10s").
    #[arg(long, env = "HPATUNER_METRIC_TIMEOUT", value_parser = parse_duration)]
    pub metric_timeout: Option<Duration>,

    /// Connect deadline for the Kubernetes API server (e.g. "30s").
    #[arg(long, env = "HPATUNER_API_TIMEOUT", value_parser = parse_duration)]
    pub api_timeout: Option<Duration>,

    /// Reporting instance attached to events.
    #[arg(long, env = "POD_NAME")]
    pub instance: Option<String>,

    /// Emit logs as JSON.
    #[arg(long, env = "HPATUNER_LOG_JSON")]
    pub log_json: bool,
}

/// Optional on-disk configuration. Every field may be omitted.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub namespace: Option<String>,
    pub probe_addr: Option<SocketAddr>,
    pub requeue_interval: Option<String>,
    pub metric_timeout: Option<String>,
    pub api_timeout: Option<String>,
    pub backoff_base: Option<String>,
    pub backoff_max: Option<String>,
    pub field_manager: Option<String>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Fully resolved daemon settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub controller: ControllerConfig,
    pub probe_addr: SocketAddr,
}

impl RunArgs {
    /// Resolve flags against the config file (if any) and defaults.
    pub fn resolve(&self) -> anyhow::Result<Settings> {
        let file = match &self.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        self.resolve_with(file)
    }

    /// Resolve flags against an already loaded file config.
    pub fn resolve_with(&self, file: FileConfig) -> anyhow::Result<Settings> {
        let defaults = ControllerConfig::default();
        let file_duration = |value: &Option<String>, name: &str| -> anyhow::Result<Option<Duration>> {
            value
                .as_deref()
                .map(|v| parse_duration(v).with_context(|| format!("invalid {name} {v:?}")))
                .transpose()
        };

        let controller = ControllerConfig {
            namespace: self.namespace.clone().or(file.namespace),
            field_manager: file.field_manager.unwrap_or(defaults.field_manager),
            reporter: defaults.reporter,
            instance: self.instance.clone(),
            requeue_interval: self
                .requeue_interval
                .or(file_duration(&file.requeue_interval, "requeue_interval")?)
                .unwrap_or(defaults.requeue_interval),
            metric_timeout: self
                .metric_timeout
                .or(file_duration(&file.metric_timeout, "metric_timeout")?)
                .unwrap_or(defaults.metric_timeout),
            api_timeout: self
                .api_timeout
                .or(file_duration(&file.api_timeout, "api_timeout")?)
                .unwrap_or(defaults.api_timeout),
            backoff_base: file_duration(&file.backoff_base, "backoff_base")?
                .unwrap_or(defaults.backoff_base),
            backoff_max: file_duration(&file.backoff_max, "backoff_max")?
                .unwrap_or(defaults.backoff_max),
        };

        if controller.requeue_interval.is_zero() {
            anyhow::bail!("requeue_interval must be greater than zero");
        }
        if controller.backoff_base > controller.backoff_max {
            anyhow::bail!("backoff_base must not exceed backoff_max");
        }

        let probe_addr = match self.probe_addr.or(file.probe_addr) {
            Some(addr) => addr,
            None => DEFAULT_PROBE_ADDR.parse()?,
        };

        Ok(Settings {
            controller,
            probe_addr,
        })
    }
}

/// Bound connection setup to the API server by `timeout`.
///
/// Read and write timeouts keep the client defaults: watch requests are
/// long polls that stay silent for minutes, and a short read timeout would
/// break them.
pub fn apply_api_timeout(config: &mut kube::Config, timeout: Duration) {
    config.connect_timeout = Some(timeout);
}

/// Parse a duration string like "30s", "500ms", "5m", or plain seconds.
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    let parsed = if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().map(Duration::from_secs)
    };
    parsed.with_context(|| format!("invalid duration {s:?}"))
}
