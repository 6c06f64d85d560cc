use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::fs;

use serde::Deserialize;
use url::Url;

use crate::cli::Cli;
use crate::error::Error;

pub const DEFAULT_DST_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8));
pub const DEFAULT_ALLOWABLE_DOWNTIME_SECS: u64 = 5;
pub const DEFAULT_ERROR_LOG_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_NOTIFY_INTERVAL_SECS: u64 = 30;

/// Delay between the end of one tick's work and the start of the next.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Minimum spacing between default-interface re-checks.
pub const IFACE_RECHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Optional TOML config file. Every key mirrors a CLI flag; CLI wins.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub dst_ip: Option<IpAddr>,
    pub allowable_downtime_secs: Option<u64>,
    pub error_log_interval_secs: Option<u64>,
    pub notify_interval_secs: Option<u64>,
    pub silent: Option<bool>,
    pub notify_user: Option<String>,
    pub webhook_url: Option<String>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<FileConfig, Error> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("netwatch").join("config.toml"))
    }
}

/// Immutable configuration snapshot consumed by the monitor loop.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub destination: IpAddr,
    pub allowable_downtime: Duration,
    pub error_log_interval: Duration,
    /// Zero disables desktop notification entirely.
    pub notify_interval: Duration,
    pub silent: bool,
    pub notify_user: Option<String>,
    pub webhook_url: Option<Url>,
}

impl MonitorConfig {
    /// Resolves the effective configuration: config file (explicit path or
    /// default location) under CLI overrides, with a `WEBHOOK_URL` env
    /// fallback for the webhook channel.
    pub fn resolve(cli: &Cli) -> Result<MonitorConfig, Error> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => match FileConfig::default_path() {
                Some(path) if path.exists() => FileConfig::load(path)?,
                _ => FileConfig::default(),
            },
        };
        Self::merge(cli, &file)
    }

    fn merge(cli: &Cli, file: &FileConfig) -> Result<MonitorConfig, Error> {
        let webhook_raw = file
            .webhook_url
            .clone()
            .or_else(|| dotenvy::var("WEBHOOK_URL").ok());
        let webhook_url = webhook_raw.map(|raw| Url::parse(&raw)).transpose()?;

        Ok(MonitorConfig {
            destination: cli.dst_ip.or(file.dst_ip).unwrap_or(DEFAULT_DST_IP),
            allowable_downtime: Duration::from_secs(
                cli.allowable_downtime
                    .or(file.allowable_downtime_secs)
                    .unwrap_or(DEFAULT_ALLOWABLE_DOWNTIME_SECS),
            ),
            error_log_interval: Duration::from_secs(
                cli.error_log_interval
                    .or(file.error_log_interval_secs)
                    .unwrap_or(DEFAULT_ERROR_LOG_INTERVAL_SECS),
            ),
            notify_interval: Duration::from_secs(
                cli.notify_interval
                    .or(file.notify_interval_secs)
                    .unwrap_or(DEFAULT_NOTIFY_INTERVAL_SECS),
            ),
            silent: cli.silent || file.silent.unwrap_or(false),
            notify_user: cli.notify_user.clone().or_else(|| file.notify_user.clone()),
            webhook_url,
        })
    }
}
