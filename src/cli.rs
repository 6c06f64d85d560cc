use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

/// Ping-based network monitor: probes a destination via ICMP echo and raises
/// throttled alerts when outages exceed the allowable downtime.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "netwatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Destination IP to probe [default: 8.8.8.8]
    #[arg(short = 'd', long = "dst-ip")]
    pub dst_ip: Option<IpAddr>,

    /// Seconds of downtime tolerated before outage alerts fire [default: 5]
    #[arg(long)]
    pub allowable_downtime: Option<u64>,

    /// Minimum seconds between repeated outage log lines [default: 5]
    #[arg(long)]
    pub error_log_interval: Option<u64>,

    /// Minimum seconds between desktop notifications, 0 disables [default: 30]
    #[arg(long)]
    pub notify_interval: Option<u64>,

    /// Suppress the audible beep on failed probes.
    #[arg(short, long)]
    pub silent: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// User whose desktop session receives notifications.
    #[arg(long)]
    pub notify_user: Option<String>,

    /// Path to a TOML config file (overrides the default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Parse CLI arguments from an iterator of strings.
/// Useful for testing.
pub fn parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}

/// Maps the repeatable `-v` flag onto an `env_logger` default filter.
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}
