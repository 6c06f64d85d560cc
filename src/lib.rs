pub mod alert;
pub mod cli;
pub mod config;
pub mod error;
pub mod iface;
pub mod monitor;
pub mod probe;
pub mod tracker;

pub use alert::{AlertSink, Notifier};
pub use config::MonitorConfig;
pub use error::Error;
pub use probe::{IcmpProber, ProbeError, ProbeOutcome};
pub use tracker::{AlertEvent, AlertKind, OutageTracker};
