use std::time::Instant;

use log::{debug, error, info, warn};
use tokio::{select, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::alert::AlertSink;
use crate::config::{IFACE_RECHECK_INTERVAL, MonitorConfig, POLL_INTERVAL};
use crate::error::Error;
use crate::iface::InterfaceResolver;
use crate::probe::{IcmpProber, ProbeError, ProbeOutcome};
use crate::tracker::{OutageTracker, format_duration};

/// Continuously probes the configured destination and dispatches outage
/// alerts.
///
/// Runs one probe at a time on a fixed cadence: the 1 s sleep is measured
/// from the end of one tick's work to the start of the next, so the real
/// period is probe time plus one second. The loop runs until cancelled; the
/// only other exit is a fatal probe error, which propagates so the process
/// can terminate with a non-zero status.
pub async fn run(
    config: &MonitorConfig,
    sink: &AlertSink,
    token: CancellationToken,
) -> Result<(), Error> {
    log_startup(config, sink);

    let mut resolver = InterfaceResolver::new();
    resolver.refresh();
    match resolver.current() {
        Some(name) => info!("Default interface: {name}"),
        None => warn!("No default interface detected, probing unbound"),
    }

    let mut prober = IcmpProber::new(config.destination, resolver.current())?;
    let mut tracker = OutageTracker::new(config, Instant::now());
    let mut last_iface_check = Instant::now();

    loop {
        // Check if we should shutdown before starting a new tick
        if token.is_cancelled() {
            info!("Shutdown requested, stopping monitor");
            break;
        }

        if last_iface_check.elapsed() >= IFACE_RECHECK_INTERVAL {
            if resolver.refresh() {
                info!(
                    "Default interface changed to {}",
                    resolver.current().unwrap_or("<none>")
                );
                if let Err(e) = prober.rebind(resolver.current()) {
                    warn!("Failed to rebind prober, keeping previous socket: {e}");
                }
            }
            last_iface_check = Instant::now();
        }

        match prober.probe().await {
            Ok(outcome) => {
                if let ProbeOutcome::Reachable { latency } = outcome {
                    debug!(
                        "{} replied in {}",
                        config.destination,
                        format_duration(latency)
                    );
                }
                for event in tracker.observe(&outcome, Instant::now()) {
                    sink.dispatch(&event).await;
                }
            }
            Err(ProbeError::Anomalous(detail)) => {
                // Inconclusive tick: no state transition.
                error!("Ignoring anomalous probe result: {detail}");
            }
            Err(fatal) => {
                error!("Probe transport failed, terminating: {fatal}");
                return Err(fatal.into());
            }
        }

        // Interruptible sleep
        select! {
            () = sleep(POLL_INTERVAL) => {}
            () = token.cancelled() => {
                info!("Shutdown requested during sleep");
                break;
            }
        }
    }

    info!("Network monitoring stopped gracefully");
    Ok(())
}

fn log_startup(config: &MonitorConfig, sink: &AlertSink) {
    info!("Starting network monitoring...");
    info!("Destination: {}", config.destination);
    info!(
        "Allowable downtime: {}",
        format_duration(config.allowable_downtime)
    );
    info!(
        "Error log interval: {}",
        format_duration(config.error_log_interval)
    );
    if config.notify_interval.is_zero() {
        info!("Notify interval: disabled");
    } else {
        info!(
            "Notify interval: {}",
            format_duration(config.notify_interval)
        );
    }
    match (config.notify_user.is_some(), config.webhook_url.is_some()) {
        (true, true) => {
            info!("Desktop and webhook channels are set, notifications go to both");
        }
        (true, false) => info!("Desktop notifications will be sent on outage"),
        (false, true) => info!("Webhook notifications will be sent on outage"),
        (false, false) => warn!("No notification channel is set, outages will only be logged"),
    }
    if config.silent {
        info!("Silent mode: audible beep disabled");
    }
    if !sink.notifier().has_channel() && !config.notify_interval.is_zero() {
        debug!("Notify events will be generated but have nowhere to go");
    }
}
