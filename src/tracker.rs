use std::time::{Duration, Instant};

use crate::config::MonitorConfig;
use crate::probe::ProbeOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Beep,
    LogError,
    Notify,
}

/// One alert firing decided by the tracker. Ephemeral, never persisted.
#[derive(Debug, Clone)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub message: String,
    pub outage: Duration,
}

/// Outage-tracking state machine. Consumes a stream of probe outcomes and
/// decides when to fire beep/log/notify events, each throttled independently.
///
/// Connectivity is confirmed at construction: an immediate failure accrues
/// downtime from monitor start, not from some epoch. The log and notify
/// throttles deliberately survive a Down -> Up -> Down flap so intermittent
/// loss cannot produce an alert storm.
pub struct OutageTracker {
    target: String,
    allowable_downtime: Duration,
    error_log_interval: Duration,
    notify_interval: Duration,
    silent: bool,
    /// Wall-clock moment connectivity was last confirmed.
    since: Instant,
    /// `None` means never fired, so the first qualifying outage always does.
    last_logged_at: Option<Instant>,
    last_notified_at: Option<Instant>,
    /// Most recently composed outage message, reused when a notify fires on a
    /// tick whose log firing was suppressed.
    last_message: String,
}

impl OutageTracker {
    pub fn new(config: &MonitorConfig, start: Instant) -> Self {
        Self {
            target: config.destination.to_string(),
            allowable_downtime: config.allowable_downtime,
            error_log_interval: config.error_log_interval,
            notify_interval: config.notify_interval,
            silent: config.silent,
            since: start,
            last_logged_at: None,
            last_notified_at: None,
            last_message: String::new(),
        }
    }

    /// Feeds one probe outcome into the state machine, returning the alert
    /// events to dispatch for this tick.
    pub fn observe(&mut self, outcome: &ProbeOutcome, now: Instant) -> Vec<AlertEvent> {
        match outcome {
            ProbeOutcome::Reachable { .. } => {
                self.since = now;
                Vec::new()
            }
            ProbeOutcome::Unreachable => self.on_unreachable(now),
        }
    }

    fn on_unreachable(&mut self, now: Instant) -> Vec<AlertEvent> {
        let outage = now.duration_since(self.since);
        let mut events = Vec::new();

        if !self.silent {
            events.push(AlertEvent {
                kind: AlertKind::Beep,
                message: String::new(),
                outage,
            });
        }

        // Blips at or under the threshold are not errors. Strictly greater.
        if outage <= self.allowable_downtime {
            return events;
        }

        let log_due = self
            .last_logged_at
            .is_none_or(|at| now.duration_since(at) > self.error_log_interval);
        if log_due {
            self.last_message = outage_message(&self.target, outage);
            self.last_logged_at = Some(now);
            events.push(AlertEvent {
                kind: AlertKind::LogError,
                message: self.last_message.clone(),
                outage,
            });
        }

        // Zero interval is a permanent disable switch, checked before any
        // elapsed-time comparison.
        if !self.notify_interval.is_zero() {
            let notify_due = self
                .last_notified_at
                .is_none_or(|at| now.duration_since(at) > self.notify_interval);
            if notify_due {
                self.last_notified_at = Some(now);
                events.push(AlertEvent {
                    kind: AlertKind::Notify,
                    message: self.last_message.clone(),
                    outage,
                });
            }
        }

        events
    }
}

pub fn outage_message(target: &str, outage: Duration) -> String {
    format!("{target} unreachable for {}", format_duration(outage))
}

pub fn format_duration(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_DST_IP;

    fn config(
        allowable_downtime: u64,
        error_log_interval: u64,
        notify_interval: u64,
        silent: bool,
    ) -> MonitorConfig {
        MonitorConfig {
            destination: DEFAULT_DST_IP,
            allowable_downtime: Duration::from_secs(allowable_downtime),
            error_log_interval: Duration::from_secs(error_log_interval),
            notify_interval: Duration::from_secs(notify_interval),
            silent,
            notify_user: None,
            webhook_url: None,
        }
    }

    fn kinds(events: &[AlertEvent]) -> Vec<AlertKind> {
        events.iter().map(|e| e.kind).collect()
    }

    const UP: ProbeOutcome = ProbeOutcome::Reachable {
        latency: Duration::from_millis(12),
    };
    const DOWN: ProbeOutcome = ProbeOutcome::Unreachable;

    #[test]
    fn test_reachable_fires_nothing_and_resets_since() {
        let base = Instant::now();
        let mut tracker = OutageTracker::new(&config(5, 5, 30, false), base);

        let events = tracker.observe(&UP, base + Duration::from_secs(3));
        assert!(events.is_empty());
        assert_eq!(tracker.since, base + Duration::from_secs(3));
    }

    #[test]
    fn test_unreachable_does_not_reset_since() {
        let base = Instant::now();
        let mut tracker = OutageTracker::new(&config(5, 5, 30, false), base);

        tracker.observe(&DOWN, base + Duration::from_secs(1));
        tracker.observe(&DOWN, base + Duration::from_secs(2));
        assert_eq!(tracker.since, base);
    }

    #[test]
    fn test_outage_duration_non_decreasing() {
        let base = Instant::now();
        let mut tracker = OutageTracker::new(&config(0, 0, 0, false), base);

        let mut previous = Duration::ZERO;
        for tick in 1..=10 {
            let events = tracker.observe(&DOWN, base + Duration::from_secs(tick));
            let outage = events[0].outage;
            assert!(outage >= previous);
            previous = outage;
        }
    }

    #[test]
    fn test_beep_on_every_unreachable_tick() {
        let base = Instant::now();
        let mut tracker = OutageTracker::new(&config(100, 5, 30, false), base);

        for tick in 1..=5 {
            let events = tracker.observe(&DOWN, base + Duration::from_secs(tick));
            assert_eq!(kinds(&events), vec![AlertKind::Beep]);
        }
    }

    #[test]
    fn test_silent_suppresses_beep_only() {
        let base = Instant::now();
        let mut tracker = OutageTracker::new(&config(5, 5, 30, true), base);

        let events = tracker.observe(&DOWN, base + Duration::from_secs(10));
        assert_eq!(kinds(&events), vec![AlertKind::LogError, AlertKind::Notify]);
    }

    #[test]
    fn test_outage_under_threshold_fires_no_log_or_notify() {
        let base = Instant::now();
        let mut tracker = OutageTracker::new(&config(5, 5, 30, false), base);

        let events = tracker.observe(&DOWN, base + Duration::from_millis(4900));
        assert_eq!(kinds(&events), vec![AlertKind::Beep]);
    }

    #[test]
    fn test_outage_past_threshold_fires_exactly_one_log_and_notify() {
        let base = Instant::now();
        let mut tracker = OutageTracker::new(&config(5, 5, 30, false), base);

        let events = tracker.observe(&DOWN, base + Duration::from_millis(5100));
        assert_eq!(
            kinds(&events),
            vec![AlertKind::Beep, AlertKind::LogError, AlertKind::Notify]
        );
    }

    #[test]
    fn test_threshold_comparison_is_strict() {
        let base = Instant::now();
        let mut tracker = OutageTracker::new(&config(5, 5, 30, false), base);

        let events = tracker.observe(&DOWN, base + Duration::from_secs(5));
        assert_eq!(kinds(&events), vec![AlertKind::Beep]);
    }

    #[test]
    fn test_log_throttle_suppresses_close_firings() {
        let base = Instant::now();
        // Threshold 0 so every tick qualifies; notify disabled to isolate log.
        let mut tracker = OutageTracker::new(&config(0, 5, 0, true), base);

        let first = tracker.observe(&DOWN, base + Duration::from_secs(1));
        assert_eq!(kinds(&first), vec![AlertKind::LogError]);

        // 3 units later: suppressed.
        let second = tracker.observe(&DOWN, base + Duration::from_secs(4));
        assert!(second.is_empty());

        // 6 units after the first firing: fires again.
        let third = tracker.observe(&DOWN, base + Duration::from_secs(7));
        assert_eq!(kinds(&third), vec![AlertKind::LogError]);
    }

    #[test]
    fn test_zero_notify_interval_disables_notify_forever() {
        let base = Instant::now();
        let mut tracker = OutageTracker::new(&config(0, 0, 0, true), base);

        for tick in 1..=100 {
            let events = tracker.observe(&DOWN, base + Duration::from_secs(tick * 60));
            assert!(events.iter().all(|e| e.kind != AlertKind::Notify));
        }
    }

    #[test]
    fn test_first_qualifying_outage_always_fires_both() {
        let base = Instant::now();
        // Intervals far larger than the elapsed time: only the never-fired
        // sentinel can explain a firing here.
        let mut tracker = OutageTracker::new(&config(1, 3600, 3600, true), base);

        let events = tracker.observe(&DOWN, base + Duration::from_secs(2));
        assert_eq!(kinds(&events), vec![AlertKind::LogError, AlertKind::Notify]);
    }

    #[test]
    fn test_throttles_are_independent() {
        let base = Instant::now();
        let mut tracker = OutageTracker::new(&config(0, 2, 10, true), base);

        let first = tracker.observe(&DOWN, base + Duration::from_secs(1));
        assert_eq!(kinds(&first), vec![AlertKind::LogError, AlertKind::Notify]);

        // Log interval elapsed, notify interval has not: log fires alone and
        // does not reset the notify timer.
        let second = tracker.observe(&DOWN, base + Duration::from_secs(4));
        assert_eq!(kinds(&second), vec![AlertKind::LogError]);

        let third = tracker.observe(&DOWN, base + Duration::from_secs(12));
        assert_eq!(kinds(&third), vec![AlertKind::LogError, AlertKind::Notify]);
    }

    #[test]
    fn test_notify_reuses_last_message_when_log_suppressed() {
        let base = Instant::now();
        let mut tracker = OutageTracker::new(&config(0, 30, 2, true), base);

        let first = tracker.observe(&DOWN, base + Duration::from_secs(1));
        let composed = first[0].message.clone();
        assert!(composed.contains("unreachable"));

        // Log suppressed on this tick; notify must carry the message composed
        // on the earlier tick.
        let second = tracker.observe(&DOWN, base + Duration::from_secs(4));
        assert_eq!(kinds(&second), vec![AlertKind::Notify]);
        assert_eq!(second[0].message, composed);
    }

    #[test]
    fn test_flap_preserves_throttle_timers() {
        let base = Instant::now();
        let mut tracker = OutageTracker::new(&config(0, 60, 60, true), base);

        let first = tracker.observe(&DOWN, base + Duration::from_secs(1));
        assert_eq!(kinds(&first), vec![AlertKind::LogError, AlertKind::Notify]);

        // Brief recovery then failure again: the suppression window survives,
        // so nothing re-fires.
        tracker.observe(&UP, base + Duration::from_secs(2));
        let after_flap = tracker.observe(&DOWN, base + Duration::from_secs(10));
        assert!(after_flap.is_empty());
    }

    #[test]
    fn test_recovery_resets_outage_accrual() {
        let base = Instant::now();
        let mut tracker = OutageTracker::new(&config(5, 0, 0, false), base);

        tracker.observe(&DOWN, base + Duration::from_secs(4));
        tracker.observe(&UP, base + Duration::from_secs(5));

        // New outage measures from the recovery, not from monitor start.
        let events = tracker.observe(&DOWN, base + Duration::from_secs(8));
        assert_eq!(events[0].outage, Duration::from_secs(3));
        assert_eq!(kinds(&events), vec![AlertKind::Beep]);
    }

    #[test]
    fn test_three_down_ticks_then_recovery_scenario() {
        let base = Instant::now();
        let mut tracker = OutageTracker::new(&config(2, 5, 30, false), base);

        let tick1 = tracker.observe(&DOWN, base + Duration::from_secs(1));
        assert_eq!(kinds(&tick1), vec![AlertKind::Beep]);

        // Duration exactly at the threshold: strict comparison, no alert.
        let tick2 = tracker.observe(&DOWN, base + Duration::from_secs(2));
        assert_eq!(kinds(&tick2), vec![AlertKind::Beep]);

        let tick3 = tracker.observe(&DOWN, base + Duration::from_secs(3));
        assert_eq!(
            kinds(&tick3),
            vec![AlertKind::Beep, AlertKind::LogError, AlertKind::Notify]
        );

        let tick4 = tracker.observe(&UP, base + Duration::from_secs(4));
        assert!(tick4.is_empty());
        assert_eq!(tracker.since, base + Duration::from_secs(4));
    }

    #[test]
    fn test_outage_message_formatting() {
        let message = outage_message("8.8.8.8", Duration::from_millis(12_340));
        assert_eq!(message, "8.8.8.8 unreachable for 12.3s");
    }

    #[test]
    fn test_format_duration_sub_second() {
        assert_eq!(format_duration(Duration::from_millis(240)), "0.2s");
    }
}
