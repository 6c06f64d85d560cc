use std::io;
use std::net::IpAddr;
use std::time::Duration;

use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence, SurgeError};
use thiserror::Error;

/// Fixed bound on how long a single probe waits for a reply.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Echo payload size, matching the classic 64-byte ping body.
const PAYLOAD: [u8; 64] = [0x42; 64];

/// Result of one liveness probe. A timed-out or unanswered echo is a normal
/// `Unreachable` outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable { latency: Duration },
    Unreachable,
}

#[derive(Error, Debug)]
pub enum ProbeError {
    /// The transport cannot resolve any path to the target. Non-recoverable:
    /// the monitor terminates rather than poll a target it can never reach.
    #[error("no route to target: {0}")]
    NoRoute(io::Error),
    /// The ICMP socket layer itself failed. Non-recoverable.
    #[error("probe transport failure: {0}")]
    Transport(io::Error),
    /// Malformed or unexpected reply shape. The tick is inconclusive and the
    /// loop continues without a state transition.
    #[error("anomalous probe reply: {0}")]
    Anomalous(String),
}

impl ProbeError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Anomalous(_))
    }
}

/// ICMP echo prober, optionally bound to a specific egress interface.
pub struct IcmpProber {
    target: IpAddr,
    client: Client,
    sequence: u16,
}

impl IcmpProber {
    pub fn new(target: IpAddr, interface: Option<&str>) -> io::Result<Self> {
        let client = build_client(target, interface)?;
        Ok(Self {
            target,
            client,
            sequence: 0,
        })
    }

    /// Rebuilds the underlying socket against a new interface. Used when the
    /// default egress interface changes; `None` falls back to unbound probing.
    pub fn rebind(&mut self, interface: Option<&str>) -> io::Result<()> {
        self.client = build_client(self.target, interface)?;
        Ok(())
    }

    /// Sends one echo request and waits up to [`PROBE_TIMEOUT`] for the reply.
    pub async fn probe(&mut self) -> Result<ProbeOutcome, ProbeError> {
        self.sequence = self.sequence.wrapping_add(1);
        let mut pinger = self.client.pinger(self.target, ping_identifier()).await;
        pinger.timeout(PROBE_TIMEOUT);

        match pinger.ping(PingSequence(self.sequence), &PAYLOAD).await {
            Ok((_reply, latency)) => Ok(ProbeOutcome::Reachable { latency }),
            Err(SurgeError::Timeout { .. }) => Ok(ProbeOutcome::Unreachable),
            Err(SurgeError::IOError(e)) => match e.kind() {
                io::ErrorKind::NetworkUnreachable | io::ErrorKind::HostUnreachable => {
                    Err(ProbeError::NoRoute(e))
                }
                _ => Err(ProbeError::Transport(e)),
            },
            Err(other) => Err(ProbeError::Anomalous(other.to_string())),
        }
    }
}

fn build_client(target: IpAddr, interface: Option<&str>) -> io::Result<Client> {
    let kind = if target.is_ipv6() { ICMP::V6 } else { ICMP::V4 };
    let mut builder = Config::builder().kind(kind);
    if let Some(name) = interface {
        builder = builder.interface(name);
    }
    Client::new(&builder.build())
}

fn ping_identifier() -> PingIdentifier {
    PingIdentifier(u16::try_from(std::process::id() & 0xFFFF).unwrap_or(0x4E57))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomalous_is_not_fatal() {
        let err = ProbeError::Anomalous("short packet".to_string());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_no_route_is_fatal() {
        let err = ProbeError::NoRoute(io::Error::from(io::ErrorKind::NetworkUnreachable));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_transport_is_fatal() {
        let err = ProbeError::Transport(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_outcome_equality() {
        assert_eq!(ProbeOutcome::Unreachable, ProbeOutcome::Unreachable);
        assert_ne!(
            ProbeOutcome::Reachable {
                latency: Duration::from_millis(12)
            },
            ProbeOutcome::Unreachable
        );
    }
}
