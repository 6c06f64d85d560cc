use log::warn;

/// Tracks the default egress interface so the prober can stay bound to it as
/// the network environment changes (wifi roam, cable swap, VPN up/down).
///
/// Resolution failures are fail-open: the previously known interface is
/// retained and the monitor keeps running.
#[derive(Debug, Default)]
pub struct InterfaceResolver {
    current: Option<String>,
}

impl InterfaceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Re-reads the routing table. Returns `true` when the default interface
    /// changed since the last successful resolution.
    pub fn refresh(&mut self) -> bool {
        match default_interface() {
            Some(name) => {
                if self.current.as_deref() == Some(name.as_str()) {
                    false
                } else {
                    self.current = Some(name);
                    true
                }
            }
            None => {
                warn!("Could not determine default interface, keeping previous");
                false
            }
        }
    }
}

/// Get the default network interface (the one carrying the default route).
/// Returns None if no default interface can be determined.
fn default_interface() -> Option<String> {
    let route_content = std::fs::read_to_string("/proc/net/route").ok()?;
    parse_route_table(&route_content)
}

/// Parse /proc/net/route content to find the default interface.
/// Extracted for testability.
fn parse_route_table(content: &str) -> Option<String> {
    for line in content.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() >= 2 {
            // Default route has destination 00000000
            if fields[1] == "00000000" {
                return Some(fields[0].to_string());
            }
        }
    }

    None
}
