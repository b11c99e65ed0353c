use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

pub const DEFAULT_PORTS: &str = "443";
pub const DEFAULT_CONCURRENCY: usize = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 4;
/// Upper bound on workers; larger requests are clamped.
pub const MAX_CONCURRENCY: usize = 5_000;

/// Immutable settings for one scan session, shared read-only by all workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub concurrency: usize,
    pub ports: Vec<u16>,
    pub timeout: Duration,
    /// Comma-separated IPs/CIDRs, or a path to a file with one per line.
    pub input: String,
    /// Write a diagnostic line for every failed target.
    pub show_failures: bool,
}

impl ScanConfig {
    pub fn new(
        input: Option<String>,
        port_list: &str,
        concurrency: usize,
        timeout_secs: u64,
        show_failures: bool,
    ) -> Result<Self, ConfigError> {
        let input = input
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingInput)?;
        if concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if concurrency > MAX_CONCURRENCY {
            warn!("concurrency {concurrency} capped at {MAX_CONCURRENCY}");
        }
        let concurrency = concurrency.min(MAX_CONCURRENCY);
        let ports = parse_port_list(port_list)?;
        Ok(Self {
            concurrency,
            ports,
            timeout: Duration::from_secs(timeout_secs),
            input,
            show_failures,
        })
    }
}

/// Parse a comma-separated port list such as `443,8443`.
///
/// Order and duplicates are kept as given, since every listed port is dialed
/// once per host.
pub fn parse_port_list(s: &str) -> Result<Vec<u16>, ConfigError> {
    if s.trim().is_empty() {
        return Err(ConfigError::NoPorts);
    }
    s.split(',').map(|tok| parse_port_str(tok.trim())).collect()
}

fn parse_port_str(s: &str) -> Result<u16, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidPort {
        value: s.to_string(),
        reason,
    };
    if s.is_empty() {
        return Err(invalid("empty entry".into()));
    }
    let val: u32 = s.parse::<u32>().map_err(|e| invalid(e.to_string()))?;
    if val == 0 || val > 65535 {
        return Err(invalid(format!("port out of range: {val}")));
    }
    Ok(val as u16)
}
