use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::targets::DialTarget;

/// Invalid or missing scan configuration. Fatal before any target is dialed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no input detected, please use the -i flag to add input")]
    MissingInput,
    #[error("invalid port `{value}`: {reason}")]
    InvalidPort { value: String, reason: String },
    #[error("port list is empty")]
    NoPorts,
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("timeout must be at least 1 second")]
    ZeroTimeout,
    #[error("failed to read input file {}", .path.display())]
    InputFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A host specification that is neither an IP address nor a CIDR block.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid host specification `{spec}`: {reason}")]
pub struct EnumerationError {
    pub spec: String,
    pub reason: String,
}

/// Per-target failure while fetching a certificate. Never leaves the worker.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("{target}: connection failed")]
    Connect {
        target: DialTarget,
        #[source]
        source: io::Error,
    },
    #[error("{target}: timed out after {}s", .timeout.as_secs())]
    Timeout { target: DialTarget, timeout: Duration },
    #[error("{target}: TLS handshake failed")]
    Tls {
        target: DialTarget,
        #[source]
        source: native_tls::Error,
    },
    #[error("{target}: no certificate presented")]
    NoCertificate { target: DialTarget },
    #[error("{target}: unparseable certificate: {reason}")]
    BadCertificate { target: DialTarget, reason: String },
}

impl HandshakeError {
    pub fn target(&self) -> DialTarget {
        match self {
            HandshakeError::Connect { target, .. }
            | HandshakeError::Timeout { target, .. }
            | HandshakeError::Tls { target, .. }
            | HandshakeError::NoCertificate { target }
            | HandshakeError::BadCertificate { target, .. } => *target,
        }
    }
}

/// Failure to put one line on the output stream.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to encode record")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write record")]
    Write(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn cause_is_chained_not_repeated() {
        let target = DialTarget::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 443);
        let err = HandshakeError::Connect {
            target,
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused by peer"),
        };
        assert_eq!(err.to_string(), "192.0.2.1:443: connection failed");
        assert_eq!(err.source().unwrap().to_string(), "refused by peer");

        let err = ConfigError::InputFile {
            path: PathBuf::from("/tmp/hosts.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let chained = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(chained, "failed to read input file /tmp/hosts.txt: denied");
    }
}
