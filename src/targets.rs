use std::fmt;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use ipnet::IpNet;
use tracing::warn;

use crate::error::{ConfigError, EnumerationError};

/// One `host:port` endpoint, consumed by exactly one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DialTarget {
    addr: SocketAddr,
}

impl DialTarget {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::new(ip, port),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

impl fmt::Display for DialTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.addr.fmt(f)
    }
}

/// Where the raw `-i` value points: a file of host specs or an inline list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    List(String),
}

impl InputSource {
    /// Classify the raw input once. An existing regular file wins over a literal list.
    pub fn resolve(raw: &str) -> Self {
        let path = Path::new(raw);
        if path.is_file() {
            InputSource::File(path.to_path_buf())
        } else {
            InputSource::List(raw.to_string())
        }
    }

    /// Host specification tokens in input order.
    ///
    /// File bytes are decoded lossily: a line that is not valid UTF-8 turns
    /// into a malformed spec and is skipped later instead of failing the read.
    pub fn host_specs(&self) -> Result<Vec<String>, ConfigError> {
        match self {
            InputSource::File(path) => {
                let bytes = fs::read(path).map_err(|source| ConfigError::InputFile {
                    path: path.clone(),
                    source,
                })?;
                Ok(parse_spec_lines(&String::from_utf8_lossy(&bytes)))
            }
            InputSource::List(list) => Ok(list
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect()),
        }
    }
}

/// One line per host spec; `#` starts a comment, blank lines are ignored.
pub fn parse_spec_lines(s: &str) -> Vec<String> {
    s.lines()
        .map(|raw| raw.split('#').next().map(str::trim).unwrap_or(""))
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// A single address or a CIDR block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSpec {
    Single(IpAddr),
    Block(IpNet),
}

impl FromStr for HostSpec {
    type Err = EnumerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = |e: &dyn fmt::Display| EnumerationError {
            spec: s.to_string(),
            reason: e.to_string(),
        };
        if s.contains('/') {
            s.parse::<IpNet>()
                .map(|net| HostSpec::Block(net.trunc()))
                .map_err(|e| err(&e))
        } else {
            s.parse::<IpAddr>()
                .map(HostSpec::Single)
                .map_err(|e| err(&e))
        }
    }
}

impl HostSpec {
    /// Usable host addresses in ascending order.
    ///
    /// IPv4 blocks shorter than /31 skip the network and broadcast
    /// addresses; /31 and /32 yield every address. IPv6 blocks yield every
    /// address.
    pub fn hosts(&self) -> Box<dyn Iterator<Item = IpAddr> + Send> {
        match *self {
            HostSpec::Single(ip) => Box::new(std::iter::once(ip)),
            HostSpec::Block(net) => Box::new(net.hosts()),
        }
    }
}

/// Cross host specs with ports, host-major and port-minor.
///
/// Specs that fail to parse are logged and skipped. Expansion is lazy so
/// large blocks are never held in memory.
pub fn enumerate_targets(
    specs: Vec<String>,
    ports: &[u16],
) -> impl Iterator<Item = DialTarget> + Send {
    let ports: Arc<[u16]> = Arc::from(ports);
    specs
        .into_iter()
        .filter_map(|spec| match spec.parse::<HostSpec>() {
            Ok(hs) => Some(hs),
            Err(e) => {
                warn!("skipping {e}");
                None
            }
        })
        .flat_map(|hs| hs.hosts())
        .flat_map(move |ip| {
            let ports = Arc::clone(&ports);
            (0..ports.len()).map(move |i| DialTarget::new(ip, ports[i]))
        })
}
