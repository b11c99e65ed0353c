//! Library crate for cert-scrape: concurrent TLS certificate reconnaissance
//! over IPs, CIDR blocks and host lists.
pub mod cert;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod targets;
pub mod tls;
pub mod types;
