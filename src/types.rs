use serde::{Deserialize, Serialize};

use crate::cert::CertDetails;
use crate::targets::DialTarget;

/// One scraped certificate, written as a single JSON line.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub struct CertificateRecord {
    pub org_name: String,
    /// The dialed `host:port`.
    pub ip: String,
    pub dns_names: Vec<String>,
}

impl CertificateRecord {
    pub fn new(target: DialTarget, details: CertDetails) -> Self {
        Self {
            org_name: details.organization,
            ip: target.to_string(),
            dns_names: details.dns_names,
        }
    }
}

/// Final counters for a scan session.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub dispatched: u64,
    pub succeeded: u64,
    pub failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn record_serializes_with_wire_field_names() {
        let rec = CertificateRecord::new(
            DialTarget::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 443),
            CertDetails {
                organization: "Acme Corp".into(),
                dns_names: vec!["api.acme.test".into(), "www.acme.test".into()],
            },
        );
        assert_eq!(
            serde_json::to_string(&rec).unwrap(),
            r#"{"OrgName":"Acme Corp","Ip":"10.0.0.1:443","DnsNames":["api.acme.test","www.acme.test"]}"#
        );
    }
}
