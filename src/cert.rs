use x509_parser::nom;
use x509_parser::prelude::*;

/// Placeholder used when the subject carries no organization.
pub const NO_ORGANIZATION: &str = "N/A";

/// The fields pulled from a leaf certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertDetails {
    pub organization: String,
    pub dns_names: Vec<String>,
}

/// Read the subject organization and the DNS subject-alternative names from
/// a DER-encoded certificate.
///
/// Names are returned in encoding order, without dedup or sorting.
pub fn extract(der: &[u8]) -> Result<CertDetails, X509Error> {
    let (_, cert) = X509Certificate::from_der(der).map_err(|e| match e {
        nom::Err::Error(e) | nom::Err::Failure(e) => e,
        nom::Err::Incomplete(_) => X509Error::InvalidCertificate,
    })?;

    let organization = cert
        .subject()
        .iter_organization()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| NO_ORGANIZATION.to_string());

    let mut dns_names = Vec::new();
    if let Some(san) = cert.subject_alternative_name()? {
        for name in &san.value.general_names {
            if let GeneralName::DNSName(dns) = name {
                dns_names.push(dns.to_string());
            }
        }
    }

    Ok(CertDetails {
        organization,
        dns_names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SanType};

    fn der_for(org: Option<&str>, sans: Vec<SanType>) -> Vec<u8> {
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, "scrape test");
        if let Some(org) = org {
            dn.push(DnType::OrganizationName, org);
        }
        params.distinguished_name = dn;
        params.subject_alt_names = sans;
        let key = KeyPair::generate().unwrap();
        params.self_signed(&key).unwrap().der().to_vec()
    }

    fn dns(name: &str) -> SanType {
        SanType::DnsName(name.try_into().unwrap())
    }

    #[test]
    fn organization_and_dns_names_in_order() {
        let der = der_for(
            Some("Acme Corp"),
            vec![dns("www.acme.test"), dns("api.acme.test"), dns("www.acme.test")],
        );
        let details = extract(&der).unwrap();
        assert_eq!(details.organization, "Acme Corp");
        assert_eq!(
            details.dns_names,
            vec!["www.acme.test", "api.acme.test", "www.acme.test"]
        );
    }

    #[test]
    fn missing_organization_is_sentinel() {
        let der = der_for(None, vec![dns("host.example.test")]);
        let details = extract(&der).unwrap();
        assert_eq!(details.organization, NO_ORGANIZATION);
        assert_eq!(details.dns_names, vec!["host.example.test"]);
    }

    #[test]
    fn non_dns_sans_are_ignored() {
        let der = der_for(
            Some("Acme Corp"),
            vec![
                SanType::IpAddress("10.0.0.1".parse().unwrap()),
                dns("only.acme.test"),
            ],
        );
        assert_eq!(extract(&der).unwrap().dns_names, vec!["only.acme.test"]);
    }

    #[test]
    fn no_san_extension_gives_empty_list() {
        let der = der_for(Some("Acme Corp"), Vec::new());
        assert!(extract(&der).unwrap().dns_names.is_empty());
    }

    #[test]
    fn garbage_der_is_rejected() {
        assert!(extract(b"definitely not a certificate").is_err());
    }
}
