#![allow(dead_code)]

use std::net::SocketAddr;

use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_native_tls::TlsAcceptor;

/// A loopback listener that lives as long as this handle.
pub struct TestServer {
    pub addr: SocketAddr,
    task: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Self-signed identity with the given subject organization and DNS SANs.
pub fn identity(org: Option<&str>, dns_names: &[&str]) -> native_tls::Identity {
    let names: Vec<String> = dns_names.iter().map(|s| s.to_string()).collect();
    let mut params = CertificateParams::new(names).expect("cert params");
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, "cert-scrape test server");
    if let Some(org) = org {
        dn.push(DnType::OrganizationName, org);
    }
    params.distinguished_name = dn;

    let key = KeyPair::generate().expect("key pair");
    let cert = params.self_signed(&key).expect("self-signed cert");
    native_tls::Identity::from_pkcs8(cert.pem().as_bytes(), key.serialize_pem().as_bytes())
        .expect("pkcs8 identity")
}

/// TLS server on 127.0.0.1 that completes a handshake for every connection.
pub async fn tls_server(org: Option<&str>, dns_names: &[&str]) -> TestServer {
    let acceptor = native_tls::TlsAcceptor::new(identity(org, dns_names)).expect("acceptor");
    let acceptor = TlsAcceptor::from(acceptor);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let task = tokio::spawn(async move {
        while let Ok((sock, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let _ = acceptor.accept(sock).await;
            });
        }
    });
    TestServer { addr, task }
}

/// Accepts TCP connections and never speaks, so handshakes hang until timeout.
pub async fn silent_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let task = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((sock, _)) = listener.accept().await {
            held.push(sock);
        }
    });
    TestServer { addr, task }
}

/// Comma-separated port list for a set of servers.
pub fn port_list(servers: &[TestServer]) -> String {
    servers
        .iter()
        .map(|s| s.addr.port().to_string())
        .collect::<Vec<_>>()
        .join(",")
}
