use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time;
use tokio_native_tls::TlsConnector;

use crate::error::HandshakeError;
use crate::targets::DialTarget;

/// Dials targets and hands back whatever leaf certificate they present.
///
/// The chain is never verified: the goal is to read the certificate, not to
/// trust it.
#[derive(Clone)]
pub struct CertFetcher {
    connector: TlsConnector,
    timeout: Duration,
}

impl CertFetcher {
    pub fn new(timeout: Duration) -> Result<Self, native_tls::Error> {
        let connector = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .use_sni(false)
            .build()?;
        Ok(Self {
            connector: TlsConnector::from(connector),
            timeout,
        })
    }

    /// Connect and handshake within one deadline, returning the DER of the
    /// first certificate in the peer's chain.
    pub async fn fetch(&self, target: DialTarget) -> Result<Vec<u8>, HandshakeError> {
        match time::timeout(self.timeout, self.handshake(target)).await {
            Ok(res) => res,
            Err(_) => Err(HandshakeError::Timeout {
                target,
                timeout: self.timeout,
            }),
        }
    }

    async fn handshake(&self, target: DialTarget) -> Result<Vec<u8>, HandshakeError> {
        let stream = TcpStream::connect(target.addr())
            .await
            .map_err(|source| HandshakeError::Connect { target, source })?;

        let domain = target.ip().to_string();
        let tls = self
            .connector
            .connect(&domain, stream)
            .await
            .map_err(|source| HandshakeError::Tls { target, source })?;

        let cert = tls
            .get_ref()
            .peer_certificate()
            .map_err(|source| HandshakeError::Tls { target, source })?
            .ok_or(HandshakeError::NoCertificate { target })?;

        cert.to_der()
            .map_err(|source| HandshakeError::Tls { target, source })
    }
}
