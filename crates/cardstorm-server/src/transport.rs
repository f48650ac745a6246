//! Quinn-based QUIC transport.
//!
//! Encrypted, multiplexed streams over UDP with TLS 1.3. ALPN is set
//! to "cardstorm". TLS material comes from PEM files in production; a
//! self-signed certificate is generated for local testing when no
//! files are given.

use std::{net::SocketAddr, sync::Arc};

use cardstorm_proto::ALPN_PROTOCOL;
use quinn::{Endpoint, RecvStream, SendStream, ServerConfig};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};

use crate::error::ServerError;

/// QUIC listener endpoint.
pub struct QuinnTransport {
    endpoint: Endpoint,
}

impl QuinnTransport {
    /// Create and bind a new QUIC transport.
    ///
    /// With `cert_path` and `key_path` the given PEM material is used;
    /// otherwise a self-signed certificate is generated (testing only,
    /// logged as a warning).
    pub fn bind(
        address: &str,
        cert_path: Option<String>,
        key_path: Option<String>,
    ) -> Result<Self, ServerError> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| ServerError::Config(format!("invalid bind address '{address}': {e}")))?;

        let server_config = match (cert_path, key_path) {
            (Some(cert), Some(key)) => load_pem_config(&cert, &key)?,
            _ => self_signed_config()?,
        };

        let endpoint = Endpoint::server(server_config, addr)
            .map_err(|e| ServerError::Transport(format!("failed to create endpoint: {e}")))?;

        tracing::info!("QUIC transport bound to {addr}");

        Ok(Self { endpoint })
    }

    /// Accept the next QUIC connection.
    pub async fn accept(&self) -> Result<QuinnConnection, ServerError> {
        let incoming = self
            .endpoint
            .accept()
            .await
            .ok_or_else(|| ServerError::Transport("endpoint closed".to_string()))?;

        let connection = incoming
            .await
            .map_err(|e| ServerError::Transport(format!("connection failed: {e}")))?;

        Ok(QuinnConnection { connection })
    }

    /// Local address the transport is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.endpoint
            .local_addr()
            .map_err(|e| ServerError::Transport(format!("failed to get local address: {e}")))
    }
}

/// One client connection.
///
/// Clones are cheap and share the underlying QUIC connection, so the
/// accept loop and per-stream tasks can hold it concurrently.
#[derive(Clone)]
pub struct QuinnConnection {
    connection: quinn::Connection,
}

impl QuinnConnection {
    /// Accept a client-initiated bidirectional stream.
    pub async fn accept_bi(&self) -> Result<(SendStream, RecvStream), ServerError> {
        self.connection
            .accept_bi()
            .await
            .map_err(|e| ServerError::Transport(format!("accept_bi failed: {e}")))
    }

    /// Open the server's unidirectional push stream.
    pub async fn open_uni(&self) -> Result<SendStream, ServerError> {
        self.connection
            .open_uni()
            .await
            .map_err(|e| ServerError::Transport(format!("open_uni failed: {e}")))
    }

    /// Remote peer address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.connection.remote_address()
    }

    /// Close the connection with an error code and reason.
    pub fn close(&self, error_code: quinn::VarInt, reason: &[u8]) {
        self.connection.close(error_code, reason);
    }
}

fn build_server_config(
    cert_chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
) -> Result<ServerConfig, ServerError> {
    let mut tls_config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(cert_chain, key)
        .map_err(|e| ServerError::Config(format!("invalid TLS config: {e}")))?;

    tls_config.alpn_protocols = vec![ALPN_PROTOCOL.to_vec()];

    Ok(ServerConfig::with_crypto(Arc::new(
        quinn::crypto::rustls::QuicServerConfig::try_from(tls_config)
            .map_err(|e| ServerError::Config(format!("QUIC config error: {e}")))?,
    )))
}

fn load_pem_config(cert_path: &str, key_path: &str) -> Result<ServerConfig, ServerError> {
    let cert_pem = std::fs::read(cert_path)
        .map_err(|e| ServerError::Config(format!("failed to read cert '{cert_path}': {e}")))?;
    let key_pem = std::fs::read(key_path)
        .map_err(|e| ServerError::Config(format!("failed to read key '{key_path}': {e}")))?;

    let certs = rustls_pemfile::certs(&mut &cert_pem[..])
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::Config(format!("failed to parse certificates: {e}")))?;

    let key = rustls_pemfile::private_key(&mut &key_pem[..])
        .map_err(|e| ServerError::Config(format!("failed to parse private key: {e}")))?
        .ok_or_else(|| ServerError::Config("no private key found".to_string()))?;

    build_server_config(certs, key)
}

fn self_signed_config() -> Result<ServerConfig, ServerError> {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
        .map_err(|e| ServerError::Config(format!("failed to generate self-signed cert: {e}")))?;

    let cert_chain = vec![cert.cert.der().clone()];
    let key = rustls::pki_types::PrivatePkcs8KeyDer::from(cert.key_pair.serialize_der());

    tracing::warn!("using self-signed certificate, not suitable for production");

    build_server_config(cert_chain, key.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transport_binds_with_self_signed() {
        let transport = QuinnTransport::bind("127.0.0.1:0", None, None).unwrap();
        let addr = transport.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn transport_rejects_invalid_address() {
        assert!(QuinnTransport::bind("not-an-address", None, None).is_err());
    }
}
