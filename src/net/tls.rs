//! TLS termination.
//!
//! # Responsibilities
//! - Load certificate chain and private key from PEM files
//! - Build the rustls server context and acceptor
//!
//! # Design Decisions
//! - rustls only (no OpenSSL dependency)
//! - Handshake runs async on the connection task, never on the accept loop

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use crate::config::TlsConfig;

/// Error type for TLS context assembly.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("failed to read TLS material: {0}")]
    Io(#[from] std::io::Error),
    #[error("no valid certificate found in '{0}'")]
    NoCertificate(String),
    #[error("no valid private key found in '{0}'")]
    NoPrivateKey(String),
    #[error("failed to build TLS context: {0}")]
    Config(#[from] tokio_rustls::rustls::Error),
}

/// Assemble a TLS acceptor from PEM cert/key paths.
pub fn build_acceptor(config: &TlsConfig) -> Result<TlsAcceptor, TlsError> {
    let mut cert_file = BufReader::new(File::open(&config.cert_path)?);
    let certs = rustls_pemfile::certs(&mut cert_file).collect::<Result<Vec<_>, _>>()?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificate(config.cert_path.clone()));
    }

    let mut key_file = BufReader::new(File::open(&config.key_path)?);
    let private_key = rustls_pemfile::private_key(&mut key_file)?
        .ok_or_else(|| TlsError::NoPrivateKey(config.key_path.clone()))?;

    let server_config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, private_key)?;

    Ok(TlsAcceptor::from(Arc::new(server_config)))
}
