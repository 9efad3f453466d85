// Shared transport configuration for building the reqwest::Client.
//
// The authenticator and the resource dispatcher share one client, so TLS
// and timeout settings live here rather than in either of them.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// TLS verification mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-signed controllers).
    DangerAcceptInvalid,
}

impl TlsMode {
    /// Map the plain "skip certificate validation" toggle onto a mode.
    pub fn from_insecure(insecure: bool) -> Self {
        if insecure {
            Self::DangerAcceptInvalid
        } else {
            Self::System
        }
    }
}

/// Shared transport configuration for building HTTP clients.
///
/// `timeout` bounds resource calls. `None` leaves reqwest's default
/// (no timeout) in place. Authentication ignores it and always uses
/// [`AUTH_TIMEOUT`](crate::auth::AUTH_TIMEOUT).
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Option<Duration>,
}

impl TransportConfig {
    pub fn new(tls: TlsMode) -> Self {
        Self { tls, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder =
            reqwest::Client::builder().user_agent(concat!("verity/", env!("CARGO_PKG_VERSION")));

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
