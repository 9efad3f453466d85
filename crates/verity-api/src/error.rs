use thiserror::Error;

/// Top-level error type for the `verity-api` crate.
///
/// Covers every failure mode of a single invocation: resolving a session,
/// authenticating, and executing the resource call. Nothing here is retried
/// internally -- each variant is terminal for the call that produced it.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Network, HTTP status, or JSON-decode failure while authenticating.
    #[error("Authentication failed: {message}")]
    AuthTransport { message: String },

    /// The auth endpoint answered with well-formed JSON but no token.
    #[error("Authentication succeeded but no token returned")]
    AuthMissingToken { response: serde_json::Value },

    /// Neither a token nor a complete username/password pair was supplied.
    #[error("Either token or username/password must be provided")]
    MissingCredentials,

    /// The session token cannot be carried in a `Cookie` header.
    #[error("Session token contains characters not allowed in an HTTP header")]
    InvalidToken,

    // ── Resource calls ──────────────────────────────────────────────
    /// Transport-level failure during a create/update/delete call.
    #[error("{resource} API call failed: {source}")]
    ResourceCall {
        resource: String,
        #[source]
        source: reqwest::Error,
    },

    // ── Boundary ────────────────────────────────────────────────────
    /// Action string outside `create`, `update`, `delete`.
    #[error("Unknown action '{0}': expected one of create, update, delete")]
    InvalidAction(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),
}

impl Error {
    /// Returns `true` if the failure happened while obtaining a session.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::AuthTransport { .. }
                | Self::AuthMissingToken { .. }
                | Self::MissingCredentials
                | Self::InvalidToken
        )
    }

    /// Returns `true` if this is a transient error worth retrying by the caller.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ResourceCall { source, .. } => source.is_timeout() || source.is_connect(),
            _ => false,
        }
    }

    /// The resource name a failed call was labeled with, if any.
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::ResourceCall { resource, .. } => Some(resource),
            _ => None,
        }
    }
}
