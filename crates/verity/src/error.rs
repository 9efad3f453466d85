//! CLI error types with miette diagnostics.
//!
//! Maps `verity_api::Error` and `ConfigError` variants into user-facing
//! errors with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use verity_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("{resource} API call failed: could not connect to controller at {url}")]
    #[diagnostic(
        code(verity::connection_failed),
        help(
            "Check that the controller is running and reachable.\n\
             URL: {url}\n\
             Self-signed certificate? Try: --insecure"
        )
    )]
    ConnectionFailed {
        resource: String,
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(verity::tls_error),
        help("Check the ca_cert path in your profile, or use --insecure (-k).")
    )]
    TlsError { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(verity::auth_failed),
        help(
            "Verify your username and password.\n\
             Store a new password with: verity config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("Authentication succeeded but no token was returned")]
    #[diagnostic(
        code(verity::auth_missing_token),
        help("Controller response: {response}")
    )]
    AuthMissingToken { response: String },

    #[error("No token or username/password available")]
    #[diagnostic(
        code(verity::no_credentials),
        help(
            "Pass --token, or --username with --password.\n\
             Or store them for a profile: verity config set-token / set-password"
        )
    )]
    NoCredentials,

    // ── Resources ────────────────────────────────────────────────────
    #[error("Unknown resource '{name}'")]
    #[diagnostic(
        code(verity::unknown_resource),
        help(
            "Known resources: {available}\n\
             Add custom ones under [resources.<name>] in the config file."
        )
    )]
    UnknownResource { name: String, available: String },

    #[error("{resource} API call failed: {message}")]
    #[diagnostic(code(verity::resource_call))]
    ResourceCall { resource: String, message: String },

    #[error("{resource} request timed out")]
    #[diagnostic(
        code(verity::timeout),
        help("Increase the timeout with --timeout or check controller responsiveness.")
    )]
    Timeout { resource: String },

    #[error("Task {index} ({name}) failed: {source}")]
    #[diagnostic(code(verity::task_failed))]
    TaskFailed {
        index: usize,
        name: String,
        #[source]
        source: Box<CliError>,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(verity::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(verity::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: verity config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No controller configured")]
    #[diagnostic(
        code(verity::no_config),
        help(
            "Create a profile with: verity config init\n\
             Or pass --controller. Config expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(verity::config))]
    Config(Box<figment::Error>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(verity::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(verity::json), help("Check the JSON contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Invalid task file: {0}")]
    #[diagnostic(code(verity::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::AuthMissingToken { .. } | Self::NoCredentials => {
                exit_code::AUTH
            }
            Self::UnknownResource { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::TaskFailed { source, .. } => source.exit_code(),
            _ => exit_code::GENERAL,
        }
    }
}

// ── verity_api::Error → CliError ────────────────────────────────────

impl From<verity_api::Error> for CliError {
    fn from(err: verity_api::Error) -> Self {
        use verity_api::Error as ApiError;

        match err {
            ApiError::AuthTransport { message } => Self::AuthFailed { message },

            ApiError::AuthMissingToken { response } => Self::AuthMissingToken {
                response: response.to_string(),
            },

            ApiError::MissingCredentials => Self::NoCredentials,

            ApiError::InvalidToken => Self::Validation {
                field: "token".into(),
                reason: "contains characters not allowed in an HTTP header".into(),
            },

            ApiError::ResourceCall { resource, source } => {
                if source.is_timeout() {
                    Self::Timeout { resource }
                } else if source.is_connect() {
                    Self::ConnectionFailed {
                        resource,
                        url: source
                            .url()
                            .map_or_else(|| "(unknown)".into(), ToString::to_string),
                        source: Box::new(source),
                    }
                } else {
                    Self::ResourceCall {
                        resource,
                        message: source.to_string(),
                    }
                }
            }

            ApiError::InvalidAction(action) => Self::Validation {
                field: "action".into(),
                reason: format!("expected create, update, or delete, got '{action}'"),
            },

            ApiError::InvalidUrl(e) => Self::Validation {
                field: "controller".into(),
                reason: e.to_string(),
            },

            ApiError::Tls(message) => Self::TlsError { message },
        }
    }
}

// ── ConfigError → CliError ──────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::ProfileNotFound { name, available } => {
                Self::ProfileNotFound { name, available }
            }
            ConfigError::UnknownResource { name, available } => {
                Self::UnknownResource { name, available }
            }
            ConfigError::Keyring(e) => Self::Validation {
                field: "keyring".into(),
                reason: e.to_string(),
            },
            ConfigError::Serialization(e) => Self::Validation {
                field: "config".into(),
                reason: e.to_string(),
            },
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Io(e) => Self::Io(e),
        }
    }
}
