//! Shared configuration for Verity tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), the
//! resource endpoint catalog, and translation to the `verity_api` types the
//! dispatcher consumes. The CLI layers its flag overrides on top.

pub mod catalog;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use verity_api::{AuthParams, TlsMode, TransportConfig};

pub use catalog::{BUILTIN_RESOURCES, ResourceCatalog, ResourceOverride};

/// Service name under which secrets are stored in the system keyring.
pub const KEYRING_SERVICE: &str = "verity";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found (available: {available})")]
    ProfileNotFound { name: String, available: String },

    #[error("unknown resource '{name}'")]
    UnknownResource { name: String, available: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,

    /// Extra or overriding resource endpoints.
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceOverride>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
            resources: BTreeMap::new(),
        }
    }
}

impl Config {
    /// The endpoint catalog: built-ins plus `[resources.*]` entries.
    pub fn catalog(&self) -> Result<ResourceCatalog, ConfigError> {
        ResourceCatalog::with_overrides(&self.resources)
    }

    /// Look up a profile, listing the alternatives when it is missing.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_owned(),
                available: self.available_profiles(),
            })
    }

    /// Comma-separated sorted profile names, or `(none)`.
    pub fn available_profiles(&self) -> String {
        let mut names: Vec<_> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        if names.is_empty() {
            "(none)".into()
        } else {
            names.join(", ")
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Resource-call timeout in seconds; `0` disables it.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named controller profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Controller base URL (e.g., "https://vnc.example.com").
    pub controller: String,

    /// Username for token acquisition.
    pub username: Option<String>,

    /// Password (plaintext — prefer keyring).
    pub password: Option<String>,

    /// Pre-issued session token (plaintext — prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing a session token.
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override resource-call timeout (seconds).
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "be-networks", "verity").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("verity");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from a specific file, layered under `VERITY_*` env vars.
///
/// Nested keys use a double underscore: `VERITY_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("VERITY_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load only what the config file itself says, for commands that rewrite it.
///
/// `VERITY_*` variables are not layered in, so saving the result never
/// persists values that came from the environment. A missing file yields
/// the default config; a file that exists but fails to parse is an error.
pub fn load_config_for_edit() -> Result<Config, ConfigError> {
    load_file_config(&config_path())
}

/// File-only variant of [`load_config_from`].
pub fn load_file_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    debug!(path = %path.display(), "loading config for edit");

    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Secret lookup ───────────────────────────────────────────────────

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Where secrets come from: environment variables and the system keyring.
///
/// [`SecretLookup::system`] reads the real environment and keyring; tests
/// swap in closures.
pub struct SecretLookup {
    env: Lookup,
    keyring: Lookup,
}

impl SecretLookup {
    pub fn new(
        env: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
        keyring: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            env: Box::new(env),
            keyring: Box::new(keyring),
        }
    }

    pub fn system() -> Self {
        Self::new(
            |name| std::env::var(name).ok(),
            |key| {
                keyring::Entry::new(KEYRING_SERVICE, key)
                    .and_then(|entry| entry.get_password())
                    .ok()
            },
        )
    }

    fn env(&self, name: &str) -> Option<String> {
        (self.env)(name).filter(|v| !v.is_empty())
    }

    fn keyring(&self, key: &str) -> Option<String> {
        (self.keyring)(key).filter(|v| !v.is_empty())
    }
}

/// Keyring entry name for a profile secret, e.g. `lab/token`.
pub fn keyring_key(profile_name: &str, kind: &str) -> String {
    format!("{profile_name}/{kind}")
}

/// Store a profile secret (`token` or `password`) in the system keyring.
pub fn store_secret(profile_name: &str, kind: &str, secret: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_key(profile_name, kind))?;
    entry.set_password(secret)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve a session token: `token_env` → `VERITY_TOKEN` → keyring →
/// plaintext. Returns an empty secret when none is configured.
pub fn resolve_token(profile: &Profile, profile_name: &str, lookup: &SecretLookup) -> SecretString {
    let token = profile
        .token_env
        .as_deref()
        .and_then(|name| lookup.env(name))
        .or_else(|| lookup.env("VERITY_TOKEN"))
        .or_else(|| lookup.keyring(&keyring_key(profile_name, "token")))
        .or_else(|| profile.token.clone())
        .unwrap_or_default();
    SecretString::from(token)
}

/// Resolve the username: profile → `VERITY_USERNAME`. Empty when unset.
pub fn resolve_username(profile: &Profile, lookup: &SecretLookup) -> String {
    profile
        .username
        .clone()
        .filter(|u| !u.is_empty())
        .or_else(|| lookup.env("VERITY_USERNAME"))
        .unwrap_or_default()
}

/// Resolve a password: `VERITY_PASSWORD` → keyring → plaintext. Empty when
/// unset.
pub fn resolve_password(
    profile: &Profile,
    profile_name: &str,
    lookup: &SecretLookup,
) -> SecretString {
    let password = lookup
        .env("VERITY_PASSWORD")
        .or_else(|| lookup.keyring(&keyring_key(profile_name, "password")))
        .or_else(|| profile.password.clone())
        .unwrap_or_default();
    SecretString::from(password)
}

// ── Profile → api types ─────────────────────────────────────────────

/// Everything needed to build a dispatcher and authenticate one invocation.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub base_url: Url,
    pub auth: AuthParams,
    pub transport: TransportConfig,
}

/// Parse a controller URL, labeling failures with the `controller` field.
pub fn parse_controller_url(raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "controller".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Build `ControllerSettings` from a profile — no CLI flag overrides.
///
/// Missing credentials are not an error here: the dispatcher decides, so
/// that a missing token and password surface as one consistent failure.
pub fn profile_to_settings(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    lookup: &SecretLookup,
) -> Result<ControllerSettings, ConfigError> {
    let base_url = parse_controller_url(&profile.controller)?;

    let auth = AuthParams {
        token: resolve_token(profile, profile_name, lookup),
        username: resolve_username(profile, lookup),
        password: resolve_password(profile, profile_name, lookup),
    };

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let timeout_secs = profile.timeout.unwrap_or(defaults.timeout);
    let transport = TransportConfig {
        tls,
        timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
    };

    Ok(ControllerSettings {
        base_url,
        auth,
        transport,
    })
}
