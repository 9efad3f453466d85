//! CLI configuration: thin wrapper around `verity_config` shared types.
//!
//! Re-exports the shared types and layers `GlobalOpts` flag overrides
//! (--controller, --token, --username, ...) on top of profile resolution.

use std::time::Duration;

use clap::ValueEnum;
use secrecy::SecretString;

use verity_api::{ResourceDispatcher, TlsMode};
use verity_config::{ControllerSettings, ResourceCatalog, SecretLookup};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use verity_config::{
    Config, Defaults, Profile, config_path, load_config, load_config_for_edit, save_config,
    store_secret,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Fill `--output`/`--color` from `[defaults]` when the flags were not given.
pub fn apply_display_defaults(
    global: &mut GlobalOpts,
    defaults: &Defaults,
) -> Result<(), CliError> {
    if global.output.is_none() {
        global.output = Some(parse_default("defaults.output", &defaults.output)?);
    }
    if global.color.is_none() {
        global.color = Some(parse_default("defaults.color", &defaults.color)?);
    }
    Ok(())
}

fn parse_default<T: ValueEnum>(field: &str, value: &str) -> Result<T, CliError> {
    T::from_str(value, true).map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!(
            "unknown value '{value}', expected one of: {}",
            T::value_variants()
                .iter()
                .filter_map(|v| v.to_possible_value())
                .map(|v| v.get_name().to_owned())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    })
}

/// Everything a controller-facing command needs.
pub struct Context {
    pub dispatcher: ResourceDispatcher,
    pub settings: ControllerSettings,
    pub catalog: ResourceCatalog,
    pub profile: String,
    /// Controller address as configured, before URL normalization.
    pub controller: String,
}

/// Build a [`Context`] from the config file, active profile, and CLI flags.
///
/// An explicit `--profile` that doesn't exist is an error. Without any
/// matching profile, `--controller` must be given.
pub fn build_context(cfg: &Config, global: &GlobalOpts) -> Result<Context, CliError> {
    let profile_name = active_profile_name(global, cfg);
    let catalog = cfg.catalog()?;

    let (settings, controller) = match cfg.profiles.get(&profile_name) {
        Some(profile) => (
            resolve_profile(profile, &profile_name, &cfg.defaults, global)?,
            global
                .controller
                .clone()
                .unwrap_or_else(|| profile.controller.clone()),
        ),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: cfg.available_profiles(),
            });
        }
        None => {
            let Some(controller) = global.controller.clone() else {
                return Err(CliError::NoConfig {
                    path: config_path().display().to_string(),
                });
            };
            let profile = Profile {
                controller: controller.clone(),
                ..Profile::default()
            };
            (
                resolve_profile(&profile, &profile_name, &cfg.defaults, global)?,
                controller,
            )
        }
    };

    let dispatcher = ResourceDispatcher::new(settings.base_url.clone(), &settings.transport)?;

    Ok(Context {
        dispatcher,
        settings,
        catalog,
        profile: profile_name,
        controller,
    })
}

/// Translate a `Profile` + global flags into `ControllerSettings`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<ControllerSettings, CliError> {
    let mut settings =
        verity_config::profile_to_settings(profile, profile_name, defaults, &SecretLookup::system())?;
    apply_overrides(&mut settings, global)?;
    Ok(settings)
}

/// Apply flag values on top of profile-derived settings.
fn apply_overrides(settings: &mut ControllerSettings, global: &GlobalOpts) -> Result<(), CliError> {
    if let Some(ref controller) = global.controller {
        settings.base_url = verity_config::parse_controller_url(controller)?;
    }
    if let Some(ref token) = global.token {
        settings.auth.token = SecretString::from(token.clone());
    }
    if let Some(ref username) = global.username {
        settings.auth.username.clone_from(username);
    }
    if let Some(ref password) = global.password {
        settings.auth.password = SecretString::from(password.clone());
    }
    if global.insecure {
        settings.transport.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        settings.transport.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    Ok(())
}
