//! Clap derive structures for the `verity` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// verity -- declarative configuration for Verity network fabrics
#[derive(Debug, Parser)]
#[command(
    name = "verity",
    version,
    about = "Create, update, and delete Verity fabric objects from the command line",
    long_about = "Drives the Verity controller REST API.\n\n\
        Every resource type (acls, gateways, tenants, switchpoints, ...) shares\n\
        one create/update/delete path. Payloads are passed through as JSON;\n\
        check the reported response for controller-side validation errors.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Controller profile to use
    #[arg(long, short = 'p', env = "VERITY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller base URL (overrides profile)
    #[arg(long, short = 'c', env = "VERITY_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Session token (skips authentication)
    #[arg(long, env = "VERITY_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Username, used when no token is available
    #[arg(long, short = 'u', env = "VERITY_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password, used when no token is available
    #[arg(long, env = "VERITY_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format [default: `[defaults] output`, else table]
    #[arg(long, short = 'o', env = "VERITY_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: `[defaults] color`, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "VERITY_INSECURE", global = true)]
    pub insecure: bool,

    /// Resource request timeout in seconds (0 disables; authentication always uses 30s)
    #[arg(long, env = "VERITY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    /// The selected output format, once config defaults have been applied.
    pub fn output_format(&self) -> &OutputFormat {
        self.output.as_ref().unwrap_or(&OutputFormat::Table)
    }

    pub fn color_mode(&self) -> &ColorMode {
        self.color.as_ref().unwrap_or(&ColorMode::Auto)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary (default)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Bare response body / token / names (scripting)
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authenticate with username/password and print the session token
    #[command(alias = "login")]
    Auth,

    /// Create objects of a resource type (HTTP PUT)
    #[command(alias = "c")]
    Create(WriteArgs),

    /// Update objects of a resource type (HTTP PATCH)
    #[command(alias = "u")]
    Update(WriteArgs),

    /// Delete objects of a resource type (HTTP DELETE)
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Execute a YAML/JSON task file with a single session
    Run(RunArgs),

    /// List known resource types and their API paths
    #[command(alias = "res")]
    Resources,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RESOURCE OPERATIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Resource type (see `verity resources`)
    pub resource: String,

    #[command(flatten)]
    pub payload: PayloadArgs,

    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Resource type (see `verity resources`)
    pub resource: String,

    #[command(flatten)]
    pub query: QueryArgs,
}

/// Exactly one payload source is required for create/update.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct PayloadArgs {
    /// Read the JSON payload from a file ('-' for stdin)
    #[arg(long, short = 'd', value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Inline JSON payload
    #[arg(long, value_name = "JSON")]
    pub data_json: Option<String>,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Query parameter as KEY=VALUE (repeatable), e.g. -P acl_name=Web
    #[arg(long = "param", short = 'P', value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,

    /// Changeset to group the modification into (sets `changeset_name`)
    #[arg(long)]
    pub changeset: Option<String>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Task file: a list of {name, resource, action, params, data} entries,
    /// optionally nested under a top-level `tasks:` key
    pub file: PathBuf,
}

/// Parse a `KEY=VALUE` pair; the value may be empty, the key may not.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Set a value on the active profile
    Set {
        /// Config key (controller, username, token_env, insecure, timeout, ca_cert)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },

    /// Store a session token in the system keyring
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
