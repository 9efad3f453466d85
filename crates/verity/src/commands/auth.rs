//! `verity auth`: exchange username/password for a session token.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::cli::GlobalOpts;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

/// What `auth` reports. Authenticating never modifies the fabric.
#[derive(Debug, Serialize)]
struct AuthOutput {
    changed: bool,
    token: String,
    base_url: String,
}

pub async fn handle(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    // Always log in: a configured token would short-circuit the exchange.
    let mut auth = ctx.settings.auth.clone();
    auth.token = SecretString::from(String::new());

    let session = ctx.dispatcher.resolve_session(&auth).await?;

    let out = AuthOutput {
        changed: false,
        token: session.token().expose_secret().to_owned(),
        base_url: ctx.controller.clone(),
    };

    let rendered = output::render_single(
        global.output_format(),
        &out,
        |o| format!("changed:  {}\ntoken:    {}\nbase_url: {}", o.changed, o.token, o.base_url),
        |o| o.token.clone(),
    );
    output::print_output(&rendered, global.quiet);
    Ok(())
}
