//! Shared helpers for command handlers.

use std::io::{IsTerminal, Read};
use std::path::Path;

use serde_json::Value;

use verity_api::{Action, ResourceRequest};
use verity_config::ResourceCatalog;

use crate::cli::{PayloadArgs, QueryArgs};
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to ask on, refuses instead of blocking.
pub fn confirm(message: &str, action: Action, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.to_string(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Load the JSON payload from `--data FILE` (`-` for stdin) or `--data-json`.
pub fn read_payload(args: &PayloadArgs) -> Result<Value, CliError> {
    let raw = match (&args.data, &args.data_json) {
        (_, Some(inline)) => inline.clone(),
        (Some(path), None) => read_source(path)?,
        (None, None) => {
            return Err(CliError::Validation {
                field: "data".into(),
                reason: "a payload is required (--data or --data-json)".into(),
            });
        }
    };
    Ok(serde_json::from_str(&raw)?)
}

fn read_source(path: &Path) -> Result<String, CliError> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Look up the endpoint and assemble a request from CLI query flags.
pub fn build_request(
    catalog: &ResourceCatalog,
    resource: &str,
    action: Action,
    query: &QueryArgs,
    payload: Option<Value>,
) -> Result<ResourceRequest, CliError> {
    let endpoint = catalog.get(resource)?.clone();
    let mut request = ResourceRequest::new(endpoint, action);
    if let Some(payload) = payload {
        request = request.with_payload(payload);
    }
    for (key, value) in &query.params {
        request = request.with_param(key, value);
    }
    if let Some(ref changeset) = query.changeset {
        request = request.with_changeset(changeset);
    }
    Ok(request)
}
