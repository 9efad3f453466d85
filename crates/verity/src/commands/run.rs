//! `verity run`: execute a task file with a single session.
//!
//! A task file is a YAML (or JSON) list of resource operations, optionally
//! nested under a top-level `tasks:` key:
//!
//! ```yaml
//! tasks:
//!   - name: Create tenant
//!     resource: tenants
//!     action: create
//!     params: { changeset_name: nightly }
//!     data: { tenant: { Blue: { enable: true } } }
//!   - resource: badges
//!     action: delete
//!     params: { badge_name: Old }
//! ```
//!
//! Every task is validated before anything is sent. Execution then
//! authenticates once and stops at the first failing task.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;
use tracing::{debug, info};

use verity_api::{Action, ResourceRequest, ResourceResult};
use verity_config::ResourceCatalog;

use crate::cli::{GlobalOpts, RunArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Task file ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Task {
    pub name: Option<String>,
    pub resource: String,
    #[serde(default = "default_action")]
    pub action: Action,
    /// Query parameters; `null` values are dropped, scalars are stringified.
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
    pub data: Option<Value>,
}

fn default_action() -> Action {
    Action::Create
}

impl Task {
    fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{} {} #{index}", self.action, self.resource))
    }
}

/// Parse a task file body: a bare list, or a mapping with a `tasks` key.
pub fn parse_tasks(raw: &str) -> Result<Vec<Task>, CliError> {
    let doc: serde_yaml::Value = serde_yaml::from_str(raw)?;
    let list = match doc {
        serde_yaml::Value::Mapping(mut map) => {
            map.remove("tasks").ok_or_else(|| CliError::Validation {
                field: "tasks".into(),
                reason: "expected a list of tasks or a top-level `tasks:` key".into(),
            })?
        }
        other => other,
    };
    Ok(serde_yaml::from_value(list)?)
}

fn load_tasks(path: &Path) -> Result<Vec<Task>, CliError> {
    let raw = std::fs::read_to_string(path)?;
    parse_tasks(&raw)
}

/// Turn a task into a request, checking the resource and payload up front.
fn plan_task(catalog: &ResourceCatalog, task: &Task) -> Result<ResourceRequest, CliError> {
    let endpoint = catalog.get(&task.resource)?.clone();
    let mut request = ResourceRequest::new(endpoint, task.action);

    match (&task.data, task.action.sends_body()) {
        (Some(data), true) => request = request.with_payload(data.clone()),
        (None, true) => {
            return Err(CliError::Validation {
                field: "data".into(),
                reason: format!("`{}` requires a `data` payload", task.action),
            });
        }
        (_, false) => {}
    }

    for (key, value) in &task.params {
        request.query.insert(key.clone(), param_value(value));
    }
    Ok(request)
}

fn param_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ── Reporting ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TaskReport {
    index: usize,
    name: String,
    resource: String,
    action: Action,
    #[serde(flatten)]
    result: ResourceResult,
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Task")]
    name: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Status")]
    status: u16,
    #[tabled(rename = "Changed")]
    changed: bool,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let tasks = load_tasks(&args.file)?;
    if tasks.is_empty() {
        return Err(CliError::Validation {
            field: "tasks".into(),
            reason: format!("{} contains no tasks", args.file.display()),
        });
    }

    let planned = tasks
        .iter()
        .enumerate()
        .map(|(i, task)| {
            plan_task(&ctx.catalog, task).map_err(|e| CliError::TaskFailed {
                index: i + 1,
                name: task.label(i + 1),
                source: Box::new(e),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let deletes = planned
        .iter()
        .filter(|r| r.action == Action::Delete)
        .count();
    if deletes > 0
        && !util::confirm(
            &format!(
                "{} contains {deletes} delete task(s). Continue?",
                args.file.display()
            ),
            Action::Delete,
            global.yes,
        )?
    {
        return Ok(());
    }

    let session = ctx.dispatcher.resolve_session(&ctx.settings.auth).await?;
    info!(tasks = planned.len(), "running task file");

    let mut reports = Vec::with_capacity(planned.len());
    for (i, (task, request)) in tasks.iter().zip(&planned).enumerate() {
        let name = task.label(i + 1);
        debug!(task = %name, "executing");
        let result = ctx
            .dispatcher
            .execute(&session, request)
            .await
            .map_err(|e| CliError::TaskFailed {
                index: i + 1,
                name: name.clone(),
                source: Box::new(e.into()),
            })?;
        reports.push(TaskReport {
            index: i + 1,
            name,
            resource: task.resource.clone(),
            action: task.action,
            result,
        });
    }

    let out = output::render_list(
        global.output_format(),
        &reports,
        |r| TaskRow {
            index: r.index,
            name: r.name.clone(),
            resource: r.resource.clone(),
            action: r.action.to_string(),
            status: r.result.status,
            changed: r.result.changed,
        },
        |r| output::response_plain(&r.result.response),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
