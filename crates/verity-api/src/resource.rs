// Resource request/result types
//
// A resource is addressed by a `{name, path}` pair only. The name labels
// errors and logs; the path is appended to `{base_url}/api`. Payloads and
// query parameters pass through verbatim.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::action::Action;
use crate::error::Error;

/// Query parameter that groups pending modifications into a changeset.
pub const CHANGESET_PARAM: &str = "changeset_name";

/// A named resource endpoint, e.g. `{name: "acls", path: "/acls"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEndpoint {
    pub name: String,
    pub path: String,
}

impl ResourceEndpoint {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// One create/update/delete call against a resource endpoint.
///
/// Query entries mapped to `None` are dropped from the URL. The payload is
/// never sent for [`Action::Delete`].
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub endpoint: ResourceEndpoint,
    pub action: Action,
    pub query: BTreeMap<String, Option<String>>,
    pub payload: Option<Value>,
}

impl ResourceRequest {
    pub fn new(endpoint: ResourceEndpoint, action: Action) -> Self {
        Self {
            endpoint,
            action,
            query: BTreeMap::new(),
            payload: None,
        }
    }

    pub fn create(endpoint: ResourceEndpoint, payload: Value) -> Self {
        Self::new(endpoint, Action::Create).with_payload(payload)
    }

    pub fn update(endpoint: ResourceEndpoint, payload: Value) -> Self {
        Self::new(endpoint, Action::Update).with_payload(payload)
    }

    pub fn delete(endpoint: ResourceEndpoint) -> Self {
        Self::new(endpoint, Action::Delete)
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), Some(value.into()));
        self
    }

    /// Attach the request to a named changeset.
    pub fn with_changeset(self, name: impl Into<String>) -> Self {
        self.with_param(CHANGESET_PARAM, name)
    }

    /// Query pairs actually sent, with `None` values dropped.
    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        self.query
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
            .collect()
    }

    /// The JSON body to send, if any.
    pub fn body(&self) -> Option<&Value> {
        if self.action.sends_body() {
            self.payload.as_ref()
        } else {
            None
        }
    }
}

/// A response body: decoded JSON when possible, raw text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Decode a body as JSON, falling back to the text verbatim.
    pub fn decode(raw: String) -> Self {
        match serde_json::from_str(&raw) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(raw),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

/// Outcome of a dispatched resource call.
///
/// `changed` is always `true` once the request reached the controller; the
/// client never compares against prior remote state. `status` is the HTTP
/// status code -- check it (or `response`) for application-level failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceResult {
    pub changed: bool,
    pub status: u16,
    pub response: ResponseBody,
}

impl ResourceResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Build `{base}{suffix}` the way the controller expects, tolerating a
/// trailing slash on the base URL.
pub(crate) fn join_url(base: &Url, suffix: &str) -> Result<Url, Error> {
    let full = format!("{}{}", base.as_str().trim_end_matches('/'), suffix);
    Ok(Url::parse(&full)?)
}
