//! Resource endpoint catalog.
//!
//! Maps resource names to URL paths. The dispatcher only ever sees the
//! resulting `{name, path}` pair; field-level schemas are not modeled.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use verity_api::ResourceEndpoint;

use crate::ConfigError;

/// Resource types the Verity controller exposes, each served at `/{name}`.
pub const BUILTIN_RESOURCES: &[&str] = &[
    "acls",
    "aspathaccesslists",
    "badges",
    "bundles",
    "communitylists",
    "devicecontrollers",
    "devicesettings",
    "ethportprofiles",
    "ethportsettings",
    "extendedcommunitylists",
    "gatewayprofiles",
    "gateways",
    "imageupdatesets",
    "ipv4lists",
    "ipv4prefixlists",
    "ipv6lists",
    "ipv6prefixlists",
    "lags",
    "packetqueues",
    "pods",
    "portacls",
    "routemapclauses",
    "routemaps",
    "services",
    "sfpbreakouts",
    "sites",
    "switchpoints",
    "tenants",
];

/// A `[resources.<name>]` table in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceOverride {
    /// URL path suffix appended to `{base_url}/api`, e.g. `/acls`.
    pub path: String,
}

/// Name → endpoint lookup table.
#[derive(Debug, Clone)]
pub struct ResourceCatalog {
    endpoints: BTreeMap<String, ResourceEndpoint>,
}

impl ResourceCatalog {
    /// The built-in Verity resources.
    pub fn builtin() -> Self {
        let endpoints = BUILTIN_RESOURCES
            .iter()
            .map(|name| ((*name).to_owned(), ResourceEndpoint::new(*name, format!("/{name}"))))
            .collect();
        Self { endpoints }
    }

    /// Built-ins extended (or overridden) by `[resources.*]` config tables.
    pub fn with_overrides(
        overrides: &BTreeMap<String, ResourceOverride>,
    ) -> Result<Self, ConfigError> {
        let mut catalog = Self::builtin();
        for (name, entry) in overrides {
            if !entry.path.starts_with('/') {
                return Err(ConfigError::Validation {
                    field: format!("resources.{name}.path"),
                    reason: format!("must start with '/', got '{}'", entry.path),
                });
            }
            catalog
                .endpoints
                .insert(name.clone(), ResourceEndpoint::new(name, &entry.path));
        }
        Ok(catalog)
    }

    /// Look up a resource by name.
    pub fn get(&self, name: &str) -> Result<&ResourceEndpoint, ConfigError> {
        self.endpoints
            .get(name)
            .ok_or_else(|| ConfigError::UnknownResource {
                name: name.to_owned(),
                available: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.endpoints.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceEndpoint> {
        self.endpoints.values()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl Default for ResourceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
