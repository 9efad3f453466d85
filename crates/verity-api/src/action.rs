use std::str::FromStr;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

use crate::error::Error;

/// The write operation to perform against a resource endpoint.
///
/// Closed set: anything other than `create`, `update`, or `delete` is
/// rejected when parsed, never mapped to a fallback method.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    /// The HTTP method the controller expects for this action.
    pub fn method(self) -> Method {
        match self {
            Self::Create => Method::PUT,
            Self::Update => Method::PATCH,
            Self::Delete => Method::DELETE,
        }
    }

    /// Whether the request carries a JSON body.
    pub fn sends_body(self) -> bool {
        match self {
            Self::Create | Self::Update => true,
            Self::Delete => false,
        }
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(Error::InvalidAction(other.to_owned())),
        }
    }
}

impl TryFrom<String> for Action {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
