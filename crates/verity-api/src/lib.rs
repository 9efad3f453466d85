// verity-api: Async Rust client for the Verity fabric controller REST API
//
// Two pieces: the `Authenticator` trades username/password for a session
// token, and the `ResourceDispatcher` runs create/update/delete calls
// against any resource endpoint. Per-resource field schemas are not modeled
// here -- payloads are opaque JSON and endpoints are plain `{name, path}`
// pairs supplied by the caller.

pub mod action;
pub mod auth;
pub mod dispatcher;
pub mod error;
pub mod resource;
pub mod transport;

pub use action::Action;
pub use auth::{AUTH_TIMEOUT, AuthParams, Authenticator, Credentials, Session, TokenSource};
pub use dispatcher::ResourceDispatcher;
pub use error::Error;
pub use resource::{
    CHANGESET_PARAM, ResourceEndpoint, ResourceRequest, ResourceResult, ResponseBody,
};
pub use transport::{TlsMode, TransportConfig};
