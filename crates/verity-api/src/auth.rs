// Session token acquisition
//
// The controller hands out an opaque token from `POST /api/auth`; every
// resource call carries it back as the `ivn_api` cookie. Tokens are never
// cached here -- each invocation resolves its own.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, info};
use url::Url;

use crate::error::Error;
use crate::resource::join_url;

/// Fixed timeout for the authentication round trip.
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(30);

const AUTH_PATH: &str = "/api/auth";

/// Username/password pair, used only to obtain a [`Session`].
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// An authenticated session. The token is opaque and has no expiry model;
/// if the controller rejects it, the caller re-authenticates.
#[derive(Debug, Clone)]
pub struct Session {
    token: SecretString,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    /// Value of the `Cookie` header carried on resource calls.
    pub(crate) fn cookie(&self) -> String {
        format!("ivn_api={}", self.token.expose_secret())
    }
}

/// What a caller supplies to get a session: a token, credentials, or both.
///
/// Any field may be empty. A non-empty token always wins; credentials are
/// only consulted when the token is the empty string.
#[derive(Debug, Clone)]
pub struct AuthParams {
    pub token: SecretString,
    pub username: String,
    pub password: SecretString,
}

/// How a session will be obtained, decided without touching the network.
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// A token was supplied; use it as-is.
    Token(Session),
    /// No token; log in with these credentials.
    Login(Credentials),
}

impl AuthParams {
    pub fn new(
        token: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            token: SecretString::from(token.into()),
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Params carrying only a pre-issued token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self::new(token, "", "")
    }

    /// Params carrying only username/password.
    pub fn with_credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new("", username, password)
    }

    /// Decide where the session comes from.
    ///
    /// Fails with [`Error::MissingCredentials`] when the token is empty and
    /// either half of the credential pair is empty too.
    pub fn token_source(&self) -> Result<TokenSource, Error> {
        let token = self.token.expose_secret();
        if !token.is_empty() {
            return Ok(TokenSource::Token(Session::new(token)));
        }

        if self.username.is_empty() || self.password.expose_secret().is_empty() {
            return Err(Error::MissingCredentials);
        }

        Ok(TokenSource::Login(Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }))
    }
}

/// Exchanges credentials for a session token via `POST {base_url}/api/auth`.
#[derive(Debug, Clone)]
pub struct Authenticator {
    http: reqwest::Client,
    base_url: Url,
}

impl Authenticator {
    pub fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Authenticate and return the session token.
    ///
    /// Any transport error, non-2xx status, or undecodable body is an
    /// [`Error::AuthTransport`]. A decoded body without a non-empty string
    /// `token` is an [`Error::AuthMissingToken`] carrying that body.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Session, Error> {
        let url = join_url(&self.base_url, AUTH_PATH)?;

        debug!("POST {}", url);

        let body = json!({
            "auth": {
                "username": credentials.username,
                "password": credentials.password.expose_secret(),
            }
        });

        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .timeout(AUTH_TIMEOUT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(auth_transport)?;

        let data: Value = resp.json().await.map_err(auth_transport)?;

        match data.get("token").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => {
                info!(username = %credentials.username, "authenticated");
                Ok(Session::new(token))
            }
            _ => Err(Error::AuthMissingToken { response: data }),
        }
    }
}

fn auth_transport(err: reqwest::Error) -> Error {
    Error::AuthTransport {
        message: err.to_string(),
    }
}
