// Resource dispatcher
//
// Wraps `reqwest::Client` with Verity URL construction, the `ivn_api`
// session cookie, action-to-method mapping, and response normalization.
// One call is one linear request/response: no retries, no pagination,
// no read-before-write diffing.

use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue};
use tracing::{debug, warn};
use url::Url;

use crate::auth::{AuthParams, Authenticator, Session, TokenSource};
use crate::error::Error;
use crate::resource::{ResourceRequest, ResourceResult, ResponseBody, join_url};
use crate::transport::TransportConfig;

/// Executes create/update/delete calls against Verity resource endpoints.
///
/// Stateless apart from the HTTP client: cheap to clone and safe to share
/// between tasks as long as each call carries its own session.
#[derive(Debug, Clone)]
pub struct ResourceDispatcher {
    http: reqwest::Client,
    base_url: Url,
    authenticator: Authenticator,
}

impl ResourceDispatcher {
    /// Create a dispatcher from a `TransportConfig`.
    ///
    /// `base_url` is the controller root (e.g. `https://vnc.example.com`);
    /// `/api` is appended per request.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a dispatcher with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        let authenticator = Authenticator::new(http.clone(), base_url.clone());
        Self {
            http,
            base_url,
            authenticator,
        }
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The authenticator sharing this dispatcher's HTTP client.
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Turn caller-supplied auth params into a session.
    ///
    /// A non-empty token is used directly with no network call. Otherwise the
    /// credentials are exchanged for a token; if they are incomplete this
    /// fails with [`Error::MissingCredentials`] before any request is sent.
    pub async fn resolve_session(&self, auth: &AuthParams) -> Result<Session, Error> {
        match auth.token_source()? {
            TokenSource::Token(session) => Ok(session),
            TokenSource::Login(credentials) => self.authenticator.authenticate(&credentials).await,
        }
    }

    /// Resolve a session and execute the request: the single caller-facing
    /// operation.
    pub async fn run(
        &self,
        auth: &AuthParams,
        request: &ResourceRequest,
    ) -> Result<ResourceResult, Error> {
        let session = self.resolve_session(auth).await?;
        self.execute(&session, request).await
    }

    /// Execute one resource call with an existing session.
    ///
    /// Any non-transport outcome is reported as `changed = true`, including
    /// non-2xx statuses; those are logged and surfaced via
    /// [`ResourceResult::status`].
    pub async fn execute(
        &self,
        session: &Session,
        request: &ResourceRequest,
    ) -> Result<ResourceResult, Error> {
        let url = join_url(&self.base_url, &format!("/api{}", request.endpoint.path))?;
        let method = request.action.method();
        let resource = &request.endpoint.name;

        debug!(resource = %resource, "{} {}", method, url);

        let mut builder = self
            .http
            .request(method, url)
            .headers(build_headers(session)?);

        let params = request.query_pairs();
        if !params.is_empty() {
            builder = builder.query(&params);
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let call_failed = |source| Error::ResourceCall {
            resource: resource.clone(),
            source,
        };

        let resp = builder.send().await.map_err(call_failed)?;
        let status = resp.status();
        let raw = resp.text().await.map_err(call_failed)?;

        if !status.is_success() {
            warn!(resource = %resource, status = status.as_u16(), "controller returned non-success status");
        }

        Ok(ResourceResult {
            changed: true,
            status: status.as_u16(),
            response: ResponseBody::decode(raw),
        })
    }
}

/// Standard headers for every resource call.
fn build_headers(session: &Session) -> Result<HeaderMap, Error> {
    let mut cookie = HeaderValue::from_str(&session.cookie()).map_err(|_| Error::InvalidToken)?;
    cookie.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, cookie);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}
