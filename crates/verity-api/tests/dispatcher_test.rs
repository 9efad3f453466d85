#![allow(clippy::unwrap_used)]
// Integration tests for `ResourceDispatcher` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use verity_api::{
    Action, AuthParams, Error, ResourceDispatcher, ResourceEndpoint, ResourceRequest,
    ResponseBody, Session,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ResourceDispatcher) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let dispatcher = ResourceDispatcher::with_client(reqwest::Client::new(), base_url);
    (server, dispatcher)
}

fn endpoint(name: &str) -> ResourceEndpoint {
    ResourceEndpoint::new(name, format!("/{name}"))
}

fn refused_base_url() -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Url::parse(&format!("http://127.0.0.1:{port}")).unwrap()
}

fn has_empty_body(req: &Request) -> bool {
    req.body.is_empty()
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap().len()
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_pod_with_token() {
    let (server, dispatcher) = setup().await;

    let payload = json!({"pod": {"Test": {"enable": true}}});

    Mock::given(method("PUT"))
        .and(path("/api/pods"))
        .and(header("Cookie", "ivn_api=abc123"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "unused"})))
        .expect(0)
        .mount(&server)
        .await;

    let request = ResourceRequest::create(endpoint("pods"), payload);
    let result = dispatcher
        .run(&AuthParams::with_token("abc123"), &request)
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.status, 200);
    assert_eq!(result.response, ResponseBody::Json(json!({"id": 42})));
}

#[tokio::test]
async fn test_missing_password_makes_no_request() {
    let (server, dispatcher) = setup().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = ResourceRequest::create(endpoint("acls"), json!({}));
    let result = dispatcher
        .run(&AuthParams::new("", "u", ""), &request)
        .await;

    assert!(
        matches!(result, Err(Error::MissingCredentials)),
        "expected MissingCredentials, got: {result:?}"
    );
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_nothing_supplied_makes_no_request() {
    let (server, dispatcher) = setup().await;

    let request = ResourceRequest::delete(endpoint("tenants"));
    let result = dispatcher.run(&AuthParams::new("", "", ""), &request).await;

    assert!(matches!(result, Err(Error::MissingCredentials)));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_auth_without_token_key() {
    let (server, dispatcher) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = ResourceRequest::create(endpoint("gateways"), json!({"gateway": {}}));
    let result = dispatcher
        .run(&AuthParams::with_credentials("u", "p"), &request)
        .await;

    match result {
        Err(Error::AuthMissingToken { response }) => {
            assert_eq!(response, json!({"status": "ok"}));
        }
        other => panic!("expected AuthMissingToken, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_credentials_fallback_uses_issued_token() {
    let (server, dispatcher) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/tenants"))
        .and(header("Cookie", "ivn_api=fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let request = ResourceRequest::update(endpoint("tenants"), json!({"tenant": {}}));
    let result = dispatcher
        .run(&AuthParams::with_credentials("admin", "secret"), &request)
        .await
        .unwrap();

    assert!(result.changed);
}

#[tokio::test]
async fn test_delete_badge_with_query_and_no_body() {
    let (server, dispatcher) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/badges"))
        .and(query_param("badge_name", "X"))
        .and(has_empty_body)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let request = ResourceRequest::delete(endpoint("badges"))
        .with_param("badge_name", "X")
        .with_payload(json!({"ignored": true}));
    let result = dispatcher
        .execute(&Session::new("abc123"), &request)
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.response, ResponseBody::Json(json!({})));
}

#[tokio::test]
async fn test_delete_connection_refused_is_labeled() {
    let dispatcher = ResourceDispatcher::with_client(reqwest::Client::new(), refused_base_url());

    let request = ResourceRequest::delete(endpoint("badges")).with_param("badge_name", "X");
    let result = dispatcher.run(&AuthParams::with_token("abc123"), &request).await;

    match result {
        Err(ref err @ Error::ResourceCall { ref resource, .. }) => {
            assert_eq!(resource, "badges");
            assert!(err.to_string().starts_with("badges API call failed"));
            assert!(err.is_transient());
        }
        other => panic!("expected ResourceCall, got: {other:?}"),
    }
}

// ── Properties ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_method_depends_only_on_action() {
    let (server, dispatcher) = setup().await;

    for verb in ["PUT", "PATCH", "DELETE"] {
        Mock::given(method(verb))
            .and(path("/api/lags"))
            .respond_with(ResponseTemplate::new(200).set_body_string(verb))
            .mount(&server)
            .await;
    }

    let session = Session::new("abc123");
    let cases = [
        (Action::Create, "PUT"),
        (Action::Update, "PATCH"),
        (Action::Delete, "DELETE"),
    ];

    for (action, expected) in cases {
        let request = ResourceRequest::new(endpoint("lags"), action)
            .with_payload(json!({"lag": {"delete": true}}));
        let result = dispatcher.execute(&session, &request).await.unwrap();
        assert_eq!(result.response, ResponseBody::Text(expected.into()));
    }
}

#[tokio::test]
async fn test_non_json_response_is_raw_text() {
    let (server, dispatcher) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/switchpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_string("updated 3 objects\n"))
        .mount(&server)
        .await;

    let request = ResourceRequest::update(endpoint("switchpoints"), json!({}));
    let result = dispatcher
        .execute(&Session::new("t"), &request)
        .await
        .unwrap();

    assert_eq!(
        result.response,
        ResponseBody::Text("updated 3 objects\n".into())
    );
}

#[tokio::test]
async fn test_error_status_still_changed() {
    let (server, dispatcher) = setup().await;

    let body = json!({"errors": [{"field": "acl_name", "msg": "already exists"}]});

    Mock::given(method("PUT"))
        .and(path("/api/acls"))
        .respond_with(ResponseTemplate::new(422).set_body_json(&body))
        .mount(&server)
        .await;

    let request = ResourceRequest::create(endpoint("acls"), json!({"acl": {}}));
    let result = dispatcher
        .execute(&Session::new("t"), &request)
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.status, 422);
    assert!(!result.is_success());
    assert_eq!(result.response, ResponseBody::Json(body));
}

#[tokio::test]
async fn test_repeated_create_reports_changed_each_time() {
    let (server, dispatcher) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/routemaps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let request = ResourceRequest::create(endpoint("routemaps"), json!({"route_map": {}}));
    let auth = AuthParams::with_token("abc123");

    let first = dispatcher.run(&auth, &request).await.unwrap();
    let second = dispatcher.run(&auth, &request).await.unwrap();

    assert!(first.changed);
    assert!(second.changed);
}

#[tokio::test]
async fn test_changeset_and_null_params() {
    let (server, dispatcher) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/services"))
        .and(query_param("changeset_name", "cs1"))
        .and(|req: &Request| !req.url.query().unwrap_or_default().contains("skipped"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut request =
        ResourceRequest::create(endpoint("services"), json!({"service": {}})).with_changeset("cs1");
    request.query.insert("skipped".into(), None);

    dispatcher
        .execute(&Session::new("t"), &request)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_base_url_with_path_prefix() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/verity/", server.uri())).unwrap();
    let dispatcher = ResourceDispatcher::with_client(reqwest::Client::new(), base_url);

    Mock::given(method("PUT"))
        .and(path("/verity/api/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let request = ResourceRequest::create(endpoint("sites"), json!({"site": {}}));
    dispatcher
        .execute(&Session::new("t"), &request)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_timeout_is_resource_call_error() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let transport = verity_api::TransportConfig::default()
        .with_timeout(std::time::Duration::from_millis(100));
    let dispatcher = ResourceDispatcher::new(base_url, &transport).unwrap();

    Mock::given(method("PUT"))
        .respond_with(
            ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let request = ResourceRequest::create(endpoint("bundles"), json!({}));
    let result = dispatcher.execute(&Session::new("t"), &request).await;

    match result {
        Err(ref err @ Error::ResourceCall { .. }) => {
            assert_eq!(err.resource(), Some("bundles"));
            assert!(err.is_transient());
        }
        other => panic!("expected ResourceCall, got: {other:?}"),
    }
}
