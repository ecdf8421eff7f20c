use std::sync::Arc;

use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use localbitcoins_api_client::auth::{Credentials, NonceProvider, sign_request};
use localbitcoins_api_client::error::LbError;
use localbitcoins_api_client::rest::{LbRestClient, Method};

struct FixedNonce(u64);

impl NonceProvider for FixedNonce {
    fn next_nonce(&self) -> u64 {
        self.0
    }
}

fn build_client(server: &MockServer, nonce: u64) -> LbRestClient {
    LbRestClient::builder(Credentials::new("test_key", "test_secret"))
        .base_url(server.uri())
        .nonce_provider(Arc::new(FixedNonce(nonce)))
        .build()
}

#[tokio::test]
async fn test_get_sends_auth_headers_and_signature() {
    let server = MockServer::start().await;
    let nonce = 12345;
    let credentials = Credentials::new("test_key", "test_secret");
    let signature = sign_request(&credentials, nonce, "/api/myself/", "").unwrap();
    let response = serde_json::json!({
        "data": { "username": "alice" }
    });

    Mock::given(method("GET"))
        .and(path("/api/myself/"))
        .and(header("Apiauth-Key", "test_key"))
        .and(header("Apiauth-Nonce", nonce.to_string()))
        .and(header("Apiauth-Signature", signature))
        .respond_with(ResponseTemplate::new(200).set_body_json(response.clone()))
        .mount(&server)
        .await;

    let client = build_client(&server, nonce);
    let body = client.get("/api/myself/").await.unwrap();
    assert_eq!(body, response);
}

#[tokio::test]
async fn test_get_without_params_has_no_query_string() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/wallet/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": {} })))
        .mount(&server)
        .await;

    let client = build_client(&server, 12345);
    client.get("/api/wallet/").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.query().is_none());
}

#[tokio::test]
async fn test_get_params_sign_the_query_string() {
    let server = MockServer::start().await;
    let nonce = 12345;
    let credentials = Credentials::new("test_key", "test_secret");
    // GET params are part of the signed message, '?' included.
    let signature = sign_request(&credentials, nonce, "/api/contact_info/", "?contacts=1%2C2").unwrap();

    Mock::given(method("GET"))
        .and(path("/api/contact_info/"))
        .and(query_param("contacts", "1,2"))
        .and(header("Apiauth-Signature", signature))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": { "contact_count": 2 } })),
        )
        .mount(&server)
        .await;

    let client = build_client(&server, nonce);
    let body = client
        .get_with_params("/api/contact_info/", &[("contacts", "1,2")])
        .await
        .unwrap();
    assert_eq!(body["data"]["contact_count"], 2);
}

#[tokio::test]
async fn test_post_sends_form_encoded_body() {
    let server = MockServer::start().await;
    let nonce = 12345;
    let credentials = Credentials::new("test_key", "test_secret");
    // POST bodies are signed raw, without the '?' prefix.
    let signature = sign_request(&credentials, nonce, "/api/pincode/", "code=4321").unwrap();

    Mock::given(method("POST"))
        .and(path("/api/pincode/"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("code=4321"))
        .and(header("Apiauth-Signature", signature))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": { "pincode_ok": true } })),
        )
        .mount(&server)
        .await;

    let client = build_client(&server, nonce);
    let body = client.post("/api/pincode/", &[("code", "4321")]).await.unwrap();
    assert_eq!(body["data"]["pincode_ok"], true);
}

#[tokio::test]
async fn test_post_body_contains_all_params() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/wallet-send/"))
        .and(body_string_contains("ammount=0.1"))
        .and(body_string_contains("address=1BvBMSEYst"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": {} })))
        .mount(&server)
        .await;

    let client = build_client(&server, 12345);
    client
        .post("/api/wallet-send/", &[("ammount", "0.1"), ("address", "1BvBMSEYst")])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_non_success_status_maps_to_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/myself/"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let client = build_client(&server, 12345);
    let error = client.get("/api/myself/").await.unwrap_err();
    match error {
        LbError::Status { status, body } => {
            assert_eq!(status.as_u16(), 403);
            assert_eq!(body, "Forbidden");
        }
        other => panic!("expected Status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_json_maps_to_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/myself/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = build_client(&server, 12345);
    let error = client.get("/api/myself/").await.unwrap_err();
    match error {
        LbError::Decode { body, .. } => assert_eq!(body, "not json"),
        other => panic!("expected Decode error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_send_deserializes_data_envelope() {
    #[derive(serde::Deserialize)]
    struct Myself {
        username: String,
    }

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/myself/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "data": { "username": "alice" } })),
        )
        .mount(&server)
        .await;

    let client = build_client(&server, 12345);
    let myself: Myself = client
        .send("/api/myself/", Method::Get, None::<&()>)
        .await
        .unwrap();
    assert_eq!(myself.username, "alice");
}

#[tokio::test]
async fn test_send_maps_error_envelope_to_api_error() {
    let server = MockServer::start().await;
    let response = serde_json::json!({
        "error": { "message": "Invalid signature", "error_code": 41 }
    });

    Mock::given(method("GET"))
        .and(path("/api/myself/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(response))
        .mount(&server)
        .await;

    let client = build_client(&server, 12345);
    let error = client
        .send::<serde_json::Value, ()>("/api/myself/", Method::Get, None)
        .await
        .unwrap_err();
    match error {
        LbError::Api(api_error) => {
            assert_eq!(api_error.error_code, Some(41));
            assert_eq!(api_error.message, "Invalid signature");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_consecutive_requests_use_distinct_nonces() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/myself/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": {} })))
        .mount(&server)
        .await;

    // Default client with the time-based nonce provider.
    let client = LbRestClient::builder(Credentials::new("test_key", "test_secret"))
        .base_url(server.uri())
        .build();
    client.get("/api/myself/").await.unwrap();
    client.get("/api/myself/").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let nonce = |i: usize| {
        requests[i]
            .headers
            .get("Apiauth-Nonce")
            .unwrap()
            .to_str()
            .unwrap()
            .parse::<u64>()
            .unwrap()
    };
    let signature = |i: usize| requests[i].headers.get("Apiauth-Signature").unwrap().clone();

    assert!(nonce(1) > nonce(0), "nonces must strictly increase");
    assert_ne!(signature(0), signature(1), "signatures must differ per call");
}

#[tokio::test]
async fn test_transport_failure_maps_to_transport_error() {
    // Connect to a server that is no longer listening. A pooled server from
    // `MockServer::start()` keeps listening after drop, so use a dedicated one.
    let server = MockServer::builder().start().await;
    let uri = server.uri();
    drop(server);

    let client = LbRestClient::builder(Credentials::new("test_key", "test_secret"))
        .base_url(uri)
        .build();
    let error = client.get("/api/myself/").await.unwrap_err();
    assert!(
        matches!(
            error,
            LbError::Transport(_) | LbError::TransportMiddleware(_)
        ),
        "expected transport error, got: {error:?}"
    );
}
