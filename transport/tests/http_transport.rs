//! Integration tests for the HTTP transport against a mock backend.

use std::time::Duration;

use intake_transport::{
    HttpTransport, HttpTransportConfig, ReplyBody, ReplyEnvelope, RetryConfig, Transport,
    TransportError,
};
use intake_types::{Payload, PayloadValue, SubmissionResult};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport_for(server: &MockServer) -> HttpTransport {
    HttpTransport::new(HttpTransportConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        ..Default::default()
    })
    .expect("transport builds")
}

fn contact_payload() -> Payload {
    let mut payload = Payload::new();
    payload.insert("name", "Jane Doe");
    payload.insert("email", "jane@x.com");
    payload.insert("subject", "Hello");
    payload.insert("message", "I would like a website.");
    payload
}

#[tokio::test]
async fn posts_json_and_reads_success_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit_contact"))
        .and(header("content-type", "application/json"))
        .and(header("accept", "application/json"))
        .and(header_exists("idempotency-key"))
        .and(body_json(json!({
            "name": "Jane Doe",
            "email": "jane@x.com",
            "subject": "Hello",
            "message": "I would like a website."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let reply = transport_for(&server)
        .send("/submit_contact", &contact_payload())
        .await
        .expect("reply");

    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, ReplyBody::Json(ReplyEnvelope::success()));
    assert_eq!(reply.interpret("fallback"), Ok(SubmissionResult::Success));
}

#[tokio::test]
async fn quote_lists_are_sent_as_arrays() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit_quote"))
        .and(body_json(json!({
            "firstName": "Jane",
            "technologies": ["react", "python"],
            "features": []
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut payload = Payload::new();
    payload.insert("firstName", "Jane");
    payload.insert(
        "technologies",
        PayloadValue::List(vec!["react".into(), "python".into()]),
    );
    payload.insert("features", PayloadValue::List(vec![]));

    let reply = transport_for(&server)
        .send("submit_quote", &payload)
        .await
        .expect("reply");
    assert!(reply.is_http_success());
}

#[tokio::test]
async fn server_error_reply_is_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit_quote"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"status": "error", "message": "SMTP login failed"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let reply = transport_for(&server)
        .send("/submit_quote", &Payload::new())
        .await
        .expect("reply");

    assert_eq!(reply.status, 500);
    assert_eq!(
        reply.interpret("fallback"),
        Ok(SubmissionResult::Failure("SMTP login failed".into()))
    );
}

#[tokio::test]
async fn non_json_success_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit_contact"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let reply = transport_for(&server)
        .send("/submit_contact", &contact_payload())
        .await
        .expect("reply");

    assert!(matches!(
        reply.interpret("fallback"),
        Err(TransportError::MalformedBody(_))
    ));
}

#[tokio::test]
async fn oversized_body_is_cut_off() {
    let server = MockServer::start().await;
    let huge = format!(r#"{{"status":"success","message":"{}"}}"#, "x".repeat(64 * 1024));
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(huge))
        .mount(&server)
        .await;

    let reply = transport_for(&server)
        .send("/submit_contact", &contact_payload())
        .await
        .expect("reply");

    assert!(matches!(reply.body, ReplyBody::Unreadable(_)));
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "success"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let transport = HttpTransport::new(HttpTransportConfig {
        base_url: server.uri(),
        timeout: Duration::from_millis(200),
        ..Default::default()
    })
    .expect("transport builds");

    let err = transport
        .send("/submit_contact", &contact_payload())
        .await
        .unwrap_err();
    assert_eq!(err, TransportError::Timeout(200));
}

#[tokio::test]
async fn refused_connection_is_network_error_after_retries() {
    // Grab a free port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let transport = HttpTransport::new(HttpTransportConfig {
        base_url: format!("http://{addr}"),
        retry: RetryConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            ..RetryConfig::default().with_max_retries(2)
        },
        ..Default::default()
    })
    .expect("transport builds");

    let err = transport
        .send("/submit_contact", &contact_payload())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Network(_)), "{err:?}");
}
