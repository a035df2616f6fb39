//! Dispatcher tests against a scripted transport on a paused clock.

mod common;

use common::{init_tracing, MockTransport, Script};
use hostwire::{
    Client, Error, Failure, HeaderSet, JsonClient, Method, RequestMetadata, TimeoutAction,
    TransportError, METHOD_OVERRIDE_HEADER,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn client_with(transport: &MockTransport) -> Client {
    init_tracing();
    Client::builder()
        .host("api.test")
        .port(8080)
        .transport(Arc::new(transport.clone()))
        .build()
        .unwrap()
}

#[derive(Debug)]
enum Outcome {
    Complete(Vec<u8>),
    Error(Failure),
}

#[tokio::test(start_paused = true)]
async fn test_completion_before_deadline_never_fires_guard() {
    let transport = MockTransport::new(Script::respond(200, "ok").after(Duration::from_secs(29)));
    let client = client_with(&transport);

    let response = client
        .call(RequestMetadata::new(Method::GET, "/slow"))
        .await
        .unwrap();

    assert_eq!(response.data, b"ok".to_vec());
    assert_eq!(transport.aborts(), 0);
    assert_eq!(transport.closes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_aborts_request() {
    let transport = MockTransport::new(Script::respond(200, "late").after(Duration::from_secs(60)));
    let client = client_with(&transport);

    let started = tokio::time::Instant::now();
    let result = client.call(RequestMetadata::new(Method::GET, "/slow")).await;

    match result {
        Err(Error::Transport(failure)) => {
            assert_eq!(failure.error, TransportError::OperationCanceled);
            assert_eq!(failure.code(), 5);
            assert_eq!(failure.status, 0);
            assert_eq!(failure.message, "Timeout");
        }
        other => panic!("Expected timeout failure, got {:?}", other),
    }
    assert_eq!(transport.aborts(), 1);
    assert_eq!(transport.closes(), 0);
    assert!(started.elapsed() >= Duration::from_secs(30));
    assert!(started.elapsed() < Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_configured_timeout_and_close_action() {
    let transport = MockTransport::new(
        Script::respond(200, "full body")
            .after(Duration::from_secs(10))
            .with_partial(200, "partial"),
    );
    let client = Client::builder()
        .host("api.test")
        .timeout(Duration::from_secs(2))
        .timeout_action(TimeoutAction::Close)
        .transport(Arc::new(transport.clone()))
        .build()
        .unwrap();

    let response = client
        .call(RequestMetadata::new(Method::GET, "/stream"))
        .await
        .unwrap();

    // Close keeps what already arrived.
    assert_eq!(response.data, b"partial".to_vec());
    assert_eq!(transport.closes(), 1);
    assert_eq!(transport.aborts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_timeout_waits_for_completion() {
    let transport =
        MockTransport::new(Script::respond(200, "eventually").after(Duration::from_secs(7200)));
    let client = Client::builder()
        .host("api.test")
        .timeout(Duration::MAX)
        .transport(Arc::new(transport.clone()))
        .build()
        .unwrap();

    let response = client
        .call(RequestMetadata::new(Method::GET, "/"))
        .await
        .unwrap();

    assert_eq!(response.data, b"eventually".to_vec());
    assert_eq!(transport.aborts(), 0);
    assert_eq!(transport.closes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_exactly_one_callback_on_success() {
    let transport = MockTransport::new(Script::respond(200, "done"));
    let client = client_with(&transport);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let error_tx = tx.clone();

    client.send_request(
        RequestMetadata::new(Method::GET, "/once"),
        move |body, _headers| tx.send(Outcome::Complete(body)).unwrap(),
        move |failure| error_tx.send(Outcome::Error(failure)).unwrap(),
    );

    match rx.recv().await {
        Some(Outcome::Complete(body)) => assert_eq!(body, b"done".to_vec()),
        other => panic!("Expected completion, got {:?}", other),
    }

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_exactly_one_callback_on_timeout() {
    let transport = MockTransport::new(Script::respond(200, "late").after(Duration::from_secs(45)));
    let client = client_with(&transport);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let error_tx = tx.clone();

    client.send_request(
        RequestMetadata::new(Method::GET, "/once"),
        move |body, _headers| tx.send(Outcome::Complete(body)).unwrap(),
        move |failure| error_tx.send(Outcome::Error(failure)).unwrap(),
    );

    match rx.recv().await {
        Some(Outcome::Error(failure)) => assert_eq!(failure.message, "Timeout"),
        other => panic!("Expected timeout, got {:?}", other),
    }

    // The scripted completion at 45s must not produce a second callback.
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_non_200_success_status_is_error() {
    let transport = MockTransport::new(Script::respond(201, r#"{"id":1}"#));
    let client = client_with(&transport);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let error_tx = tx.clone();

    client.send_request(
        RequestMetadata::new(Method::POST, "/items").with_body(b"{}".to_vec()),
        move |body, _headers| tx.send(Outcome::Complete(body)).unwrap(),
        move |failure| error_tx.send(Outcome::Error(failure)).unwrap(),
    );

    match rx.recv().await {
        Some(Outcome::Error(failure)) => {
            assert_eq!(failure.error, TransportError::NoError);
            assert_eq!(failure.status, 201);
            assert_eq!(
                failure.message,
                "Server HTTP error code: 201 (Internal code: 0)"
            );
        }
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_message() {
    let transport = MockTransport::new(Script::fail(TransportError::HostNotFound));
    let client = client_with(&transport);

    let err = client
        .call(RequestMetadata::new(Method::GET, "/"))
        .await
        .unwrap_err();

    assert_eq!(err.transport_error(), Some(TransportError::HostNotFound));
    assert_eq!(err.to_string(), "Host not found");
}

#[tokio::test(start_paused = true)]
async fn test_primitive_selection() {
    let transport = MockTransport::new(Script::respond(200, ""));
    let client = client_with(&transport);

    let cases = [
        (Method::GET, &b""[..], "get", None),
        (Method::POST, &b"{}"[..], "post", None),
        (Method::PUT, &b"{}"[..], "put", None),
        (Method::DELETE, &b""[..], "delete", None),
        (Method::DELETE, &b"{\"id\":1}"[..], "send_custom", Some("DELETE")),
        (Method::PATCH, &b"{}"[..], "send_custom", Some("PATCH")),
        (Method::PATCH, &b""[..], "send_custom", Some("PATCH")),
    ];

    for (method, body, primitive, verb) in cases {
        client
            .call(RequestMetadata::new(method, "/items/1").with_body(body.to_vec()))
            .await
            .unwrap();

        let call = transport.last_call();
        assert_eq!(call.primitive, primitive, "{method} with {} body bytes", body.len());
        assert_eq!(call.verb.as_deref(), verb);
        assert_eq!(call.request.headers.get(METHOD_OVERRIDE_HEADER), verb);
        assert_eq!(call.request.body, body.to_vec());
    }
}

#[tokio::test(start_paused = true)]
async fn test_get_body_is_dropped() {
    let transport = MockTransport::new(Script::respond(200, ""));
    let client = client_with(&transport);

    client
        .call(RequestMetadata::new(Method::GET, "/").with_body(b"{\"a\":1}".to_vec()))
        .await
        .unwrap();

    assert!(transport.last_call().request.body.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_header_precedence_and_url() {
    let transport = MockTransport::new(Script::respond(200, ""));
    let mut client = client_with(&transport);
    client.add_interceptor(|headers: &mut HeaderSet| {
        headers.set("X", "1");
        headers.set("Content-Type", "text/plain");
        headers.set("Authorization", "Bearer token");
    });

    client
        .call(
            RequestMetadata::new(Method::GET, "/search")
                .with_header("X", "2")
                .with_query_param("q", "rust lang"),
        )
        .await
        .unwrap();
    let request = transport.last_call().request;
    assert_eq!(request.headers.get("X"), Some("2"));
    assert_eq!(request.headers.get("Content-Type"), Some("application/json"));
    assert_eq!(request.headers.get("Authorization"), Some("Bearer token"));
    assert_eq!(
        request.url.as_str(),
        "http://api.test:8080/search?q=rust+lang"
    );

    client
        .call(RequestMetadata::new(Method::GET, "/").with_header("Content-Type", "text/plain"))
        .await
        .unwrap();
    let request = transport.last_call().request;
    assert_eq!(request.headers.get("Content-Type"), Some("text/plain"));
}

#[tokio::test(start_paused = true)]
async fn test_interceptors_added_later_apply_to_later_requests() {
    let transport = MockTransport::new(Script::respond(200, ""));
    let mut client = client_with(&transport);

    client.call(RequestMetadata::new(Method::GET, "/")).await.unwrap();
    assert!(!transport.last_call().request.headers.contains("X-Late"));

    client.add_interceptor(|headers: &mut HeaderSet| headers.set("X-Late", "yes"));
    client.call(RequestMetadata::new(Method::GET, "/")).await.unwrap();
    assert_eq!(transport.last_call().request.headers.get("X-Late"), Some("yes"));
}

#[tokio::test(start_paused = true)]
async fn test_json_array_body_is_wrapped() {
    let transport = MockTransport::new(Script::respond(200, "[1,2,3]"));
    let client = JsonClient::new(client_with(&transport));

    let response = client.get("/numbers").await.unwrap();

    assert_eq!(
        serde_json::Value::Object(response.data),
        json!({"magic_array_key": [1, 2, 3]})
    );
}

#[tokio::test(start_paused = true)]
async fn test_json_decode_error_carries_only_message() {
    for body in ["", "{not json"] {
        let transport = MockTransport::new(Script::respond(200, body));
        let client = JsonClient::new(client_with(&transport));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let error_tx = tx.clone();

        client.send_request(
            RequestMetadata::new(Method::GET, "/broken"),
            &json!({}),
            move |object, _headers| tx.send(Ok(object)).unwrap(),
            move |error| error_tx.send(Err(error)).unwrap(),
        );

        match rx.recv().await {
            Some(Err(Error::Decode(message))) => assert!(!message.is_empty()),
            other => panic!("Expected decode error for {:?}, got {:?}", body, other),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_json_failure_passes_through_unparsed() {
    let transport = MockTransport::new(Script::respond(404, "<html>not json</html>"));
    let client = JsonClient::new(client_with(&transport));

    match client.get("/missing").await {
        Err(Error::Transport(failure)) => {
            assert_eq!(failure.error, TransportError::ContentNotFound);
            assert_eq!(failure.status, 404);
            assert_eq!(failure.message, "Content not found");
        }
        other => panic!("Expected transport failure, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_json_request_body_and_delete_override() {
    let transport = MockTransport::new(Script::respond(200, "{}"));
    let client = JsonClient::new(client_with(&transport));

    client
        .post("/items", &json!({"name": "lamp", "tags": ["a"]}))
        .await
        .unwrap();
    let call = transport.last_call();
    let sent: serde_json::Value = serde_json::from_slice(&call.request.body).unwrap();
    assert_eq!(sent, json!({"name": "lamp", "tags": ["a"]}));
    assert_eq!(
        call.request.headers.get("Content-Type"),
        Some("application/json")
    );

    client
        .delete("/items/1", &serde_json::Map::new())
        .await
        .unwrap();
    let call = transport.last_call();
    assert_eq!(call.primitive, "send_custom");
    assert_eq!(call.verb.as_deref(), Some("DELETE"));
    assert_eq!(call.request.body, b"{}".to_vec());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_are_independent() {
    let transport = MockTransport::new(Script::respond(200, "{\"ok\":true}"));
    let client = JsonClient::new(client_with(&transport));

    let (first, second) = tokio::join!(client.get("/a"), client.get("/b"));

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(transport.calls().len(), 2);
}
