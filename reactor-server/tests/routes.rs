//! HTTP-level tests against the full router with the bundled templates.

use std::num::NonZeroUsize;
use std::path::Path;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use reactor::core::checksum::{ChecksumValidator, KeyOrder};
use reactor::io::render::TemplateRenderer;
use reactor::message::Engine;
use reactor::test_support::{TEST_SECRET, signed_body};
use reactor_server::cache::InstanceCache;
use reactor_server::components::Registry;
use reactor_server::routes;
use reactor_server::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;

fn validator() -> ChecksumValidator {
    ChecksumValidator::new(TEST_SECRET, KeyOrder::Document)
}

fn state() -> AppState {
    let templates = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");
    AppState::new(
        Engine::new(validator()),
        Registry::with_defaults(),
        TemplateRenderer::from_dir(&templates, validator()),
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, bytes.to_vec())
}

async fn post(app: &Router, uri: &str, body: Vec<u8>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .expect("request");
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).expect("json reply"))
}

#[tokio::test]
async fn health_returns_ok() {
    let app = routes::app(state());
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("request");
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn call_method_rerenders_component() {
    let app = routes::app(state());
    let body = signed_body(
        &validator(),
        "c-1",
        json!({"count": 0, "step": 1}),
        json!([{"type": "callMethod", "payload": {"name": "add('5')"}}]),
    );

    let (status, reply) = post(&app, "/message/counter", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["id"], json!("c-1"));
    assert_eq!(reply["data"], json!({"count": 5, "step": 1}));
    let dom = reply["dom"].as_str().expect("dom");
    assert!(dom.contains("<span>5</span>"), "{dom}");
    assert!(dom.contains("reactor:id=\"c-1\""), "{dom}");
}

#[tokio::test]
async fn nested_sync_input_reaches_field_object() {
    let app = routes::app(state());
    let body = signed_body(
        &validator(),
        "b-1",
        json!({"title": "Good Omens", "author": {"name": "Neil", "born": null}}),
        json!([{"type": "syncInput", "payload": {"name": "author.name", "value": "Neil Gaiman"}}]),
    );

    let (_, reply) = post(&app, "/message/book", body).await;

    assert_eq!(
        reply["data"],
        json!({"title": "Good Omens", "author": {"name": "Neil Gaiman", "born": null}})
    );
    let dom = reply["dom"].as_str().expect("dom");
    assert!(dom.contains("Good Omens by Neil Gaiman"), "{dom}");
}

#[tokio::test]
async fn instances_persist_between_requests() {
    let state = state();
    let cache = state.cache.clone();
    let app = routes::app(state);

    let first = signed_body(
        &validator(),
        "c-1",
        json!({"count": 0, "step": 1}),
        json!([
            {"type": "syncInput", "payload": {"name": "step", "value": 5}},
            {"type": "callMethod", "payload": {"name": "increment"}}
        ]),
    );
    let (_, reply) = post(&app, "/message/counter", first).await;
    assert_eq!(reply["data"], json!({"count": 5, "step": 5}));

    let second = signed_body(
        &validator(),
        "c-1",
        json!({}),
        json!([{"type": "callMethod", "payload": {"name": "increment"}}]),
    );
    let (_, reply) = post(&app, "/message/counter", second).await;
    assert_eq!(reply["data"], json!({"count": 10, "step": 5}));

    let cached = cache.attributes("c-1").expect("cached instance");
    assert_eq!(cached.get("count"), Some(&json!(10)));
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn form_string_input_updates_integer_field() {
    let app = routes::app(state());
    let body = signed_body(
        &validator(),
        "c-1",
        json!({"count": 0, "step": 1}),
        json!([
            {"type": "syncInput", "payload": {"name": "step", "value": "5"}},
            {"type": "callMethod", "payload": {"name": "increment"}}
        ]),
    );

    let (_, reply) = post(&app, "/message/counter", body).await;
    assert_eq!(reply["data"], json!({"count": 5, "step": 5}));
}

#[tokio::test]
async fn arithmetic_overflow_is_an_error_reply() {
    let state = state();
    let cache = state.cache.clone();
    let app = routes::app(state);
    let body = signed_body(
        &validator(),
        "c-1",
        json!({"count": 1, "step": 1}),
        json!([
            {"type": "syncInput", "payload": {"name": "step", "value": i64::MAX}},
            {"type": "callMethod", "payload": {"name": "increment"}}
        ]),
    );

    let (status, reply) = post(&app, "/message/counter", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        reply,
        json!({"error": "Method 'increment' failed: count overflow"})
    );
    let cached = cache.attributes("c-1").expect("instance kept");
    assert_eq!(cached.get("count"), Some(&json!(1)));
}

#[tokio::test]
async fn cache_stays_bounded_across_many_ids() {
    let capacity = NonZeroUsize::new(8).expect("non-zero");
    let state = state().with_cache(InstanceCache::with_capacity(capacity));
    let cache = state.cache.clone();
    let app = routes::app(state);

    for index in 0..40 {
        let body = signed_body(&validator(), &format!("x-{index}"), json!({}), json!([]));
        let (_, reply) = post(&app, "/message/counter", body).await;
        assert!(reply.get("error").is_none(), "{reply}");
    }

    assert_eq!(cache.len(), 8);
    assert_eq!(cache.lock_entries(), 0);
    assert!(cache.attributes("x-39").is_some());
    assert!(cache.attributes("x-0").is_none());
}

#[tokio::test]
async fn failures_are_reported_with_success_status() {
    let app = routes::app(state());
    let body = signed_body(&validator(), "c-1", json!({"count": 1}), json!([]));
    let tampered = String::from_utf8(body)
        .expect("utf8")
        .replace("\"count\":1", "\"count\":100");

    let (status, reply) = post(&app, "/message/counter", tampered.into_bytes()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply, json!({"error": "Checksum does not match"}));
}

#[tokio::test]
async fn unknown_component_is_reported() {
    let app = routes::app(state());
    let body = signed_body(&validator(), "s-1", json!({}), json!([]));

    let (status, reply) = post(&app, "/message/spaceship", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply, json!({"error": "Unknown component 'spaceship'"}));
}

#[tokio::test]
async fn missing_component_name_is_reported() {
    let app = routes::app(state());
    let body = signed_body(&validator(), "c-1", json!({}), json!([]));

    let (_, reply) = post(&app, "/message", body).await;
    assert_eq!(reply, json!({"error": "Missing component name in url"}));
}

#[tokio::test]
async fn message_endpoint_only_accepts_post() {
    let app = routes::app(state());
    let request = Request::builder()
        .uri("/message/counter")
        .body(Body::empty())
        .expect("request");
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
