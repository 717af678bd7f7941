//! Contract tests for the OpenAI chat client against an in-process fake server.

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use docqa_model::{ChatMessage, ChatModel, ChatRequest, ModelError, OpenAIChatModel, Role};
use serde_json::{Value, json};

#[derive(Clone)]
struct FakeProvider {
    status: StatusCode,
    reply: Value,
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn completions(
    State(fake): State<FakeProvider>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    fake.seen.lock().unwrap().push((auth, body));
    (fake.status, Json(fake.reply.clone()))
}

async fn spawn_provider(
    status: StatusCode,
    reply: Value,
) -> (String, Arc<Mutex<Vec<(Option<String>, Value)>>>, tokio::task::JoinHandle<()>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let fake = FakeProvider { status, reply, seen: seen.clone() };
    let app = Router::new().route("/v1/chat/completions", post(completions)).with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind fake provider");
    let addr = listener.local_addr().expect("fake provider addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake provider run");
    });

    (format!("http://{addr}/v1"), seen, handle)
}

fn request() -> ChatRequest {
    ChatRequest::new("gpt-4")
        .with_message(ChatMessage::system("be brief"))
        .with_message(ChatMessage::user("hi"))
        .with_temperature(0.0)
}

#[tokio::test]
async fn sends_messages_in_order_with_bearer_auth() {
    let reply = json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": "  hello  "},
                "finish_reason": "stop"
            }
        ]
    });
    let (base, seen, handle) = spawn_provider(StatusCode::OK, reply).await;

    let model = OpenAIChatModel::new("sk-test").unwrap().with_base_url(base);
    let response = model.complete(request()).await.unwrap();

    assert_eq!(response.first_text(), Some("  hello  "));
    assert_eq!(response.candidates[0].finish_reason.as_deref(), Some("stop"));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (auth, body) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "gpt-4");
    assert_eq!(body["temperature"], 0.0);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "be brief");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "hi");

    handle.abort();
}

#[tokio::test]
async fn empty_choice_list_yields_no_candidates() {
    let (base, _seen, handle) = spawn_provider(StatusCode::OK, json!({"choices": []})).await;

    let model = OpenAIChatModel::new("sk-test").unwrap().with_base_url(base);
    let response = model.complete(request()).await.unwrap();

    assert!(response.candidates.is_empty());
    assert_eq!(response.first_text(), None);

    handle.abort();
}

#[tokio::test]
async fn null_content_maps_to_empty_candidate() {
    let reply = json!({
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": null},
            "finish_reason": "content_filter"
        }]
    });
    let (base, _seen, handle) = spawn_provider(StatusCode::OK, reply).await;

    let model = OpenAIChatModel::new("sk-test").unwrap().with_base_url(base);
    let response = model.complete(request()).await.unwrap();

    assert_eq!(response.first_text(), Some(""));
    assert_eq!(response.candidates[0].finish_reason.as_deref(), Some("content_filter"));

    handle.abort();
}

#[tokio::test]
async fn api_error_carries_status_and_provider_message() {
    let reply = json!({"error": {"message": "Rate limit reached", "type": "requests"}});
    let (base, seen, handle) = spawn_provider(StatusCode::TOO_MANY_REQUESTS, reply).await;

    let model = OpenAIChatModel::new("sk-test").unwrap().with_base_url(base);
    let err = model.complete(request()).await.unwrap_err();

    match &err {
        ModelError::Api { status, message, .. } => {
            assert_eq!(*status, 429);
            assert_eq!(message, "Rate limit reached");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(err.is_rate_limited());
    // no retry on rate limiting
    assert_eq!(seen.lock().unwrap().len(), 1);

    handle.abort();
}

#[tokio::test]
async fn unreachable_provider_is_a_request_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let model =
        OpenAIChatModel::new("sk-test").unwrap().with_base_url(format!("http://{addr}/v1"));
    let err = model.complete(request()).await.unwrap_err();
    assert!(matches!(err, ModelError::Request { .. }), "got {err:?}");
}

#[test]
fn empty_api_key_is_rejected() {
    assert!(matches!(OpenAIChatModel::new("  "), Err(ModelError::Config(_))));
}

#[tokio::test]
async fn non_json_error_body_is_not_carried_into_the_error() {
    let filler = "<p>bad gateway</p>".repeat(3000);
    let page = format!("<html>{filler}SECRET_UPSTREAM_DETAILS</html>");
    let page_len = page.len();
    let app = Router::new().route(
        "/v1/chat/completions",
        post(move || {
            let page = page.clone();
            async move { (StatusCode::BAD_GATEWAY, page) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake provider run");
    });

    let model =
        OpenAIChatModel::new("sk-test").unwrap().with_base_url(format!("http://{addr}/v1"));
    let err = model.complete(request()).await.unwrap_err();

    match &err {
        ModelError::Api { status, message, .. } => {
            assert_eq!(*status, 502);
            assert!(message.contains(&page_len.to_string()));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    let rendered = err.to_string();
    assert!(rendered.len() < 300, "error grew to {} bytes", rendered.len());
    assert!(!rendered.contains("SECRET_UPSTREAM_DETAILS"));

    handle.abort();
}

#[tokio::test]
async fn long_provider_message_is_truncated() {
    let reply = json!({"error": {"message": "x".repeat(5000)}});
    let (base, _seen, handle) = spawn_provider(StatusCode::INTERNAL_SERVER_ERROR, reply).await;

    let model = OpenAIChatModel::new("sk-test").unwrap().with_base_url(base);
    match model.complete(request()).await {
        Err(ModelError::Api { message, .. }) => assert_eq!(message.chars().count(), 200),
        other => panic!("expected Api error, got {other:?}"),
    }

    handle.abort();
}

#[test]
fn request_exposes_messages_by_role() {
    let request = request().with_message(ChatMessage::assistant("hello again"));
    assert_eq!(request.message(Role::System), Some("be brief"));
    assert_eq!(request.message(Role::User), Some("hi"));
    assert_eq!(request.message(Role::Assistant), Some("hello again"));
    assert_eq!(request.messages[2].role, Role::Assistant);
}
