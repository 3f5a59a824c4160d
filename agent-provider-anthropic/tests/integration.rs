//! Integration tests for the Anthropic adapter using a mocked HTTP server,
//! one `MockServer` per test.

use agent_types::{ConversationAdapter, ConversationFactory, FinishReason, LowLevelEvent, ModelId, Part};
use agent_provider_anthropic::Anthropic;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse_body(events: &[(&str, serde_json::Value)]) -> String {
    let mut out = String::new();
    for (event, data) in events {
        out.push_str("event: ");
        out.push_str(event);
        out.push('\n');
        out.push_str("data: ");
        out.push_str(&data.to_string());
        out.push_str("\n\n");
    }
    out
}

async fn drain(
    adapter: &mut impl ConversationAdapter,
    cancel: CancellationToken,
) -> Vec<LowLevelEvent> {
    let mut stream = adapter.send(cancel);
    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn send_parses_text_response_into_completed_success() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        (
            "message_start",
            serde_json::json!({"type":"message_start","message":{"usage":{"input_tokens":12}}}),
        ),
        (
            "content_block_start",
            serde_json::json!({"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}),
        ),
        (
            "content_block_delta",
            serde_json::json!({"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi there"}}),
        ),
        (
            "content_block_stop",
            serde_json::json!({"type":"content_block_stop","index":0}),
        ),
        (
            "message_delta",
            serde_json::json!({"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":5}}),
        ),
        ("message_stop", serde_json::json!({"type":"message_stop"})),
    ]);

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body),
        )
        .expect(1)
        .mount(&server)
        .await;

    let factory = Anthropic::new("test-key").base_url(server.uri());
    let mut adapter = factory
        .create(&ModelId::from("claude-x"), "be nice", &[])
        .unwrap();
    adapter.append_user_turn("hello".into()).unwrap();

    let events = drain(&mut adapter, CancellationToken::new()).await;

    let text = events.iter().find_map(|e| match e {
        LowLevelEvent::TextDelta { content, done: true } => Some(content.clone()),
        _ => None,
    });
    assert_eq!(text.as_deref(), Some("Hi there"));

    let completed = events.iter().find_map(|e| match e {
        LowLevelEvent::CompletedSuccess(turn) => Some(turn.clone()),
        _ => None,
    });
    let turn = completed.expect("expected a CompletedSuccess event");
    assert!(matches!(turn.finish_reason, Some(FinishReason::EndTurn)));
    assert_eq!(turn.token_usage.total_input, 12);
    assert_eq!(turn.token_usage.total_output, 5);
    assert!(matches!(&turn.parts[0], Part::Text { content } if content == "Hi there"));
}

#[tokio::test]
async fn send_maps_tool_use_stop_reason() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        (
            "content_block_start",
            serde_json::json!({"type":"content_block_start","index":0,"content_block":{"type":"tool_use","id":"toolu_1","name":"search"}}),
        ),
        (
            "content_block_delta",
            serde_json::json!({"type":"content_block_delta","index":0,"delta":{"type":"input_json_delta","partial_json":"{\"q\":\"rust\"}"}}),
        ),
        (
            "content_block_stop",
            serde_json::json!({"type":"content_block_stop","index":0}),
        ),
        (
            "message_delta",
            serde_json::json!({"type":"message_delta","delta":{"stop_reason":"tool_use"}}),
        ),
    ]);

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let factory = Anthropic::new("test-key").base_url(server.uri());
    let mut adapter = factory.create(&ModelId::from("claude-x"), "", &[]).unwrap();

    let events = drain(&mut adapter, CancellationToken::new()).await;
    let turn = events
        .iter()
        .find_map(|e| match e {
            LowLevelEvent::CompletedSuccess(t) => Some(t.clone()),
            _ => None,
        })
        .expect("expected a completion");
    assert!(matches!(turn.finish_reason, Some(FinishReason::ToolUse)));
    assert!(matches!(&turn.parts[0], Part::ToolCall { name, .. } if name == "search"));
}

#[tokio::test]
async fn send_maps_401_to_an_error_event() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
        .mount(&server)
        .await;

    let factory = Anthropic::new("bad-key").base_url(server.uri());
    let mut adapter = factory.create(&ModelId::from("claude-x"), "", &[]).unwrap();

    let events = drain(&mut adapter, CancellationToken::new()).await;
    assert!(events
        .iter()
        .any(|e| matches!(e, LowLevelEvent::Error(err) if err.0.contains("authentication failed"))));
}

#[tokio::test]
async fn send_maps_500_to_service_unavailable_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let factory = Anthropic::new("test-key").base_url(server.uri());
    let mut adapter = factory.create(&ModelId::from("claude-x"), "", &[]).unwrap();

    let events = drain(&mut adapter, CancellationToken::new()).await;
    assert!(events
        .iter()
        .any(|e| matches!(e, LowLevelEvent::Error(err) if err.0.contains("service unavailable"))));
}

#[tokio::test]
async fn send_cancellation_before_response_yields_no_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(30)))
        .mount(&server)
        .await;

    let factory = Anthropic::new("test-key").base_url(server.uri());
    let mut adapter = factory.create(&ModelId::from("claude-x"), "", &[]).unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let events = drain(&mut adapter, cancel).await;
    assert!(events.is_empty());
}
