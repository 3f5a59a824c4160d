//! Request mapping between `agent-types`'s [`Turn`]/[`Part`] currency and
//! the Anthropic Messages API wire format.
//!
//! Narrowed to the one content model `agent-types::Part` actually carries
//! (no images, documents, or prompt-cache controls).
//!
//! Reference: <https://docs.anthropic.com/en/api/messages>

use agent_types::{Part, ToolDescriptor, Turn};

/// Build the JSON body for a (non-streaming-flag-aware) Anthropic Messages
/// API request. The caller sets `"stream": true` afterward.
#[must_use]
pub(crate) fn to_api_request(
    model: &str,
    system_prompt: &str,
    turns: &[Turn],
    tools: &[ToolDescriptor],
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": model,
        "system": system_prompt,
        "messages": map_turns(turns),
        "max_tokens": 4096,
    });

    if !tools.is_empty() {
        body["tools"] = serde_json::Value::Array(tools.iter().map(map_tool_descriptor).collect());
    }

    body
}

/// Map the non-system turns to Anthropic's message array. The system turn
/// `agent-core` keeps at index 0 of the log is never passed here — it is
/// threaded separately through the adapter's `system_prompt` field.
fn map_turns(turns: &[Turn]) -> serde_json::Value {
    let arr: Vec<serde_json::Value> = turns
        .iter()
        .filter(|t| !matches!(t.role, agent_types::Role::System))
        .map(|turn| {
            let role = match turn.role {
                agent_types::Role::User => "user",
                agent_types::Role::Assistant => "assistant",
                agent_types::Role::System => unreachable!("filtered above"),
            };
            serde_json::json!({
                "role": role,
                "content": map_parts(&turn.parts),
            })
        })
        .collect();
    serde_json::Value::Array(arr)
}

fn map_parts(parts: &[Part]) -> serde_json::Value {
    serde_json::Value::Array(parts.iter().map(map_part).collect())
}

fn map_part(part: &Part) -> serde_json::Value {
    match part {
        Part::Text { content } => serde_json::json!({
            "type": "text",
            "text": content,
        }),
        // Anthropic requires a `signature` on replayed thinking blocks; the
        // core does not track one (spec has no concept of it), so replaying
        // our own prior thinking back as a prompt is not supported. This is
        // only reached if a caller hand-constructs a `Reasoning` part into
        // history themselves.
        Part::Reasoning { content } => serde_json::json!({
            "type": "thinking",
            "thinking": content,
            "signature": "",
        }),
        Part::ToolCall {
            call_id,
            name,
            input,
            ..
        } => serde_json::json!({
            "type": "tool_use",
            "id": call_id,
            "name": name,
            "input": input,
        }),
        Part::ToolResult {
            call_id,
            result,
            is_error,
            ..
        } => serde_json::json!({
            "type": "tool_result",
            "tool_use_id": call_id,
            "content": stringify_result(result),
            "is_error": is_error,
        }),
    }
}

/// Anthropic tool-result content must be a string or a content-block array;
/// a bare JSON string is passed through verbatim, anything else is
/// serialized.
fn stringify_result(result: &serde_json::Value) -> String {
    match result {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn map_tool_descriptor(tool: &ToolDescriptor) -> serde_json::Value {
    serde_json::json!({
        "name": tool.name,
        "description": tool.info.description,
        "input_schema": tool.info.input_schema,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_types::{ToolInfo, Turn};

    #[test]
    fn system_turn_is_excluded_from_messages() {
        let turns = vec![Turn::system("be nice"), Turn::user_text("hi")];
        let body = to_api_request("claude-x", "be nice", &turns, &[]);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["system"], "be nice");
    }

    #[test]
    fn user_turn_maps_to_text_block() {
        let turns = vec![Turn::user_text("hello")];
        let body = to_api_request("claude-x", "", &turns, &[]);
        let msg = &body["messages"][0];
        assert_eq!(msg["role"], "user");
        assert_eq!(msg["content"][0]["type"], "text");
        assert_eq!(msg["content"][0]["text"], "hello");
    }

    #[test]
    fn tool_result_part_maps_tool_use_id_and_is_error() {
        let turns = vec![Turn::tool_results(vec![Part::ToolResult {
            call_id: "call_1".into(),
            name: "stub".into(),
            kind: "tool_use".into(),
            result: serde_json::json!("ok"),
            is_error: false,
            source_err: None,
        }])];
        let body = to_api_request("claude-x", "", &turns, &[]);
        let block = &body["messages"][0]["content"][0];
        assert_eq!(block["type"], "tool_result");
        assert_eq!(block["tool_use_id"], "call_1");
        assert_eq!(block["content"], "ok");
        assert_eq!(block["is_error"], false);
    }

    #[test]
    fn tool_result_non_string_value_is_serialized() {
        let turns = vec![Turn::tool_results(vec![Part::ToolResult {
            call_id: "call_1".into(),
            name: "stub".into(),
            kind: "tool_use".into(),
            result: serde_json::json!({"n": 1}),
            is_error: false,
            source_err: None,
        }])];
        let body = to_api_request("claude-x", "", &turns, &[]);
        assert_eq!(body["messages"][0]["content"][0]["content"], r#"{"n":1}"#);
    }

    #[test]
    fn no_tools_omits_tools_key() {
        let body = to_api_request("claude-x", "", &[], &[]);
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn tool_descriptor_maps_name_description_schema() {
        let tools = vec![ToolDescriptor {
            name: "search".into(),
            info: ToolInfo {
                description: "search the web".into(),
                input_schema: serde_json::json!({"type": "object"}),
            },
        }];
        let body = to_api_request("claude-x", "", &[], &tools);
        let t = &body["tools"][0];
        assert_eq!(t["name"], "search");
        assert_eq!(t["description"], "search the web");
        assert_eq!(t["input_schema"], serde_json::json!({"type": "object"}));
    }
}
