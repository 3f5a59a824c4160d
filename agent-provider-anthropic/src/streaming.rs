//! SSE parsing for the Anthropic Messages API streaming protocol.
//!
//! Buffers event/data lines per block index and assembles a full
//! [`Turn`] (`finish_reason` plus `token_usage`) once the stream reports
//! a stop reason.
//!
//! Reference: <https://docs.anthropic.com/en/api/messages-streaming>

use std::collections::HashMap;

use agent_types::{FinishReason, LowLevelEvent, Part, Role, TokenUsage, Turn};
use futures::{Stream, StreamExt};

/// Turn a raw HTTP byte stream into a stream of [`LowLevelEvent`]s,
/// followed by a trailing [`LowLevelEvent::CompletedSuccess`] once the
/// assembled message is known.
pub(crate) fn parse_byte_stream(
    byte_stream: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
) -> impl Stream<Item = LowLevelEvent> + Send + 'static {
    async_stream::stream! {
        let mut state = SseParserState::new();
        let mut bytes_stream = std::pin::pin!(byte_stream);
        let mut line_buf = String::new();

        while let Some(chunk_result) = bytes_stream.next().await {
            let chunk = match chunk_result {
                Ok(b) => b,
                Err(e) => {
                    yield LowLevelEvent::Error(agent_types::AdapterError::new(format!(
                        "stream read error: {e}"
                    )));
                    return;
                }
            };

            let chunk_str = match std::str::from_utf8(&chunk) {
                Ok(s) => s,
                Err(e) => {
                    yield LowLevelEvent::Error(agent_types::AdapterError::new(format!(
                        "UTF-8 decode error: {e}"
                    )));
                    return;
                }
            };

            line_buf.push_str(chunk_str);

            while let Some(newline_pos) = line_buf.find('\n') {
                let line = line_buf[..newline_pos].trim_end_matches('\r').to_string();
                line_buf.drain(..=newline_pos);
                for event in state.process_line(&line) {
                    yield event;
                }
            }
        }

        if !line_buf.trim().is_empty() {
            for event in state.process_line(line_buf.trim()) {
                yield event;
            }
        }

        if let Some(turn) = state.take_final_turn() {
            yield LowLevelEvent::CompletedSuccess(turn);
        }
    }
}

/// One content block being assembled across `content_block_delta` events.
enum BlockState {
    Text(String),
    Thinking(String),
    ToolUse {
        id: String,
        name: String,
        input_buf: String,
    },
}

/// Tracks in-progress streaming state across SSE events for a single
/// `send()` call.
struct SseParserState {
    current_event_type: Option<String>,
    current_data: String,

    blocks: HashMap<usize, BlockState>,
    /// Completed parts, in the order their blocks were closed.
    assembled: Vec<Part>,

    total_input: u64,
    cached_input: u64,
    total_output: u64,
    stop_reason: Option<String>,
}

impl SseParserState {
    fn new() -> Self {
        Self {
            current_event_type: None,
            current_data: String::new(),
            blocks: HashMap::new(),
            assembled: Vec::new(),
            total_input: 0,
            cached_input: 0,
            total_output: 0,
            stop_reason: None,
        }
    }

    fn process_line(&mut self, line: &str) -> Vec<LowLevelEvent> {
        if line.is_empty() {
            return self.dispatch_event();
        }

        if let Some(event_type) = line.strip_prefix("event: ") {
            self.current_event_type = Some(event_type.trim().to_string());
        } else if let Some(data) = line.strip_prefix("data: ") {
            if !self.current_data.is_empty() {
                self.current_data.push('\n');
            }
            self.current_data.push_str(data.trim());
        }
        // Comment lines (`:`) and anything else are ignored.

        Vec::new()
    }

    fn dispatch_event(&mut self) -> Vec<LowLevelEvent> {
        let Some(event_type) = self.current_event_type.take() else {
            self.current_data.clear();
            return Vec::new();
        };
        let data = std::mem::take(&mut self.current_data);

        if data.is_empty() || data == "[DONE]" {
            return Vec::new();
        }

        let json: serde_json::Value = match serde_json::from_str(&data) {
            Ok(v) => v,
            Err(e) => {
                return vec![LowLevelEvent::Error(agent_types::AdapterError::new(
                    format!("JSON parse error in SSE: {e}"),
                ))];
            }
        };

        match event_type.as_str() {
            "message_start" => self.handle_message_start(&json),
            "content_block_start" => self.handle_content_block_start(&json),
            "content_block_delta" => self.handle_content_block_delta(&json),
            "content_block_stop" => self.handle_content_block_stop(&json),
            "message_delta" => self.handle_message_delta(&json),
            "message_stop" | "ping" => Vec::new(),
            "error" => {
                let msg = json["error"]["message"]
                    .as_str()
                    .unwrap_or("unknown streaming error")
                    .to_string();
                vec![LowLevelEvent::Error(agent_types::AdapterError::new(msg))]
            }
            _ => Vec::new(),
        }
    }

    fn handle_message_start(&mut self, json: &serde_json::Value) -> Vec<LowLevelEvent> {
        let usage = &json["message"]["usage"];
        self.total_input = usage["input_tokens"].as_u64().unwrap_or(0);
        self.cached_input = usage["cache_read_input_tokens"].as_u64().unwrap_or(0);
        Vec::new()
    }

    fn handle_content_block_start(&mut self, json: &serde_json::Value) -> Vec<LowLevelEvent> {
        let index = json["index"].as_u64().unwrap_or(0) as usize;
        let block = &json["content_block"];
        match block["type"].as_str().unwrap_or("") {
            "text" => {
                self.blocks.insert(index, BlockState::Text(String::new()));
                Vec::new()
            }
            "thinking" => {
                self.blocks
                    .insert(index, BlockState::Thinking(String::new()));
                Vec::new()
            }
            "tool_use" => {
                self.blocks.insert(
                    index,
                    BlockState::ToolUse {
                        id: block["id"].as_str().unwrap_or("").to_string(),
                        name: block["name"].as_str().unwrap_or("").to_string(),
                        input_buf: String::new(),
                    },
                );
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_content_block_delta(&mut self, json: &serde_json::Value) -> Vec<LowLevelEvent> {
        let index = json["index"].as_u64().unwrap_or(0) as usize;
        let delta = &json["delta"];
        match delta["type"].as_str().unwrap_or("") {
            "text_delta" => {
                let text = delta["text"].as_str().unwrap_or("").to_string();
                if let Some(BlockState::Text(buf)) = self.blocks.get_mut(&index) {
                    buf.push_str(&text);
                }
                vec![LowLevelEvent::TextDelta {
                    content: text,
                    done: false,
                }]
            }
            "thinking_delta" => {
                let thinking = delta["thinking"].as_str().unwrap_or("").to_string();
                if let Some(BlockState::Thinking(buf)) = self.blocks.get_mut(&index) {
                    buf.push_str(&thinking);
                }
                vec![LowLevelEvent::ReasoningDelta {
                    content: thinking,
                    done: false,
                }]
            }
            "input_json_delta" => {
                let partial = delta["partial_json"].as_str().unwrap_or("");
                if let Some(BlockState::ToolUse { input_buf, .. }) = self.blocks.get_mut(&index) {
                    input_buf.push_str(partial);
                }
                Vec::new()
            }
            // signature_delta carries a thinking-block signature we have
            // nowhere to keep (agent_types::Part::Reasoning has no field
            // for it); silently dropped.
            _ => Vec::new(),
        }
    }

    fn handle_content_block_stop(&mut self, json: &serde_json::Value) -> Vec<LowLevelEvent> {
        let index = json["index"].as_u64().unwrap_or(0) as usize;
        let Some(block) = self.blocks.remove(&index) else {
            return Vec::new();
        };

        match block {
            BlockState::Text(content) => {
                self.assembled.push(Part::Text {
                    content: content.clone(),
                });
                vec![LowLevelEvent::TextDelta {
                    content,
                    done: true,
                }]
            }
            BlockState::Thinking(content) => {
                self.assembled.push(Part::Reasoning {
                    content: content.clone(),
                });
                vec![LowLevelEvent::ReasoningDelta {
                    content,
                    done: true,
                }]
            }
            BlockState::ToolUse {
                id,
                name,
                input_buf,
            } => {
                let input: serde_json::Value =
                    serde_json::from_str(&input_buf).unwrap_or(serde_json::Value::Null);
                self.assembled.push(Part::ToolCall {
                    call_id: id.clone(),
                    name: name.clone(),
                    kind: "tool_use".to_string(),
                    input: input.clone(),
                    provider_id: None,
                });
                vec![LowLevelEvent::ToolUse {
                    call_id: id,
                    name,
                    kind: "tool_use".to_string(),
                    input,
                    provider_id: None,
                }]
            }
        }
    }

    fn handle_message_delta(&mut self, json: &serde_json::Value) -> Vec<LowLevelEvent> {
        if let Some(reason) = json["delta"]["stop_reason"].as_str() {
            self.stop_reason = Some(reason.to_string());
        }
        if let Some(output) = json["usage"]["output_tokens"].as_u64() {
            self.total_output = output;
        }
        Vec::new()
    }

    /// Assemble the final [`Turn`] once the stream has ended. Returns
    /// `None` only if no `message_delta` carrying a `stop_reason` was ever
    /// observed — the caller treats that as a missing completion.
    fn take_final_turn(&mut self) -> Option<Turn> {
        let stop_reason = self.stop_reason.take()?;
        let finish_reason = match stop_reason.as_str() {
            "end_turn" | "stop_sequence" => FinishReason::EndTurn,
            "tool_use" => FinishReason::ToolUse,
            "max_tokens" => FinishReason::MaxTokens,
            other => FinishReason::Unsupported(other.to_string()),
        };

        Some(Turn {
            role: Role::Assistant,
            parts: std::mem::take(&mut self.assembled),
            finish_reason: Some(finish_reason),
            token_usage: TokenUsage {
                total_input: self.total_input,
                total_output: self.total_output,
                cached_input: self.cached_input,
                reasoning: 0,
            },
        })
    }
}
