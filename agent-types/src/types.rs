//! The conversation data model: roles, content parts, turns, finish reasons,
//! and token usage.

use serde::{Deserialize, Serialize};

/// A newtype around the opaque string that names a configured model.
///
/// Looking an unknown identifier up in a [`crate::ModelCatalog`] yields
/// zero-valued metadata rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelId(pub String);

impl ModelId {
    /// Build a model id from anything that converts to `String`.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single content part within a turn.
///
/// `kind` stands in for what the wire protocol calls `type` (renamed to
/// dodge the Rust keyword); it defaults to the tool's own name when a
/// tool omits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "part", rename_all = "snake_case")]
pub enum Part {
    /// Completed assistant (or user) text.
    Text { content: String },
    /// Completed assistant reasoning/thinking text.
    Reasoning { content: String },
    /// A tool invocation requested by the assistant.
    ToolCall {
        call_id: String,
        name: String,
        kind: String,
        input: serde_json::Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        provider_id: Option<String>,
    },
    /// The result of running a tool invocation.
    ToolResult {
        call_id: String,
        name: String,
        kind: String,
        result: serde_json::Value,
        is_error: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        source_err: Option<String>,
    },
}

impl Part {
    /// The `call_id` of a tool-call or tool-result part, if this is one.
    pub fn call_id(&self) -> Option<&str> {
        match self {
            Part::ToolCall { call_id, .. } | Part::ToolResult { call_id, .. } => Some(call_id),
            _ => None,
        }
    }

    /// True for [`Part::ToolCall`].
    pub fn is_tool_call(&self) -> bool {
        matches!(self, Part::ToolCall { .. })
    }

    /// Build the synthetic error tool-result used when a tool name has no
    /// registry entry, or when a tool's `run` cannot be reached at all.
    pub fn tool_error(call: &ToolCall, message: impl Into<String>) -> Part {
        Part::ToolResult {
            call_id: call.call_id.clone(),
            name: call.name.clone(),
            kind: call.kind.clone(),
            result: serde_json::Value::String(message.into()),
            is_error: true,
            source_err: None,
        }
    }
}

/// A tool invocation, as produced by the assistant and handed to `Tool::run`.
///
/// Mirrors the payload of [`Part::ToolCall`]; kept as its own type so tool
/// authors don't have to destructure the `Part` enum on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub name: String,
    pub kind: String,
    pub input: serde_json::Value,
    pub provider_id: Option<String>,
}

impl From<&Part> for Option<ToolCall> {
    fn from(part: &Part) -> Self {
        match part {
            Part::ToolCall {
                call_id,
                name,
                kind,
                input,
                provider_id,
            } => Some(ToolCall {
                call_id: call_id.clone(),
                name: name.clone(),
                kind: kind.clone(),
                input: input.clone(),
                provider_id: provider_id.clone(),
            }),
            _ => None,
        }
    }
}

/// The provider-reported terminal status of an assistant turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FinishReason {
    EndTurn,
    ToolUse,
    Canceled,
    Error,
    PermissionDenied,
    MaxTokens,
    /// Any value the core does not enumerate. Carries the raw provider
    /// string for diagnostics; always terminal-error, never specially
    /// recovered.
    Unsupported(String),
}

/// Token accounting for a single turn or for an agent's cumulative
/// total. All fields are non-negative after clamping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub total_input: u64,
    pub total_output: u64,
    pub cached_input: u64,
    pub reasoning: u64,
}

/// One entry in an agent's turn log. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
    /// Only ever `Some` for assistant turns.
    pub finish_reason: Option<FinishReason>,
    pub token_usage: TokenUsage,
}

impl Turn {
    /// Build the system turn that seeds every agent's log.
    pub fn system(prompt: impl Into<String>) -> Self {
        Turn {
            role: Role::System,
            parts: vec![Part::Text {
                content: prompt.into(),
            }],
            finish_reason: None,
            token_usage: TokenUsage::default(),
        }
    }

    /// Build a role=user text turn, as appended by `add_user_turn` /
    /// `send_user_message`.
    pub fn user_text(text: impl Into<String>) -> Self {
        Turn {
            role: Role::User,
            parts: vec![Part::Text {
                content: text.into(),
            }],
            finish_reason: None,
            token_usage: TokenUsage::default(),
        }
    }

    /// Build the role=user tool-results turn appended after running
    /// tools: one `ToolResult` part per executed call, in call order.
    pub fn tool_results(results: Vec<Part>) -> Self {
        Turn {
            role: Role::User,
            parts: results,
            finish_reason: None,
            token_usage: TokenUsage::default(),
        }
    }

    /// All tool-call parts in this turn, in order.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.parts
            .iter()
            .filter_map(|p| Option::<ToolCall>::from(p))
            .collect()
    }
}

/// Metadata about a tool, returned by `Tool::info` / exposed on the wire
/// via `ConversationAdapter::append_tools`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// `{name, info}` pair handed to the conversation adapter so it can
/// describe available tools to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub info: ToolInfo,
}
