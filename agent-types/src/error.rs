//! The error taxonomy surfaced from `send_user_message` / `add_user_turn`.
//! Tool failures never appear here — they stay inside
//! `Part::ToolResult { is_error: true, .. }`.

use thiserror::Error;

/// Errors raised by the conversation adapter, the external collaborator
/// behind [`crate::ConversationAdapter`].
#[derive(Debug, Error, Clone)]
#[error("{0}")]
pub struct AdapterError(pub String);

impl AdapterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The agent-level error taxonomy.
#[derive(Debug, Error, Clone)]
pub enum AgentError {
    /// A second `send_user_message` (or an `add_user_turn`) arrived while
    /// the agent was already running a turn loop.
    #[error("agent is already running a turn loop")]
    AlreadyRunning,

    /// The model stream ended without a `completed_success` event, no
    /// client error, and no cancellation (§4.5).
    #[error("model stream ended without a completion")]
    MissingCompletion,

    /// `finish_reason == tool_use` but the assistant turn carried zero
    /// tool-call parts (§4.5, I3).
    #[error("assistant turn declared tool_use but contained no tool calls")]
    NoToolCallsPresent,

    /// The provider reported `finish_reason` of `error` or
    /// `permission_denied`.
    #[error("provider error: {0:?}")]
    ProviderError(crate::types::FinishReason),

    /// The provider reported `finish_reason = max_tokens`.
    #[error("hit the model's max_tokens limit")]
    MaxTokens,

    /// Any finish reason the core does not enumerate.
    #[error("unsupported finish reason: {0}")]
    UnsupportedFinishReason(String),

    /// The conversation adapter (or its factory) could not be
    /// constructed.
    #[error("construction failed: {0}")]
    ConstructionFailed(String),

    /// A failure surfaced by the conversation adapter itself.
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),
}
