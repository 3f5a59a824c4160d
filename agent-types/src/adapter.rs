//! The conversation adapter seam — the external
//! collaborator the turn loop is written against. An integrator (e.g.
//! `agent-provider-anthropic`) implements [`ConversationAdapter`] /
//! [`ConversationFactory`] over a real streaming model client; tests
//! implement them over a scripted double.

use std::pin::Pin;

use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::AdapterError;
use crate::types::{ModelId, Part, ToolDescriptor, Turn};

/// A low-level event as produced by the streaming model client.
#[derive(Debug, Clone)]
pub enum LowLevelEvent {
    /// Incremental text. `done = false` deltas are dropped by the
    /// translator; only the `done = true` delta carries the completed
    /// text.
    TextDelta { content: String, done: bool },
    /// Incremental reasoning/thinking text, same `done` semantics.
    ReasoningDelta { content: String, done: bool },
    /// The assistant has requested a tool call.
    ToolUse {
        call_id: String,
        name: String,
        kind: String,
        input: serde_json::Value,
        provider_id: Option<String>,
    },
    /// A non-terminal provider warning, forwarded verbatim.
    Warning(String),
    /// A non-terminal provider retry notice, forwarded verbatim.
    Retry(String),
    /// A terminal client error. The stream may still emit further events
    /// after this (the translator keeps draining) but the error is
    /// latched and surfaces once the stream ends.
    Error(AdapterError),
    /// The assistant turn completed successfully. Captured, not
    /// immediately emitted as an event — surfaced only after the stream
    /// fully drains.
    CompletedSuccess(Turn),
}

/// Abstract view of the ordered turn log consumed by the model client.
/// The core depends only on this trait; it never constructs or
/// serializes provider-specific wire messages itself.
pub trait ConversationAdapter: Send + Sync + 'static {
    /// Append a role=user text turn.
    fn append_user_turn(&mut self, text: String) -> Result<(), AdapterError>;

    /// Register callable tools with the underlying client.
    fn append_tools(&mut self, tools: &[ToolDescriptor]) -> Result<(), AdapterError>;

    /// Append a role=user turn of tool-result parts, in call order.
    fn append_tool_results(&mut self, results: Vec<Part>) -> Result<(), AdapterError>;

    /// Produce a single finite stream of low-level events for one model
    /// call. The stream ends because the turn completed, because `cancel`
    /// fired, or because a client error occurred.
    fn send(
        &mut self,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Stream<Item = LowLevelEvent> + Send + '_>>;

    /// A strictly informational snapshot of the adapter's own turn view.
    fn turns(&self) -> Vec<Turn>;
}

/// Builds a [`ConversationAdapter`] for a given model/system prompt/tool
/// set. `agent-core`'s root entry and sub-agent factory both
/// go through this so children reuse the same adapter implementation as
/// their parent.
pub trait ConversationFactory: Send + Sync + 'static {
    type Adapter: ConversationAdapter;

    fn create(
        &self,
        model: &ModelId,
        system_prompt: &str,
        tools: &[ToolDescriptor],
    ) -> Result<Self::Adapter, AdapterError>;
}
