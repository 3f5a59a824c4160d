//! The object-safe seams `agent-core` implements so a tool (which does
//! not, and must not, depend on `agent-core`) can report its own status
//! and spawn sub-agents. Keeping these traits here — rather than in
//! `agent-core` — breaks what would otherwise be a circular dependency:
//! `agent-tool`'s `ToolContext` needs to carry a capability whose
//! concrete type lives in the crate that depends on `agent-tool`.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::AgentError;
use crate::event::Event;
use crate::tool::{BoxFuture, ToolDyn};
use crate::types::{ModelId, TokenUsage, Turn};

/// `status()`'s two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    Idle,
    Running,
}

/// The type-erased agent handle, object-safe
/// so it can be returned by [`SubAgentCreator::create`] without exposing
/// the concrete `ConversationAdapter` type parameter to tool authors.
pub trait DynAgent: Send + Sync {
    fn session_id(&self) -> String;
    fn status(&self) -> AgentStatus;
    fn token_usage(&self) -> TokenUsage;
    fn context_usage_percent(&self) -> u8;
    fn turns(&self) -> Vec<Turn>;
    fn depth(&self) -> usize;
    fn add_user_turn(&self, text: String) -> Result<(), AgentError>;
    fn send_user_message(
        &self,
        cancel: CancellationToken,
        text: String,
    ) -> BoxFuture<'_, mpsc::Receiver<Event>>;
}

/// The time-bounded capability conferred on a tool invocation.
///
/// Valid only for the lifetime of the tool invocation that received it;
/// using it afterward is a programmer error and must fail loudly.
pub trait SubAgentCreator: Send + Sync {
    /// Depth of the *calling* agent (0 at the root).
    fn depth(&self) -> usize;

    /// A defensive copy of the calling agent's tool list.
    fn tools(&self) -> Vec<Arc<dyn ToolDyn>>;

    /// Construct a child agent.
    ///
    /// `model = None` means "use the calling agent's model" (§4.7's
    /// `new_with_default_model`).
    ///
    /// # Panics
    ///
    /// Panics if called after the tool invocation that received this
    /// capability has already returned.
    fn create(
        &self,
        model: Option<ModelId>,
        system_prompt: String,
        tools: Vec<Arc<dyn ToolDyn>>,
    ) -> Result<Arc<dyn DynAgent>, AgentError>;
}
