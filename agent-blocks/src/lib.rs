//! Umbrella crate for rust-agent-blocks: composable building blocks for
//! hierarchical, tool-calling LLM agents.
//!
//! Re-exports the data model, tool contract, turn loop, and (with the
//! `anthropic` feature, on by default) a real network-backed model
//! adapter under one namespace, so a consumer depends on a single crate
//! rather than assembling the workspace members by hand.

// === Core blocks (always available) ===

/// Shared data model, event model, and tool contract — the lingua franca
/// every other block is written against.
pub mod types {
    pub use agent_types::*;
}

/// Tool registry: name-keyed dispatch over [`agent_types::ToolDyn`].
pub mod tool {
    pub use agent_tool::*;
}

/// The turn loop: agent construction, sub-agent spawning, and the event
/// relay that drives a conversation to completion.
pub mod core {
    pub use agent_core::*;
}

// === Optional provider blocks ===

/// Anthropic Claude provider (Messages API, SSE streaming).
#[cfg(feature = "anthropic")]
pub mod anthropic {
    pub use agent_provider_anthropic::*;
}

// === Prelude — convenient imports for common usage ===

/// Common imports for building and driving an agent.
pub mod prelude {
    pub use agent_core::{new_agent, Agent, AgentConfig, AgentCreator};
    pub use agent_tool::ToolRegistry;
    pub use agent_types::{
        AgentError, AgentStatus, ConversationAdapter, ConversationFactory, Event, EventKind,
        ModelCatalog, ModelId, Part, Role, StaticModelCatalog, Tool, ToolContext, ToolDyn, Turn,
    };

    #[cfg(feature = "anthropic")]
    pub use agent_provider_anthropic::Anthropic;
}
