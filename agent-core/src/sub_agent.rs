//! The sub-agent factory: the time-bounded capability a tool invocation
//! receives so it can spawn child agents that mirror their parent's
//! conversation factory, model catalog, and session id.
//!
//! Created immediately before `ToolRegistry::execute` and invalidated the
//! moment it returns — using it afterward is a programmer error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use agent_types::{AgentError, ConversationFactory, DynAgent, ModelId, SubAgentCreator, ToolDyn};

use crate::agent::AgentInner;

/// Implements [`SubAgentCreator`] for one tool invocation. Built fresh by
/// the turn loop right before it calls a tool and invalidated right
/// after that call returns — using it afterward is a programmer error
/// and panics loudly rather than silently doing nothing.
pub struct SubAgentFactoryInner<F: ConversationFactory> {
    caller: Weak<AgentInner<F>>,
    depth: usize,
    tools_snapshot: Vec<Arc<dyn ToolDyn>>,
    valid: AtomicBool,
}

impl<F: ConversationFactory> SubAgentFactoryInner<F> {
    /// Bind a fresh capability to `agent`, the agent currently dispatching
    /// a tool call.
    pub(crate) fn bind(agent: &Arc<AgentInner<F>>) -> Arc<Self> {
        Arc::new(Self {
            caller: Arc::downgrade(agent),
            depth: agent.depth,
            tools_snapshot: agent.tools.list(),
            valid: AtomicBool::new(true),
        })
    }

    /// Revoke this capability. Called once, immediately after the tool
    /// invocation it was bound to returns.
    pub(crate) fn invalidate(&self) {
        self.valid.store(false, Ordering::Release);
    }
}

impl<F: ConversationFactory> SubAgentCreator for SubAgentFactoryInner<F> {
    fn depth(&self) -> usize {
        self.depth
    }

    fn tools(&self) -> Vec<Arc<dyn ToolDyn>> {
        self.tools_snapshot.clone()
    }

    fn create(
        &self,
        model: Option<ModelId>,
        system_prompt: String,
        tools: Vec<Arc<dyn ToolDyn>>,
    ) -> Result<Arc<dyn DynAgent>, AgentError> {
        assert!(
            self.valid.load(Ordering::Acquire),
            "SubAgentCreator::create called after its tool invocation had already returned"
        );
        let caller = self.caller.upgrade().expect(
            "calling agent was dropped while its sub-agent creator capability was still valid",
        );
        let model = model.unwrap_or_else(|| caller.model.clone());
        let child = AgentInner::spawn_child(&caller, model, system_prompt, tools)?;
        Ok(child as Arc<dyn DynAgent>)
    }
}
