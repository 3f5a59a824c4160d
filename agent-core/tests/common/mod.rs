//! A scripted [`ConversationAdapter`] test double: a queue of
//! pre-configured responses played back as the streaming low-level
//! events `agent-core` actually consumes.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use agent_types::{
    AdapterError, ConversationAdapter, ConversationFactory, LowLevelEvent, ModelId, Part,
    ToolContext, ToolDescriptor, Turn,
};
use futures::Stream;
use tokio_util::sync::CancellationToken;

/// One scripted reply to a single `send()` call.
pub enum Script {
    /// Emit these low-level events, in order, then end the stream.
    Events(Vec<LowLevelEvent>),
    /// Emit nothing; the stream instead waits for cancellation, modeling
    /// "the model call is still in flight" for concurrency tests (spec
    /// §8 S3).
    HangUntilCanceled,
}

/// A `ConversationAdapter` driven entirely by a pre-loaded script, one
/// entry consumed per `send()` call.
pub struct ScriptedAdapter {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    log: Vec<Turn>,
}

impl ScriptedAdapter {
    fn new(system_prompt: &str, scripts: Arc<Mutex<VecDeque<Script>>>) -> Self {
        Self {
            scripts,
            log: vec![Turn::system(system_prompt)],
        }
    }
}

impl ConversationAdapter for ScriptedAdapter {
    fn append_user_turn(&mut self, text: String) -> Result<(), AdapterError> {
        self.log.push(Turn::user_text(text));
        Ok(())
    }

    fn append_tools(&mut self, _tools: &[ToolDescriptor]) -> Result<(), AdapterError> {
        Ok(())
    }

    fn append_tool_results(&mut self, results: Vec<Part>) -> Result<(), AdapterError> {
        self.log.push(Turn::tool_results(results));
        Ok(())
    }

    fn send(
        &mut self,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Stream<Item = LowLevelEvent> + Send + '_>> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedAdapter: no more scripted send() calls configured");

        Box::pin(async_stream::stream! {
            match script {
                Script::Events(events) => {
                    for event in events {
                        tokio::task::yield_now().await;
                        yield event;
                    }
                }
                Script::HangUntilCanceled => {
                    cancel.cancelled().await;
                }
            }
        })
    }

    fn turns(&self) -> Vec<Turn> {
        self.log.clone()
    }
}

/// Builds [`ScriptedAdapter`]s fed from a single, shared queue of scripts —
/// the root agent's `send()` calls and every descendant's consume from the
/// same ordered queue, in construction/call order, so a test can lay out
/// the whole scenario up front.
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    scripts: Arc<Mutex<VecDeque<Script>>>,
}

impl ScriptedFactory {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into())),
        }
    }
}

impl ConversationFactory for ScriptedFactory {
    type Adapter = ScriptedAdapter;

    fn create(
        &self,
        _model: &ModelId,
        system_prompt: &str,
        _tools: &[ToolDescriptor],
    ) -> Result<Self::Adapter, AdapterError> {
        Ok(ScriptedAdapter::new(system_prompt, self.scripts.clone()))
    }
}

/// A tool context with no sub-agent capability bound, for tests that
/// exercise a tool directly rather than through the turn loop.
pub fn detached_ctx() -> ToolContext {
    ToolContext::detached(PathBuf::from("/tmp"), "test-session")
}
