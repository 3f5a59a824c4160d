//! The tool contract.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::handle::SubAgentCreator;
use crate::types::{Part, ToolCall, ToolInfo};

/// A boxed, `Send` future — the object-safe escape hatch [`ToolDyn`] needs
/// to return `async fn`-shaped results through a trait object.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Everything a tool invocation receives besides its own arguments.
pub struct ToolContext {
    pub cwd: PathBuf,
    pub session_id: String,
    pub environment: HashMap<String, String>,
    pub cancellation: CancellationToken,
    /// Present only while this context is bound to a running tool
    /// invocation. `None` for a context built outside of one (e.g. in a
    /// unit test that does not exercise sub-agent spawning).
    pub sub_agent: Option<Arc<dyn SubAgentCreator>>,
}

impl ToolContext {
    /// Build a context with no sub-agent capability bound — the shape a
    /// tool sees when invoked outside of a turn loop (e.g. in tests).
    #[must_use]
    pub fn detached(cwd: PathBuf, session_id: impl Into<String>) -> Self {
        Self {
            cwd,
            session_id: session_id.into(),
            environment: HashMap::new(),
            cancellation: CancellationToken::new(),
            sub_agent: None,
        }
    }
}

/// `sub_agent_depth(ctx)`: 0 at the root, +1 per nesting level, -1 if
/// `ctx` is not associated with a tool invocation.
#[must_use]
pub fn sub_agent_depth(ctx: &ToolContext) -> i64 {
    ctx.sub_agent.as_ref().map_or(-1, |c| c.depth() as i64)
}

/// `sub_agent_creator(ctx)`: the capability bound to this invocation.
///
/// # Panics
///
/// Panics if `ctx` is not associated with a tool invocation — this is a
/// programmer error, not a recoverable condition.
#[must_use]
pub fn sub_agent_creator(ctx: &ToolContext) -> Arc<dyn SubAgentCreator> {
    ctx.sub_agent
        .clone()
        .expect("sub_agent_creator() called on a context with no bound tool invocation")
}

/// `agent_tools(ctx)`: a defensive copy of the calling agent's tool list.
#[must_use]
pub fn agent_tools(ctx: &ToolContext) -> Vec<Arc<dyn ToolDyn>> {
    ctx.sub_agent.as_ref().map(|c| c.tools()).unwrap_or_default()
}

/// A strongly-typed tool. Most tools implement this; the registry erases
/// it to [`ToolDyn`] via the blanket impl below.
///
/// Deserialization failures and `call` errors both become
/// `is_error: true` tool-result parts — a tool never aborts the turn
/// loop.
pub trait Tool: Send + Sync {
    const NAME: &'static str;
    type Args: DeserializeOwned;
    type Output: Serialize;
    type Error: std::fmt::Display + Send;

    fn info(&self) -> ToolInfo;

    fn call(
        &self,
        args: Self::Args,
        ctx: &ToolContext,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

/// The type-erased invocation surface the registry and the turn loop
/// actually hold.
pub trait ToolDyn: Send + Sync {
    fn name(&self) -> &str;
    fn info(&self) -> ToolInfo;
    fn run_dyn<'a>(&'a self, ctx: &'a ToolContext, call: &'a ToolCall) -> BoxFuture<'a, Part>;
}

impl<T: Tool + 'static> ToolDyn for T {
    fn name(&self) -> &str {
        T::NAME
    }

    fn info(&self) -> ToolInfo {
        Tool::info(self)
    }

    fn run_dyn<'a>(&'a self, ctx: &'a ToolContext, call: &'a ToolCall) -> BoxFuture<'a, Part> {
        Box::pin(async move {
            let args: T::Args = match serde_json::from_value(call.input.clone()) {
                Ok(args) => args,
                Err(e) => return Part::tool_error(call, format!("invalid arguments: {e}")),
            };
            match self.call(args, ctx).await {
                Ok(output) => {
                    let result =
                        serde_json::to_value(&output).unwrap_or(serde_json::Value::Null);
                    Part::ToolResult {
                        call_id: call.call_id.clone(),
                        name: call.name.clone(),
                        kind: call.kind.clone(),
                        result,
                        is_error: false,
                        source_err: None,
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    let mut part = Part::tool_error(call, message.clone());
                    if let Part::ToolResult { source_err, .. } = &mut part {
                        *source_err = Some(message);
                    }
                    part
                }
            }
        })
    }
}
