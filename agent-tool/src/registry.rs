//! Tool registry: register, look up, describe, and execute tools.

use std::collections::HashMap;
use std::sync::Arc;

use agent_types::{Part, Tool, ToolContext, ToolDescriptor, ToolDyn};

/// A name-keyed set of [`ToolDyn`] trait objects, built once when an agent
/// is constructed and consulted on every tool call the turn loop makes.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolDyn>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a strongly-typed tool (auto-erased to [`ToolDyn`]).
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = T::NAME.to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    /// Register a pre-erased tool, e.g. one handed back from
    /// [`agent_types::agent_tools`].
    pub fn register_dyn(&mut self, tool: Arc<dyn ToolDyn>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolDyn>> {
        self.tools.get(name).cloned()
    }

    /// A defensive copy of every registered tool, in no particular order —
    /// the snapshot `SubAgentCreator::tools()` hands a spawned child.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<dyn ToolDyn>> {
        self.tools.values().cloned().collect()
    }

    /// `{name, info}` for every registered tool, in the shape
    /// `ConversationAdapter::append_tools` expects.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .values()
            .map(|t| ToolDescriptor {
                name: t.name().to_string(),
                info: t.info(),
            })
            .collect()
    }

    /// Run `name` with `call`, or synthesize the error result spec
    /// §4.5/§7 require when no tool is registered under that name. Never
    /// returns an `Err` — a missing or failing tool ends in an
    /// `is_error: true` `Part::ToolResult`, not an aborted turn loop.
    pub async fn execute(
        &self,
        name: &str,
        ctx: &ToolContext,
        call: &agent_types::ToolCall,
    ) -> Part {
        match self.get(name) {
            Some(tool) => tool.run_dyn(ctx, call).await,
            None => Part::tool_error(call, format!("no tool registered under name {name:?}")),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_types::ToolInfo;
    use std::path::PathBuf;

    struct Echo;

    #[derive(serde::Deserialize)]
    struct EchoArgs {
        text: String,
    }

    impl Tool for Echo {
        const NAME: &'static str = "echo";
        type Args = EchoArgs;
        type Output = String;
        type Error = std::convert::Infallible;

        fn info(&self) -> ToolInfo {
            ToolInfo {
                description: "echoes its input back".to_string(),
                input_schema: serde_json::json!({"type": "object"}),
            }
        }

        async fn call(&self, args: Self::Args, _ctx: &ToolContext) -> Result<String, Self::Error> {
            Ok(args.text)
        }
    }

    fn call(name: &str, input: serde_json::Value) -> agent_types::ToolCall {
        agent_types::ToolCall {
            call_id: "call-1".to_string(),
            name: name.to_string(),
            kind: name.to_string(),
            input,
            provider_id: None,
        }
    }

    #[tokio::test]
    async fn execute_dispatches_to_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo);
        let ctx = ToolContext::detached(PathBuf::from("."), "session");

        let result = registry
            .execute("echo", &ctx, &call("echo", serde_json::json!({"text": "hi"})))
            .await;

        match result {
            Part::ToolResult { is_error, result, .. } => {
                assert!(!is_error);
                assert_eq!(result, serde_json::json!("hi"));
            }
            other => panic!("expected a ToolResult part, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn execute_unknown_tool_synthesizes_error_result() {
        let registry = ToolRegistry::new();
        let ctx = ToolContext::detached(PathBuf::from("."), "session");

        let result = registry
            .execute("nonexistent", &ctx, &call("nonexistent", serde_json::json!({})))
            .await;

        match result {
            Part::ToolResult { is_error, .. } => assert!(is_error),
            other => panic!("expected a ToolResult part, got {other:?}"),
        }
    }

    #[test]
    fn descriptors_reflect_registered_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo);
        let descriptors = registry.descriptors();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name, "echo");
    }
}
