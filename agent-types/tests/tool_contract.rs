use agent_types::{agent_tools, sub_agent_depth, Tool, ToolCall, ToolContext, ToolDyn, ToolInfo};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct EchoArgs {
    text: String,
}

#[derive(Debug, Serialize)]
struct EchoOutput {
    echoed: String,
}

struct Echo;

impl Tool for Echo {
    const NAME: &'static str = "echo";
    type Args = EchoArgs;
    type Output = EchoOutput;
    type Error = std::convert::Infallible;

    fn info(&self) -> ToolInfo {
        ToolInfo {
            description: "echoes its input".into(),
            input_schema: serde_json::json!({"type": "object"}),
        }
    }

    async fn call(&self, args: Self::Args, _ctx: &ToolContext) -> Result<Self::Output, Self::Error> {
        Ok(EchoOutput { echoed: args.text })
    }
}

struct AlwaysFails;

#[derive(Debug, thiserror::Error)]
#[error("always fails")]
struct AlwaysFailsError;

impl Tool for AlwaysFails {
    const NAME: &'static str = "always_fails";
    type Args = serde_json::Value;
    type Output = ();
    type Error = AlwaysFailsError;

    fn info(&self) -> ToolInfo {
        ToolInfo {
            description: "fails unconditionally".into(),
            input_schema: serde_json::json!({}),
        }
    }

    async fn call(&self, _args: Self::Args, _ctx: &ToolContext) -> Result<(), AlwaysFailsError> {
        Err(AlwaysFailsError)
    }
}

fn call(name: &str, input: serde_json::Value) -> ToolCall {
    ToolCall {
        call_id: "c1".into(),
        name: name.into(),
        kind: "function".into(),
        input,
        provider_id: None,
    }
}

#[tokio::test]
async fn tool_run_never_raises_and_reports_success() {
    let echo = Echo;
    let ctx = ToolContext::detached(PathBuf::from("/tmp"), "sess");
    let part = echo
        .run_dyn(&ctx, &call("echo", serde_json::json!({"text": "hi"})))
        .await;
    let agent_types::Part::ToolResult { is_error, result, .. } = part else {
        panic!("expected ToolResult")
    };
    assert!(!is_error);
    assert_eq!(result, serde_json::json!({"echoed": "hi"}));
}

#[tokio::test]
async fn invalid_arguments_become_an_error_result_not_a_panic() {
    let echo = Echo;
    let ctx = ToolContext::detached(PathBuf::from("/tmp"), "sess");
    let part = echo.run_dyn(&ctx, &call("echo", serde_json::json!(42))).await;
    let agent_types::Part::ToolResult { is_error, .. } = part else {
        panic!("expected ToolResult")
    };
    assert!(is_error);
}

#[tokio::test]
async fn call_error_becomes_an_error_result() {
    let tool = AlwaysFails;
    let ctx = ToolContext::detached(PathBuf::from("/tmp"), "sess");
    let part = tool.run_dyn(&ctx, &call("always_fails", serde_json::json!({}))).await;
    let agent_types::Part::ToolResult {
        is_error,
        source_err,
        ..
    } = part
    else {
        panic!("expected ToolResult")
    };
    assert!(is_error);
    assert_eq!(source_err.as_deref(), Some("always fails"));
}

#[test]
fn detached_context_reports_depth_negative_one() {
    let ctx = ToolContext::detached(PathBuf::from("/tmp"), "sess");
    assert_eq!(sub_agent_depth(&ctx), -1);
    assert!(agent_tools(&ctx).is_empty());
}
