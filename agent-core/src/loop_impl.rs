//! The turn loop: alternates model calls and tool
//! execution until the assistant ends its turn, a terminal error occurs,
//! or cancellation is observed.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use agent_types::{AgentError, ConversationFactory, Event, EventKind, Part, ToolCall, ToolContext, Turn};

use crate::agent::AgentInner;
use crate::sub_agent::SubAgentFactoryInner;
use crate::translate::{translate_stream, StepOutcome};

const CANCEL_MESSAGE: &str = "context canceled or deadline expired";

/// Drive one `send_user_message` invocation to completion: repeatedly
/// call the model, run whatever tools it asks for, and feed the results
/// back, until a terminal outcome is reached. Always leaves the agent
/// `Idle` and its local channel closed when it returns.
pub(crate) async fn run_turn_loop<F: ConversationFactory>(
    agent: Arc<AgentInner<F>>,
    cancel: CancellationToken,
    tx: mpsc::Sender<Event>,
) {
    loop {
        let outcome = translate_stream(&agent, cancel.clone(), &tx).await;
        match outcome {
            StepOutcome::Done => {
                agent.emit(&tx, EventKind::DoneSuccess).await;
                break;
            }
            StepOutcome::Terminal(kind) => {
                agent.emit(&tx, kind).await;
                break;
            }
            StepOutcome::ToolUse { calls, announced } => {
                if cancel.is_cancelled() {
                    agent
                        .emit(&tx, EventKind::Canceled(CANCEL_MESSAGE.to_string()))
                        .await;
                    break;
                }

                let Some(results) = run_tools(&agent, &cancel, calls, announced, &tx).await else {
                    agent
                        .emit(&tx, EventKind::Canceled(CANCEL_MESSAGE.to_string()))
                        .await;
                    break;
                };

                let result_turn = Turn::tool_results(results.clone());
                let append_result = {
                    let mut conv = agent.conversation.lock().await;
                    conv.append_tool_results(results)
                };
                if let Err(e) = append_result {
                    agent
                        .emit(&tx, EventKind::Error(AgentError::Adapter(e)))
                        .await;
                    break;
                }
                agent.record_tool_results_turn(result_turn);
                // Still running: loop back around for the next model call.
            }
        }
    }
    agent.reset_to_idle();
}

/// Run every requested tool call sequentially, in the order the assistant
/// produced them. Returns `None` the moment cancellation is
/// observed between calls, leaving later calls unexecuted.
async fn run_tools<F: ConversationFactory>(
    agent: &Arc<AgentInner<F>>,
    cancel: &CancellationToken,
    calls: Vec<ToolCall>,
    announced: HashSet<String>,
    tx: &mpsc::Sender<Event>,
) -> Option<Vec<Part>> {
    let mut results = Vec::with_capacity(calls.len());
    for call in calls {
        if cancel.is_cancelled() {
            return None;
        }

        if !announced.contains(&call.call_id) {
            agent
                .emit(
                    tx,
                    EventKind::ToolCall(Part::ToolCall {
                        call_id: call.call_id.clone(),
                        name: call.name.clone(),
                        kind: call.kind.clone(),
                        input: call.input.clone(),
                        provider_id: call.provider_id.clone(),
                    }),
                )
                .await;
        }

        let result = execute_one(agent, cancel, &call).await;
        agent.emit(tx, EventKind::ToolComplete(result.clone())).await;
        results.push(result);
    }
    Some(results)
}

/// Dispatch a single tool call, binding and revoking the per-invocation
/// sub-agent capability around the call.
async fn execute_one<F: ConversationFactory>(
    agent: &Arc<AgentInner<F>>,
    cancel: &CancellationToken,
    call: &ToolCall,
) -> Part {
    let child_token = cancel.child_token();
    let capability = SubAgentFactoryInner::bind(agent);
    let ctx = ToolContext {
        cwd: agent.config.cwd.clone(),
        session_id: agent.session_id(),
        environment: agent.config.environment.clone(),
        cancellation: child_token.clone(),
        sub_agent: Some(capability.clone() as Arc<dyn agent_types::SubAgentCreator>),
    };

    tracing::debug!(tool = %call.name, call_id = %call.call_id, "tool execution start");
    let result = agent.tools.execute(&call.name, &ctx, call).await;
    tracing::debug!(tool = %call.name, call_id = %call.call_id, "tool execution complete");

    capability.invalidate();
    child_token.cancel();
    result
}
