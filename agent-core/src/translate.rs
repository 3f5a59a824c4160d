//! The stream translator: drains one `ConversationAdapter::send`
//! stream and turns it into zero or more externally observed events plus a
//! single step outcome the turn loop acts on.
//!
//! Intermediate text/reasoning deltas are dropped; only `done = true`
//! deltas become events. A client error is latched, not emitted
//! immediately, so the stream keeps draining; the latched error (if any)
//! wins over a captured completion once the stream ends.

use std::collections::HashSet;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use agent_types::{
    AdapterError, AgentError, ConversationFactory, Event, EventKind, FinishReason, LowLevelEvent,
    Part, ToolCall, Turn,
};

use crate::agent::AgentInner;

/// What the turn loop should do next, decided once a model-call stream has
/// fully drained.
pub(crate) enum StepOutcome {
    /// `finish_reason == end_turn`: the turn loop is done.
    Done,
    /// `finish_reason == tool_use`: run these calls next. `announced`
    /// holds the `call_id`s already surfaced as a `tool_call` event while
    /// streaming, so the turn loop does not double-announce them (spec
    /// §4.5's tie-break: "each call is surfaced ... at least once").
    ToolUse {
        calls: Vec<ToolCall>,
        announced: HashSet<String>,
    },
    /// Nothing more to do; `kind` is the terminal event to emit.
    Terminal(EventKind),
}

/// Run one model call to completion and translate its stream.
pub(crate) async fn translate_stream<F: ConversationFactory>(
    agent: &Arc<AgentInner<F>>,
    cancel: CancellationToken,
    tx: &mpsc::Sender<Event>,
) -> StepOutcome {
    let mut latched_error: Option<AdapterError> = None;
    let mut completed: Option<Turn> = None;
    let mut announced: HashSet<String> = HashSet::new();

    {
        let mut conv = agent.conversation.lock().await;
        let mut stream = conv.send(cancel.clone());
        while let Some(event) = stream.next().await {
            match event {
                LowLevelEvent::TextDelta { content, done } => {
                    if done {
                        agent
                            .emit(tx, EventKind::AssistantText(Part::Text { content }))
                            .await;
                    }
                }
                LowLevelEvent::ReasoningDelta { content, done } => {
                    if done {
                        agent
                            .emit(tx, EventKind::AssistantReasoning(Part::Reasoning { content }))
                            .await;
                    }
                }
                LowLevelEvent::ToolUse {
                    call_id,
                    name,
                    kind,
                    input,
                    provider_id,
                } => {
                    announced.insert(call_id.clone());
                    agent
                        .emit(
                            tx,
                            EventKind::ToolCall(Part::ToolCall {
                                call_id,
                                name,
                                kind,
                                input,
                                provider_id,
                            }),
                        )
                        .await;
                }
                LowLevelEvent::Warning(message) => {
                    agent.emit(tx, EventKind::Warning(message)).await;
                }
                LowLevelEvent::Retry(message) => {
                    agent.emit(tx, EventKind::Retry(message)).await;
                }
                LowLevelEvent::Error(err) => {
                    latched_error = Some(err);
                }
                LowLevelEvent::CompletedSuccess(turn) => {
                    completed = Some(turn);
                }
            }
        }
    }

    if let Some(err) = latched_error {
        return StepOutcome::Terminal(EventKind::Error(AgentError::Adapter(err)));
    }
    if cancel.is_cancelled() {
        return StepOutcome::Terminal(EventKind::Canceled(
            "context canceled or deadline expired".to_string(),
        ));
    }
    let Some(turn) = completed else {
        return StepOutcome::Terminal(EventKind::Error(AgentError::MissingCompletion));
    };

    let finish_reason = turn.finish_reason.clone();
    agent.record_assistant_turn(turn.clone());
    agent
        .emit(tx, EventKind::AssistantTurnComplete(turn.clone()))
        .await;

    match finish_reason {
        Some(FinishReason::EndTurn) => StepOutcome::Done,
        Some(FinishReason::ToolUse) => {
            let calls = turn.tool_calls();
            if calls.is_empty() {
                StepOutcome::Terminal(EventKind::Error(AgentError::NoToolCallsPresent))
            } else {
                StepOutcome::ToolUse { calls, announced }
            }
        }
        Some(FinishReason::Canceled) => {
            StepOutcome::Terminal(EventKind::Canceled("canceled by the model provider".to_string()))
        }
        Some(reason @ (FinishReason::Error | FinishReason::PermissionDenied)) => {
            StepOutcome::Terminal(EventKind::Error(AgentError::ProviderError(reason)))
        }
        Some(FinishReason::MaxTokens) => {
            StepOutcome::Terminal(EventKind::Error(AgentError::MaxTokens))
        }
        Some(FinishReason::Unsupported(name)) => {
            StepOutcome::Terminal(EventKind::Error(AgentError::UnsupportedFinishReason(name)))
        }
        None => StepOutcome::Terminal(EventKind::Error(AgentError::MissingCompletion)),
    }
}
