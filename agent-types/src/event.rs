//! The externally observed event model.
//!
//! Every event carries originator metadata and a kind-appropriate
//! payload. Text/reasoning events carry only completed parts — never
//! intermediate deltas (§4.1, §4.6).

use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::types::{Part, Turn};

/// `{agent_id, depth}` stamped on every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Originator {
    pub agent_id: String,
    pub depth: usize,
}

/// The tagged union of externally observed events.
#[derive(Debug, Clone)]
pub enum EventKind {
    /// A terminal error: a latched client error, missing completion, a
    /// non-recoverable finish reason, or an adapter construction failure.
    /// Cancellation is reported separately, via `Canceled`.
    Error(AgentError),
    /// Terminal: the context was canceled or its deadline expired.
    Canceled(String),
    /// Terminal: the turn loop reached `end_turn` cleanly.
    DoneSuccess,
    /// A completed (never partial) assistant text part.
    AssistantText(Part),
    /// A completed (never partial) assistant reasoning part.
    AssistantReasoning(Part),
    /// A tool call the assistant requested, surfaced at least once per
    /// executed call (§4.5 tie-break rule).
    ToolCall(Part),
    /// The result of running one tool call.
    ToolComplete(Part),
    /// The assistant turn has been fully assembled and appended to the
    /// log.
    AssistantTurnComplete(Turn),
    /// Forwarded verbatim from the model stream.
    Warning(String),
    /// Forwarded verbatim from the model stream.
    Retry(String),
}

/// An event as observed by a consumer: originator metadata plus payload.
#[derive(Debug, Clone)]
pub struct Event {
    pub originator: Originator,
    pub kind: EventKind,
}

impl Event {
    #[must_use]
    pub fn new(originator: Originator, kind: EventKind) -> Self {
        Self { originator, kind }
    }

    /// True for the three terminal event kinds.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::Error(_) | EventKind::Canceled(_) | EventKind::DoneSuccess
        )
    }
}
