//! The agent core: a turn loop that drives a multi-turn conversation
//! between a language model and a set of invocable tools, streaming
//! progress as a totally ordered, attributed sequence of events.
//!
//! This crate owns C5 (turn loop), C6 (stream translator), C7 (sub-agent
//! factory), C8 (event relay), and C9 (root entry / lifecycle). It depends
//! only on the [`agent_types::ConversationAdapter`] / [`agent_types::ConversationFactory`]
//! seam for the streaming model client, and on [`agent_tool::ToolRegistry`]
//! for tool dispatch — the model client and the tools themselves are
//! external collaborators the core never constructs.

mod agent;
mod config;
mod loop_impl;
mod sub_agent;
mod translate;

pub use agent::*;
pub use config::*;
pub use sub_agent::*;
