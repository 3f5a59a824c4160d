//! Anthropic Messages API conversation adapter for `agent-core`.
//!
//! Implements [`agent_types::ConversationFactory`] /
//! [`agent_types::ConversationAdapter`] against the
//! [Anthropic Messages API](https://docs.anthropic.com/en/api/messages),
//! including its streaming protocol. Any agent built with an
//! [`Anthropic`] factory talks to a real model over HTTP; swap it for a
//! test double (as `agent-core`'s own integration tests do) to drive the
//! turn loop without a network call.
//!
//! # Usage
//!
//! ```no_run
//! use agent_provider_anthropic::Anthropic;
//!
//! let factory = Anthropic::new("your-api-key").model("claude-opus-4-5");
//! ```

mod client;
mod error;
mod mapping;
mod streaming;

pub use client::{Anthropic, AnthropicAdapter, SharedAnthropic, DEFAULT_MODEL};
