//! The Anthropic Messages API [`ConversationFactory`]/[`ConversationAdapter`]
//! pair — the one real, network-backed collaborator behind `agent-core`'s
//! streaming seam.
//!
//! One [`AnthropicAdapter`] is built per agent and accumulates its own turn
//! log across calls, so the factory itself stays stateless and clonable.

use std::pin::Pin;
use std::sync::Arc;

use agent_types::{
    AdapterError, ConversationAdapter, ConversationFactory, LowLevelEvent, ModelId, Part, Turn,
};
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::{map_http_status, map_reqwest_error};
use crate::mapping::to_api_request;
use crate::streaming::parse_byte_stream;

/// Default model used when the caller (and the agent it is building for)
/// specify none.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default Anthropic API base URL.
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Builder and [`ConversationFactory`] for the Anthropic Messages API.
///
/// # Example
///
/// ```no_run
/// use agent_provider_anthropic::Anthropic;
///
/// let factory = Anthropic::new("sk-ant-...")
///     .model("claude-opus-4-5")
///     .base_url("https://api.anthropic.com");
/// ```
#[derive(Clone)]
pub struct Anthropic {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl Anthropic {
    /// Create a new factory with the given API key and sensible defaults.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Override the default model, used when an agent is built with no
    /// model override of its own.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL. Useful for testing against a local
    /// mock server.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

impl ConversationFactory for Anthropic {
    type Adapter = AnthropicAdapter;

    fn create(
        &self,
        model: &ModelId,
        system_prompt: &str,
        tools: &[agent_types::ToolDescriptor],
    ) -> Result<Self::Adapter, AdapterError> {
        let model = if model.as_str().is_empty() {
            self.model.clone()
        } else {
            model.as_str().to_string()
        };
        Ok(AnthropicAdapter {
            api_key: self.api_key.clone(),
            model,
            base_url: self.base_url.clone(),
            http: self.http.clone(),
            system_prompt: system_prompt.to_string(),
            tools: tools.to_vec(),
            turns: Vec::new(),
        })
    }
}

/// One conversation's worth of state against the Anthropic Messages API.
///
/// The system prompt is kept out of `turns` — Anthropic's wire format
/// takes it as a top-level `"system"` field, never as a message — so
/// `turns` holds only the user/assistant exchange.
pub struct AnthropicAdapter {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
    system_prompt: String,
    tools: Vec<agent_types::ToolDescriptor>,
    turns: Vec<Turn>,
}

impl AnthropicAdapter {
    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

impl ConversationAdapter for AnthropicAdapter {
    fn append_user_turn(&mut self, text: String) -> Result<(), AdapterError> {
        self.turns.push(Turn::user_text(text));
        Ok(())
    }

    fn append_tools(&mut self, tools: &[agent_types::ToolDescriptor]) -> Result<(), AdapterError> {
        self.tools = tools.to_vec();
        Ok(())
    }

    fn append_tool_results(&mut self, results: Vec<Part>) -> Result<(), AdapterError> {
        self.turns.push(Turn::tool_results(results));
        Ok(())
    }

    fn send(
        &mut self,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Stream<Item = LowLevelEvent> + Send + '_>> {
        let url = self.messages_url();
        let api_key = self.api_key.clone();
        let mut body = to_api_request(&self.model, &self.system_prompt, &self.turns, &self.tools);
        body["stream"] = serde_json::Value::Bool(true);
        let http = self.http.clone();

        Box::pin(async_stream::stream! {
            tracing::debug!(url = %url, model = %body["model"], "sending streaming message request");

            let send_fut = http
                .post(&url)
                .header("x-api-key", &api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&body)
                .send();

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                result = send_fut => match result {
                    Ok(r) => r,
                    Err(e) => {
                        yield LowLevelEvent::Error(map_reqwest_error(e));
                        return;
                    }
                },
            };

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                yield LowLevelEvent::Error(map_http_status(status, &text));
                return;
            }

            let mut inner = std::pin::pin!(parse_byte_stream(response.bytes_stream()));
            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    next = inner.next() => next,
                };
                match next {
                    Some(event) => yield event,
                    None => break,
                }
            }
        })
    }

    fn turns(&self) -> Vec<Turn> {
        self.turns.clone()
    }
}

/// Thread-shareable handle, for callers that build one [`Anthropic`]
/// factory and hand `Arc` clones to several independently-spawned agents.
pub type SharedAnthropic = Arc<Anthropic>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_set() {
        let client = Anthropic::new("test-key");
        assert_eq!(client.model, DEFAULT_MODEL);
    }

    #[test]
    fn default_base_url_is_set() {
        let client = Anthropic::new("test-key");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn builder_overrides_model() {
        let client = Anthropic::new("test-key").model("claude-opus-4-5");
        assert_eq!(client.model, "claude-opus-4-5");
    }

    #[test]
    fn builder_overrides_base_url() {
        let client = Anthropic::new("test-key").base_url("http://localhost:9999");
        assert_eq!(client.base_url, "http://localhost:9999");
    }

    #[test]
    fn messages_url_includes_path() {
        let client = Anthropic::new("test-key").base_url("http://localhost:9999");
        assert_eq!(client.messages_url(), "http://localhost:9999/v1/messages");
    }

    #[test]
    fn create_falls_back_to_default_model_when_model_id_is_empty() {
        let factory = Anthropic::new("test-key").model("claude-opus-4-5");
        let adapter = factory
            .create(&ModelId::from(""), "be nice", &[])
            .unwrap();
        assert_eq!(adapter.model, "claude-opus-4-5");
    }

    #[test]
    fn create_honors_an_explicit_model_id() {
        let factory = Anthropic::new("test-key").model("claude-opus-4-5");
        let adapter = factory
            .create(&ModelId::from("claude-haiku-4-5"), "", &[])
            .unwrap();
        assert_eq!(adapter.model, "claude-haiku-4-5");
    }

    #[test]
    fn create_seeds_no_turns_the_system_turn_stays_agent_side() {
        let factory = Anthropic::new("test-key");
        let adapter = factory.create(&ModelId::from("x"), "be nice", &[]).unwrap();
        assert!(adapter.turns().is_empty());
    }
}
