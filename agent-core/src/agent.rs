//! `Agent<F>` — the root entry point and lifecycle, holding the state
//! the turn loop, stream translator, sub-agent factory, and
//! event relay all operate on.

use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use agent_tool::ToolRegistry;
use agent_types::{
    context_usage_percent, AgentError, AgentStatus, BoxFuture, ConversationFactory, DynAgent,
    Event, EventKind, ModelCatalog, ModelId, Originator, TokenUsage, ToolDyn, Turn,
};

use crate::config::AgentConfig;

/// 32 lowercase hex characters from a v4 UUID — the "128-bit
/// cryptographically random" id spec §3/§6 calls for.
fn new_hex_id() -> Arc<str> {
    Arc::from(Uuid::new_v4().simple().to_string().as_str())
}

/// Mutable state guarded by the agent's single mutex.
struct AgentState {
    status: AgentStatus,
    turns: Vec<Turn>,
    usage: TokenUsage,
    /// Raw `(total_input, cached_input)` of the most recent assistant
    /// turn — not accumulated.
    context_usage: (u64, u64),
    current_local: Option<mpsc::Sender<Event>>,
}

/// The engine behind the public [`Agent`] handle, always held behind an
/// `Arc`. Children keep a [`Weak`] back-reference to their parent so the
/// family tree never cycles.
pub struct AgentInner<F: ConversationFactory> {
    session_id: Arc<str>,
    agent_id: Arc<str>,
    pub(crate) model: ModelId,
    pub(crate) conversation: tokio::sync::Mutex<F::Adapter>,
    state: Mutex<AgentState>,
    pub(crate) tools: ToolRegistry,
    pub(crate) depth: usize,
    parent: Option<Weak<AgentInner<F>>>,
    pub(crate) factory: Arc<F>,
    catalog: Arc<dyn ModelCatalog>,
    pub(crate) config: AgentConfig,
    self_weak: Weak<AgentInner<F>>,
}

impl<F: ConversationFactory> AgentInner<F> {
    #[allow(clippy::too_many_arguments)]
    fn build(
        factory: Arc<F>,
        model: ModelId,
        system_prompt: String,
        tools: Vec<Arc<dyn ToolDyn>>,
        depth: usize,
        session_id: Arc<str>,
        parent: Option<Weak<AgentInner<F>>>,
        catalog: Arc<dyn ModelCatalog>,
        config: AgentConfig,
    ) -> Result<Arc<Self>, AgentError> {
        let agent_id = if depth == 0 {
            session_id.clone()
        } else {
            new_hex_id()
        };

        let descriptors: Vec<agent_types::ToolDescriptor> = tools
            .iter()
            .map(|t| agent_types::ToolDescriptor {
                name: t.name().to_string(),
                info: t.info(),
            })
            .collect();

        let mut conversation = factory
            .create(&model, &system_prompt, &descriptors)
            .map_err(|e| AgentError::ConstructionFailed(e.to_string()))?;
        conversation
            .append_tools(&descriptors)
            .map_err(|e| AgentError::ConstructionFailed(e.to_string()))?;

        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register_dyn(tool);
        }

        let state = Mutex::new(AgentState {
            status: AgentStatus::Idle,
            turns: vec![Turn::system(system_prompt)],
            usage: TokenUsage::default(),
            context_usage: (0, 0),
            current_local: None,
        });

        tracing::debug!(session_id = %session_id, agent_id = %agent_id, depth, "agent constructed");

        Ok(Arc::new_cyclic(|weak| AgentInner {
            session_id,
            agent_id,
            model,
            conversation: tokio::sync::Mutex::new(conversation),
            state,
            tools: registry,
            depth,
            parent,
            factory,
            catalog,
            config,
            self_weak: weak.clone(),
        }))
    }

    /// Build a child of `caller`, inheriting its session id, conversation
    /// factory, model catalog, and config.
    pub(crate) fn spawn_child(
        caller: &Arc<Self>,
        model: ModelId,
        system_prompt: String,
        tools: Vec<Arc<dyn ToolDyn>>,
    ) -> Result<Arc<Self>, AgentError> {
        Self::build(
            caller.factory.clone(),
            model,
            system_prompt,
            tools,
            caller.depth + 1,
            caller.session_id.clone(),
            Some(Arc::downgrade(caller)),
            caller.catalog.clone(),
            caller.config.clone(),
        )
    }

    pub fn session_id(&self) -> String {
        self.session_id.to_string()
    }

    pub fn agent_id(&self) -> String {
        self.agent_id.to_string()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn status(&self) -> AgentStatus {
        self.state.lock().unwrap().status
    }

    /// A deep copy of the turn log: mutating the returned `Vec` or any
    /// `Turn`/`Part` within it never affects the agent.
    pub fn turns(&self) -> Vec<Turn> {
        self.state.lock().unwrap().turns.clone()
    }

    pub fn token_usage(&self) -> TokenUsage {
        self.state.lock().unwrap().usage
    }

    pub fn context_usage_percent(&self) -> u8 {
        let (total_input, cached_input) = self.state.lock().unwrap().context_usage;
        let capacity = self.catalog.lookup(&self.model).context_window;
        context_usage_percent(total_input, cached_input, capacity)
    }

    /// Append a role=user text turn without sending. Rejects
    /// with `ErrAlreadyRunning` while a turn loop is active; never
    /// suspends.
    pub fn add_user_turn(&self, text: String) -> Result<(), AgentError> {
        let mut state = self.state.lock().unwrap();
        if state.status == AgentStatus::Running {
            return Err(AgentError::AlreadyRunning);
        }
        let mut conversation = self
            .conversation
            .try_lock()
            .map_err(|_| AgentError::AlreadyRunning)?;
        conversation
            .append_user_turn(text.clone())
            .map_err(AgentError::Adapter)?;
        state.turns.push(Turn::user_text(text));
        Ok(())
    }

    /// `send_user_message`. Spawns the turn loop as
    /// a background task and returns its local event channel; the channel
    /// is closed exactly once, after the terminal event.
    pub async fn send_user_message(
        self: &Arc<Self>,
        cancel: CancellationToken,
        text: String,
    ) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let originator = self.originator();

        {
            let mut state = self.state.lock().unwrap();
            if state.status == AgentStatus::Running {
                drop(state);
                let _ = tx
                    .send(Event::new(
                        originator,
                        EventKind::Error(AgentError::AlreadyRunning),
                    ))
                    .await;
                return rx;
            }
            state.status = AgentStatus::Running;
            state.current_local = Some(tx.clone());
        }

        {
            let mut conv = self.conversation.lock().await;
            if let Err(e) = conv.append_user_turn(text.clone()) {
                drop(conv);
                self.reset_to_idle();
                let _ = tx
                    .send(Event::new(originator, EventKind::Error(AgentError::Adapter(e))))
                    .await;
                return rx;
            }
        }
        self.state.lock().unwrap().turns.push(Turn::user_text(text));

        let me = Arc::clone(self);
        tokio::spawn(async move {
            crate::loop_impl::run_turn_loop(me, cancel, tx).await;
        });

        rx
    }

    fn originator(&self) -> Originator {
        Originator {
            agent_id: self.agent_id.to_string(),
            depth: self.depth,
        }
    }

    pub(crate) fn reset_to_idle(&self) {
        let mut state = self.state.lock().unwrap();
        state.status = AgentStatus::Idle;
        state.current_local = None;
    }

    pub(crate) fn record_assistant_turn(&self, turn: Turn) {
        let delta = turn.token_usage;
        {
            let mut state = self.state.lock().unwrap();
            state.context_usage = (turn.token_usage.total_input, turn.token_usage.cached_input);
            state.turns.push(turn);
        }
        self.apply_usage(delta);
    }

    pub(crate) fn record_tool_results_turn(&self, turn: Turn) {
        self.state.lock().unwrap().turns.push(turn);
    }

    /// Usage arithmetic: add `delta` to this agent's cumulative total
    /// and propagate the same delta up to every ancestor, skipping the
    /// walk entirely when the delta is all-zero.
    fn apply_usage(&self, delta: TokenUsage) {
        if delta.is_zero() {
            return;
        }
        {
            let mut state = self.state.lock().unwrap();
            state.usage = state.usage.add(&delta);
        }
        if let Some(parent) = self.parent.as_ref().and_then(Weak::upgrade) {
            parent.apply_usage(delta);
        }
    }

    /// Event relay: stamp `kind` with this agent's originator
    /// metadata and deliver it to the originator's own channel plus every
    /// ancestor's currently-bound local channel, each at most once.
    pub(crate) async fn emit(&self, tx: &mpsc::Sender<Event>, kind: EventKind) {
        let event = Event::new(self.originator(), kind);
        self.relay(tx, event).await;
    }

    async fn relay(&self, originator_tx: &mpsc::Sender<Event>, event: Event) {
        let mut delivered: Vec<mpsc::Sender<Event>> = Vec::new();
        Self::send_once(&mut delivered, originator_tx, &event).await;

        let mut cursor = self.parent.clone();
        while let Some(weak) = cursor {
            let Some(ancestor) = weak.upgrade() else {
                break;
            };
            let maybe_tx = ancestor.state.lock().unwrap().current_local.clone();
            if let Some(tx) = maybe_tx {
                Self::send_once(&mut delivered, &tx, &event).await;
            }
            cursor = ancestor.parent.clone();
        }
    }

    async fn send_once(
        delivered: &mut Vec<mpsc::Sender<Event>>,
        tx: &mpsc::Sender<Event>,
        event: &Event,
    ) {
        if delivered.iter().any(|d| d.same_channel(tx)) {
            return;
        }
        delivered.push(tx.clone());
        let _ = tx.send(event.clone()).await;
    }
}

impl<F: ConversationFactory> DynAgent for AgentInner<F> {
    fn session_id(&self) -> String {
        AgentInner::session_id(self)
    }

    fn status(&self) -> AgentStatus {
        AgentInner::status(self)
    }

    fn token_usage(&self) -> TokenUsage {
        AgentInner::token_usage(self)
    }

    fn context_usage_percent(&self) -> u8 {
        AgentInner::context_usage_percent(self)
    }

    fn turns(&self) -> Vec<Turn> {
        AgentInner::turns(self)
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn add_user_turn(&self, text: String) -> Result<(), AgentError> {
        AgentInner::add_user_turn(self, text)
    }

    fn send_user_message(
        &self,
        cancel: CancellationToken,
        text: String,
    ) -> BoxFuture<'_, mpsc::Receiver<Event>> {
        let strong = self
            .self_weak
            .upgrade()
            .expect("agent dropped while a handle to it was still in use");
        Box::pin(async move { AgentInner::send_user_message(&strong, cancel, text).await })
    }
}

/// A cheap, cloneable handle to an [`AgentInner`] — the public shape of
/// spec §3's "Agent" (a thin `Arc<AgentInner<F>>` wrapper).
pub struct Agent<F: ConversationFactory> {
    inner: Arc<AgentInner<F>>,
}

impl<F: ConversationFactory> Clone for Agent<F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<F: ConversationFactory> Agent<F> {
    pub fn session_id(&self) -> String {
        self.inner.session_id()
    }

    pub fn agent_id(&self) -> String {
        self.inner.agent_id()
    }

    pub fn depth(&self) -> usize {
        self.inner.depth()
    }

    pub fn status(&self) -> AgentStatus {
        self.inner.status()
    }

    pub fn turns(&self) -> Vec<Turn> {
        self.inner.turns()
    }

    pub fn token_usage(&self) -> TokenUsage {
        self.inner.token_usage()
    }

    pub fn context_usage_percent(&self) -> u8 {
        self.inner.context_usage_percent()
    }

    pub fn add_user_turn(&self, text: impl Into<String>) -> Result<(), AgentError> {
        self.inner.add_user_turn(text.into())
    }

    pub async fn send_user_message(
        &self,
        cancel: CancellationToken,
        text: impl Into<String>,
    ) -> mpsc::Receiver<Event> {
        AgentInner::send_user_message(&self.inner, cancel, text.into()).await
    }

    /// Type-erase this handle to the object-safe [`DynAgent`] surface a
    /// tool invocation sees via its [`SubAgentCreator`].
    pub fn as_dyn(&self) -> Arc<dyn DynAgent> {
        self.inner.clone() as Arc<dyn DynAgent>
    }
}

/// `new_agent(model, system_prompt, tools)` — construct a root
/// agent directly, generating a fresh session id.
pub fn new_agent<F: ConversationFactory>(
    factory: F,
    model: ModelId,
    system_prompt: impl Into<String>,
    tools: Vec<Arc<dyn ToolDyn>>,
    catalog: Arc<dyn ModelCatalog>,
    config: AgentConfig,
) -> Result<Agent<F>, AgentError> {
    let session_id = new_hex_id();
    let inner = AgentInner::build(
        Arc::new(factory),
        model,
        system_prompt.into(),
        tools,
        0,
        session_id,
        None,
        catalog,
        config,
    )?;
    Ok(Agent { inner })
}

/// A root-style creator capability: holds a
/// conversation factory and default model so callers can construct many
/// root agents (e.g. one per session) without repeating that wiring.
pub struct AgentCreator<F: ConversationFactory> {
    factory: Arc<F>,
    default_model: ModelId,
    catalog: Arc<dyn ModelCatalog>,
    config: AgentConfig,
}

impl<F: ConversationFactory> AgentCreator<F> {
    pub fn new(
        &self,
        model: ModelId,
        system_prompt: impl Into<String>,
        tools: Vec<Arc<dyn ToolDyn>>,
    ) -> Result<Agent<F>, AgentError> {
        let session_id = new_hex_id();
        let inner = AgentInner::build(
            self.factory.clone(),
            model,
            system_prompt.into(),
            tools,
            0,
            session_id,
            None,
            self.catalog.clone(),
            self.config.clone(),
        )?;
        Ok(Agent { inner })
    }

    pub fn new_with_default_model(
        &self,
        system_prompt: impl Into<String>,
        tools: Vec<Arc<dyn ToolDyn>>,
    ) -> Result<Agent<F>, AgentError> {
        self.new(self.default_model.clone(), system_prompt, tools)
    }
}

/// `new_agent_creator()`.
pub fn new_agent_creator<F: ConversationFactory>(
    factory: F,
    default_model: ModelId,
    catalog: Arc<dyn ModelCatalog>,
    config: AgentConfig,
) -> AgentCreator<F> {
    AgentCreator {
        factory: Arc::new(factory),
        default_model,
        catalog,
        config,
    }
}

#[allow(unused)]
fn _assert_send_sync<F: ConversationFactory>()
where
    AgentInner<F>: Send + Sync,
{
}
