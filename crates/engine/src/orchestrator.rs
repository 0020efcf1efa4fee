//! The streaming orchestrator.
//!
//! One `chat()` call is one turn: resolve the session, persist the user
//! message and assistant placeholder, then stream the model's answer while
//! flushing cumulative snapshots to the ledger. Fatal input errors surface
//! before any stream exists; everything after the `meta` event travels
//! through the returned stream.
//!
//! Event contract: exactly one `meta` first, then ordered `delta`s, then
//! either one `done` or one propagated error. Never both, never two `meta`s.

use rolechat_config::{AppConfig, RetryConfig};
use rolechat_core::error::{Error, Result};
use rolechat_core::event::ChatEvent;
use rolechat_core::message::{ChatMessage, MessageStore};
use rolechat_core::provider::{ChatProvider, ChatRequest};
use rolechat_core::role::RoleDirectory;
use rolechat_core::session::SessionStore;
use rolechat_knowledge::ContextBuilder;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::decode::decode_chunk;
use crate::ledger::MessageLedger;
use crate::locks::SessionLocks;
use crate::resolver::SessionResolver;

/// The event stream handed to callers. Lazy, forward-only, single-consumer;
/// dropping it cancels the turn cooperatively.
pub type ChatStream = ReceiverStream<Result<ChatEvent>>;

/// Parameters for one chat turn.
#[derive(Debug, Clone)]
pub struct ChatTurnRequest {
    /// Role to speak with; looked up by exact name.
    pub role_name: String,

    /// The user's message for this turn.
    pub user_message: String,

    /// Explicit session to use, skipping title-based resolution.
    pub session_id: Option<String>,

    /// Force a fresh session even when one already matches the role.
    pub create_new_session: bool,

    /// Topic sub-grouping, carried through opaquely.
    pub topic_id: Option<String>,

    /// Model override; falls back to the configured default.
    pub model: Option<String>,

    /// Provider name override; falls back to the configured default.
    pub provider: Option<String>,

    /// Caller identity forwarded to the provider.
    pub user: Option<String>,
}

impl ChatTurnRequest {
    pub fn new(role_name: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
            user_message: user_message.into(),
            session_id: None,
            create_new_session: false,
            topic_id: None,
            model: None,
            provider: None,
            user: None,
        }
    }
}

/// The orchestration engine. All collaborators are injected; the engine
/// carries no ambient process state beyond its `AppConfig`.
pub struct RoleChatEngine {
    config: AppConfig,
    roles: Arc<dyn RoleDirectory>,
    resolver: SessionResolver,
    ledger: MessageLedger,
    provider: Arc<dyn ChatProvider>,
    context: Option<Arc<ContextBuilder>>,
    locks: SessionLocks,
}

impl RoleChatEngine {
    pub fn new(
        config: AppConfig,
        roles: Arc<dyn RoleDirectory>,
        sessions: Arc<dyn SessionStore>,
        messages: Arc<dyn MessageStore>,
        provider: Arc<dyn ChatProvider>,
    ) -> Self {
        Self {
            config,
            roles,
            resolver: SessionResolver::new(sessions),
            ledger: MessageLedger::new(messages),
            provider,
            context: None,
            locks: SessionLocks::new(),
        }
    }

    /// Attach knowledge-context assembly. Without it, turns run on the role
    /// prompt and history alone.
    pub fn with_knowledge(mut self, context: ContextBuilder) -> Self {
        self.context = Some(Arc::new(context));
        self
    }

    /// Run one chat turn.
    ///
    /// Input errors (unknown role, empty message) and persistence failures
    /// during setup return `Err` directly, before any event is emitted.
    /// Once this returns `Ok`, the stream begins with `meta` and ends with
    /// `done` or an error item.
    pub async fn chat(&self, request: ChatTurnRequest) -> Result<ChatStream> {
        if request.user_message.trim().is_empty() {
            return Err(Error::Validation { message: "user message must not be empty".into() });
        }

        let role = self
            .roles
            .find_by_name(&request.role_name)
            .await?
            .ok_or_else(|| Error::RoleNotFound { name: request.role_name.clone() })?;

        let model =
            request.model.clone().unwrap_or_else(|| self.config.default_model.clone());
        let provider_name = request
            .provider
            .clone()
            .unwrap_or_else(|| self.config.default_provider.clone());

        // Resolution by role name is serialized on the name so racing first
        // contacts converge on one session; explicit ids skip resolution and
        // need no such lock.
        let resolution_guard = if request.session_id.is_some() {
            None
        } else {
            Some(self.locks.acquire(role.name.trim()).await)
        };

        let session_id = self
            .resolver
            .resolve(
                &role,
                request.session_id.as_deref(),
                request.create_new_session,
                &model,
                &provider_name,
            )
            .await?;

        // One generation per conversation: every turn, however it addressed
        // the session, queues on the resolved id until its terminal event.
        let guard = self.locks.acquire(&session_id).await;
        drop(resolution_guard);

        let user_msg = self
            .ledger
            .create_user_message(&session_id, request.topic_id.clone(), &request.user_message)
            .await?;
        let assistant = self
            .ledger
            .create_assistant_placeholder(
                &session_id,
                user_msg.topic_id.clone(),
                &user_msg.id,
                &model,
                &provider_name,
            )
            .await?;

        info!(
            session_id = %session_id,
            role = %role.name,
            model = %model,
            "Starting chat turn"
        );

        let mut system = role.system_prompt();
        if let Some(context) = &self.context {
            if let Some(block) = context.build(&role.name, &request.user_message).await {
                if system.is_empty() {
                    system = block;
                } else {
                    system = format!("{system}\n\n{block}");
                }
            }
        }

        let history = self
            .ledger
            .history(
                &session_id,
                user_msg.topic_id.as_deref(),
                &[user_msg.id.as_str(), assistant.id.as_str()],
            )
            .await?;

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(system));
        messages.extend(history);
        messages.push(ChatMessage::user(request.user_message.clone()));

        let mut chat_request = ChatRequest::new(model, messages);
        chat_request.temperature = self.config.default_temperature;
        chat_request.user = request.user.clone();

        let (tx, rx) = mpsc::channel(32);
        let meta = ChatEvent::Meta {
            user_message_id: user_msg.id.clone(),
            assistant_message_id: assistant.id.clone(),
            session_id: session_id.clone(),
            topic_id: user_msg.topic_id.clone(),
        };
        // The receiver is alive and the channel empty, so this never blocks.
        let _ = tx.send(Ok(meta)).await;

        let provider = self.provider.clone();
        let ledger = self.ledger.clone();
        let retry = self.config.retry.clone();
        let assistant_id = assistant.id.clone();
        tokio::spawn(async move {
            let _guard = guard;
            run_turn(provider, ledger, retry, chat_request, assistant_id, tx).await;
        });

        Ok(ReceiverStream::new(rx))
    }
}

enum AttemptEnd {
    Completed,
    Cancelled,
}

/// Drive the invocation with bounded retry until a terminal event.
async fn run_turn(
    provider: Arc<dyn ChatProvider>,
    ledger: MessageLedger,
    retry: RetryConfig,
    request: ChatRequest,
    assistant_id: String,
    tx: mpsc::Sender<Result<ChatEvent>>,
) {
    // The buffer outlives attempts: a retried invocation keeps appending to
    // the already-persisted text rather than rolling it back.
    let mut full_text = String::new();
    let mut attempt: u32 = 0;

    let terminal = loop {
        match run_attempt(&*provider, &ledger, &request, &assistant_id, &mut full_text, &tx)
            .await
        {
            Ok(AttemptEnd::Completed) => {
                debug!(assistant_id = %assistant_id, chars = full_text.len(), "Turn completed");
                let _ = tx.send(Ok(ChatEvent::Done { usage: None })).await;
                return;
            }
            Ok(AttemptEnd::Cancelled) => {
                debug!(assistant_id = %assistant_id, "Caller stopped consuming, turn cancelled");
                return;
            }
            Err(e) => {
                let retryable = matches!(&e, Error::Provider(p) if p.is_retryable());
                if retryable && attempt < retry.max_retries {
                    let delay = retry.backoff_for(attempt as usize);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient provider failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                break e;
            }
        }
    };

    let code = terminal.code();
    warn!(assistant_id = %assistant_id, code = %code, error = %terminal, "Turn failed");
    if let Err(e) = ledger.mark_failed(&assistant_id, &code, &terminal.to_string()).await {
        warn!(error = %e, "Could not record terminal error on assistant message");
    }
    let _ = tx.send(Err(terminal)).await;
}

/// One provider invocation: stream, decode, persist, emit.
async fn run_attempt(
    provider: &dyn ChatProvider,
    ledger: &MessageLedger,
    request: &ChatRequest,
    assistant_id: &str,
    full_text: &mut String,
    tx: &mpsc::Sender<Result<ChatEvent>>,
) -> Result<AttemptEnd> {
    let mut chunks = provider.stream_chat(request.clone()).await?;

    while let Some(item) = chunks.recv().await {
        let bytes = item?;
        let chunk = String::from_utf8_lossy(&bytes);
        for fragment in decode_chunk(&chunk) {
            full_text.push_str(&fragment);
            // Persist the cumulative snapshot before emitting the increment.
            ledger.append_delta(assistant_id, full_text).await?;
            if tx.send(Ok(ChatEvent::Delta { text: fragment })).await.is_err() {
                return Ok(AttemptEnd::Cancelled);
            }
        }
    }

    Ok(AttemptEnd::Completed)
}
