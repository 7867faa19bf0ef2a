//! The agent reasoning loop implementation.

use crate::error::AgentError;
use calclaw_core::error::ToolError;
use calclaw_core::history::HistoryStore;
use calclaw_core::message::{Conversation, Message, MessageToolCall, Role, SessionId};
use calclaw_core::provider::{Provider, ProviderRequest};
use calclaw_core::tool::{ToolCall, ToolRegistry};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Final text of a turn that ran out of tool iterations.
pub const ITERATION_LIMIT_REPLY: &str =
    "I've reached the maximum number of tool call iterations. Please provide further guidance.";

/// What the user sees when a turn fails.
pub const APOLOGY_REPLY: &str =
    "Sorry, I couldn't complete your request right now. Please try again in a moment.";

/// Orchestrates LLM decisions and tool execution for every session.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    model: String,

    temperature: f32,

    /// Default max tokens per response
    max_tokens: Option<u32>,

    tools: Arc<ToolRegistry>,

    history: Arc<dyn HistoryStore>,

    /// Rendered once at construction
    system_prompt: String,

    /// Maximum tool calls per turn
    max_iterations: u32,

    /// One turn lock per session
    session_locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        tools: Arc<ToolRegistry>,
        history: Arc<dyn HistoryStore>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            tools,
            history,
            system_prompt: system_prompt.into(),
            max_iterations: 10,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Set the maximum number of tool call iterations.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Set the default max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Process one user message and return the final answer.
    ///
    /// The turn's messages are appended to history in a single call once the
    /// LLM has produced its answer; a provider failure leaves history untouched.
    pub async fn handle_turn(&self, session: &SessionId, text: &str) -> Result<String, AgentError> {
        let lock = self.session_lock(session).await;
        let result = {
            let _turn = lock.lock().await;
            self.turn(session, text).await
        };
        self.release_session_lock(session, lock).await;
        result
    }

    async fn turn(&self, session: &SessionId, text: &str) -> Result<String, AgentError> {
        let stored = self.history.read_all(session).await?;
        let mut conversation = Conversation::from_history(session.clone(), stored);
        let committed = conversation.messages.len();
        if conversation.is_empty() {
            conversation.push(Message::system(&self.system_prompt));
        }
        conversation.push(Message::user(text));

        info!(
            session_id = %session,
            history = committed,
            "Processing turn"
        );

        let reply = self.run(&mut conversation).await?;
        self.history
            .append(session, conversation.tail(committed))
            .await?;
        Ok(reply)
    }

    /// Like [`handle_turn`](Self::handle_turn), but failures become an apology.
    pub async fn respond(&self, session: &SessionId, text: &str) -> String {
        match self.handle_turn(session, text).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(session_id = %session, error = %e, "Turn failed");
                APOLOGY_REPLY.into()
            }
        }
    }

    async fn session_lock(&self, session: &SessionId) -> Arc<Mutex<()>> {
        self.session_locks
            .lock()
            .await
            .entry(session.clone())
            .or_default()
            .clone()
    }

    /// Drop the session's entry once no other turn holds or waits on it.
    async fn release_session_lock(&self, session: &SessionId, lock: Arc<Mutex<()>>) {
        let mut locks = self.session_locks.lock().await;
        // The map and `lock` are the only owners left
        if Arc::strong_count(&lock) == 2 {
            locks.remove(session);
        }
    }

    /// History as sent to the LLM: a stored system message is replaced by the
    /// current prompt so long-lived sessions see a fresh clock.
    fn request_messages(&self, conversation: &Conversation) -> Vec<Message> {
        let mut messages = conversation.messages.clone();
        match messages.first_mut() {
            Some(first) if first.role == Role::System => first.content = self.system_prompt.clone(),
            _ => messages.insert(0, Message::system(&self.system_prompt)),
        }
        messages
    }

    async fn run(&self, conversation: &mut Conversation) -> Result<String, AgentError> {
        let tool_definitions = self.tools.definitions();

        for iteration in 1..=self.max_iterations {
            debug!(session_id = %conversation.id, iteration, "Agent loop iteration");

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: self.request_messages(conversation),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
                parallel_tool_calls: Some(false),
            };

            let mut message = self.provider.complete(request).await?.message;

            if message.tool_calls.len() > 1 {
                warn!(
                    requested = message.tool_calls.len(),
                    "Provider returned several tool calls, keeping the first"
                );
                message.tool_calls.truncate(1);
            }

            let Some(call) = message.tool_calls.first().cloned() else {
                let reply = message.content.clone();
                conversation.push(message);
                return Ok(reply);
            };

            conversation.push(message);
            let output = self.invoke(&call).await;
            conversation.push(Message::tool_result(&call.id, &call.name, output));
        }

        warn!(
            session_id = %conversation.id,
            max_iterations = self.max_iterations,
            "Max tool iterations reached"
        );
        conversation.push(Message::assistant(ITERATION_LIMIT_REPLY));
        Ok(ITERATION_LIMIT_REPLY.into())
    }

    /// Run one tool call; every failure becomes tool output.
    async fn invoke(&self, call: &MessageToolCall) -> String {
        let arguments = match parse_arguments(&call.arguments) {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Malformed tool arguments");
                return format!("Error: {e}");
            }
        };

        let start = Instant::now();
        let result = self
            .tools
            .execute(&ToolCall {
                id: call.id.clone(),
                name: call.name.clone(),
                arguments,
            })
            .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(result) => {
                info!(tool = %call.name, success = result.success, duration_ms, "Tool executed");
                result.output
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                format!("Error: {e}")
            }
        }
    }
}

fn parse_arguments(raw: &str) -> Result<Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw)
        .map_err(|e| ToolError::InvalidArguments(format!("malformed JSON arguments: {e}")))
}
