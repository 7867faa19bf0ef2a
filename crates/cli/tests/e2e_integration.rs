//! End-to-end tests for the calendar assistant.
//!
//! These drive a full turn: scripted LLM replies, the real calendar tool
//! registry over an in-process calendar, and an in-memory history store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use calclaw_agent::AgentLoop;
use calclaw_core::calendar::{CalendarApi, EventPayload, EventQuery, NewCalendar, Page};
use calclaw_core::error::{CalendarError, ProviderError};
use calclaw_core::history::HistoryStore;
use calclaw_core::message::{Message, MessageToolCall, Role, SessionId};
use calclaw_core::provider::{Provider, ProviderRequest, ProviderResponse};
use calclaw_history::InMemoryHistory;
use calclaw_tools::{CalendarOperations, calendar_registry};
use serde_json::{Value, json};

// ── Mock Provider ────────────────────────────────────────────────────────

/// Returns scripted assistant messages in sequence and records every request.
struct ScriptedProvider {
    responses: Mutex<Vec<Message>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(ProviderError::ApiError {
                status_code: 500,
                message: "script exhausted".into(),
            });
        }
        Ok(ProviderResponse {
            message: responses.remove(0),
            usage: None,
            model: "scripted".into(),
        })
    }
}

// ── Mock Calendar ────────────────────────────────────────────────────────

/// A two-calendar account that logs every remote call.
#[derive(Default)]
struct FakeCalendar {
    calls: Mutex<Vec<String>>,
}

impl FakeCalendar {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarApi for FakeCalendar {
    async fn insert_calendar(&self, calendar: &NewCalendar) -> Result<Value, CalendarError> {
        self.calls.lock().unwrap().push(format!("insert_calendar:{}", calendar.summary));
        Ok(json!({"id": "new-cal", "summary": calendar.summary}))
    }

    async fn list_calendars(
        &self,
        page_size: u32,
        _page_token: Option<&str>,
    ) -> Result<Page<Value>, CalendarError> {
        self.calls.lock().unwrap().push(format!("list_calendars:{page_size}"));
        Ok(Page {
            items: vec![
                json!({"id": "ana@example.com", "summary": "Ana", "primary": true,
                       "timeZone": "America/Sao_Paulo", "accessRole": "owner"}),
                json!({"id": "gym@group.calendar.google.com", "summary": "Gym",
                       "timeZone": "America/Sao_Paulo", "accessRole": "owner"}),
            ],
            next_page_token: None,
        })
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        _query: &EventQuery,
        page_size: u32,
        _page_token: Option<&str>,
    ) -> Result<Page<Value>, CalendarError> {
        self.calls.lock().unwrap().push(format!("list_events:{calendar_id}:{page_size}"));
        Ok(Page::default())
    }

    async fn insert_event(
        &self,
        calendar_id: &str,
        _event: &EventPayload,
        _send_notifications: bool,
    ) -> Result<Value, CalendarError> {
        self.calls.lock().unwrap().push(format!("insert_event:{calendar_id}"));
        Ok(json!({"id": "ev1", "htmlLink": "https://calendar.example/ev1"}))
    }

    async fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        _patch: &EventPayload,
    ) -> Result<Value, CalendarError> {
        self.calls.lock().unwrap().push(format!("patch_event:{calendar_id}:{event_id}"));
        Ok(json!({"id": event_id}))
    }

    async fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        _send_notifications: bool,
    ) -> Result<(), CalendarError> {
        self.calls.lock().unwrap().push(format!("delete_event:{calendar_id}:{event_id}"));
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn tool_call(id: &str, name: &str, arguments: Value) -> Message {
    Message::tool_request(
        "",
        MessageToolCall {
            id: id.into(),
            name: name.into(),
            arguments: arguments.to_string(),
        },
    )
}

struct Harness {
    agent: AgentLoop,
    provider: Arc<ScriptedProvider>,
    calendar: Arc<FakeCalendar>,
    history: Arc<InMemoryHistory>,
}

fn harness(responses: Vec<Message>) -> Harness {
    let provider = Arc::new(ScriptedProvider::new(responses));
    let calendar = Arc::new(FakeCalendar::default());
    let history = Arc::new(InMemoryHistory::new());

    let ops = Arc::new(CalendarOperations::connected(calendar.clone()));
    let tools = calendar_registry(ops, "America/Sao_Paulo").unwrap();

    let agent = AgentLoop::new(
        provider.clone(),
        "scripted",
        0.0,
        Arc::new(tools),
        history.clone(),
        "You are a calendar assistant.",
    );

    Harness {
        agent,
        provider,
        calendar,
        history,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_my_calendars_makes_exactly_one_tool_call() {
    let h = harness(vec![
        tool_call("call_1", "list_calendars", json!({})),
        Message::assistant("You have two calendars: Ana (primary) and Gym."),
    ]);
    let session = SessionId::from("e2e-list");

    let reply = h.agent.handle_turn(&session, "list my calendars").await.unwrap();

    assert!(reply.contains("Ana"));
    assert!(reply.contains("Gym"));
    assert_eq!(h.calendar.calls(), vec!["list_calendars:200".to_string()]);
    assert_eq!(h.provider.request_count(), 2);

    let stored = h.history.read_all(&session).await.unwrap();
    let roles: Vec<Role> = stored.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );

    let listing: Value = serde_json::from_str(&stored[3].content).unwrap();
    assert_eq!(listing[0]["id"], "ana@example.com");
    assert_eq!(listing[0]["primary"], true);
    assert_eq!(listing[1]["name"], "Gym");
}

#[tokio::test]
async fn second_request_sees_tool_output_in_context() {
    let h = harness(vec![
        tool_call("call_1", "list_calendars", json!({"max_capacity": 5})),
        Message::assistant("Done."),
    ]);
    let session = SessionId::from("e2e-context");
    h.agent.handle_turn(&session, "which calendars do I have?").await.unwrap();

    let requests = h.provider.requests.lock().unwrap().clone();
    let second = &requests[1].messages;
    let tool_msg = second.iter().find(|m| m.role == Role::Tool).unwrap();
    assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(tool_msg.name.as_deref(), Some("list_calendars"));
    assert_eq!(h.calendar.calls(), vec!["list_calendars:5".to_string()]);
    assert_eq!(requests[0].tools.len(), 6);
}

#[tokio::test]
async fn invalid_event_time_never_reaches_the_calendar() {
    let h = harness(vec![
        tool_call(
            "call_1",
            "create_event",
            json!({"start": "tomorrow at ten", "end": "2025-05-27T11:00:00"}),
        ),
        Message::assistant("Could you give me the exact start time?"),
    ]);
    let session = SessionId::from("e2e-invalid");
    h.agent.handle_turn(&session, "book something tomorrow").await.unwrap();

    assert!(h.calendar.calls().is_empty());
    let stored = h.history.read_all(&session).await.unwrap();
    let tool_msg = stored.iter().find(|m| m.role == Role::Tool).unwrap();
    assert_eq!(tool_msg.content, "The event start time is not in ISO/RFC3339 format");
}

#[tokio::test]
async fn provider_outage_yields_apology_and_keeps_history_clean() {
    let h = harness(vec![]);
    let session = SessionId::from("e2e-outage");

    let reply = h.agent.respond(&session, "hello").await;

    assert_eq!(reply, calclaw_agent::APOLOGY_REPLY);
    assert!(h.history.read_all(&session).await.unwrap().is_empty());
}
