//! Google Calendar v3 REST client.

use crate::token::TokenStore;
use async_trait::async_trait;
use calclaw_core::calendar::{CalendarApi, EventPayload, EventQuery, NewCalendar, Page};
use calclaw_core::error::CalendarError;
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// [`CalendarApi`] over the Google Calendar REST API.
pub struct GoogleCalendarClient {
    base_url: Url,
    http: reqwest::Client,
    tokens: Arc<TokenStore>,
}

impl GoogleCalendarClient {
    pub fn new(
        base_url: &str,
        tokens: Arc<TokenStore>,
        http: reqwest::Client,
    ) -> Result<Self, CalendarError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CalendarError::Unavailable(format!("invalid api_base_url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CalendarError::Unavailable(format!(
                "api_base_url cannot be a base: {base_url}"
            )));
        }
        Ok(Self {
            base_url,
            http,
            tokens,
        })
    }

    /// Build an endpoint URL; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send one request, replaying it once after a token refresh on 401.
    async fn call(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<Option<Value>, CalendarError> {
        let token = self.tokens.access_token().await?;
        let mut response = self.send(&method, &url, body.as_ref(), &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(%url, "Access token rejected, refreshing");
            let token = self.tokens.refresh().await?;
            response = self.send(&method, &url, body.as_ref(), &token).await?;
        }

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CalendarError::Network(e.to_string()))?;

        if !status.is_success() {
            warn!(%method, %url, status = status.as_u16(), "Calendar API error");
            return Err(api_error(status, &text));
        }

        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| CalendarError::Decode(e.to_string()))
    }

    async fn send(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&Value>,
        token: &str,
    ) -> Result<reqwest::Response, CalendarError> {
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|e| CalendarError::Network(e.to_string()))
    }

    async fn call_json(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<Value, CalendarError> {
        self.call(method, url, body)
            .await?
            .ok_or_else(|| CalendarError::Decode("empty response body".into()))
    }

    async fn list(&self, url: Url) -> Result<Page<Value>, CalendarError> {
        let body = self.call_json(Method::GET, url, None).await?;
        let page: RawPage = serde_json::from_value(body)
            .map_err(|e| CalendarError::Decode(format!("list response: {e}")))?;
        Ok(Page {
            items: page.items,
            next_page_token: page.next_page_token,
        })
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, CalendarError> {
    serde_json::to_value(value).map_err(|e| CalendarError::Decode(e.to_string()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPage {
    #[serde(default)]
    items: Vec<Value>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Decode Google's `{"error": {"code", "message"}}` envelope.
fn api_error(status: StatusCode, body: &str) -> CalendarError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());

    if status == StatusCode::NOT_FOUND {
        CalendarError::NotFound(message)
    } else {
        CalendarError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn insert_calendar(&self, calendar: &NewCalendar) -> Result<Value, CalendarError> {
        let url = self.endpoint(&["calendars"]);
        self.call_json(Method::POST, url, Some(to_body(calendar)?)).await
    }

    async fn list_calendars(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page<Value>, CalendarError> {
        let mut url = self.endpoint(&["users", "me", "calendarList"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("maxResults", &page_size.to_string());
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        self.list(url).await
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        filter: &EventQuery,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page<Value>, CalendarError> {
        let mut url = self.endpoint(&["calendars", calendar_id, "events"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("maxResults", &page_size.to_string());
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
            if let Some(time_min) = &filter.time_min {
                query.append_pair("timeMin", time_min);
            }
            if let Some(time_max) = &filter.time_max {
                query.append_pair("timeMax", time_max);
            }
            query.append_pair("showDeleted", if filter.show_deleted { "true" } else { "false" });
        }
        self.list(url).await
    }

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &EventPayload,
        send_notifications: bool,
    ) -> Result<Value, CalendarError> {
        let mut url = self.endpoint(&["calendars", calendar_id, "events"]);
        url.query_pairs_mut()
            .append_pair("sendNotifications", &send_notifications.to_string());
        self.call_json(Method::POST, url, Some(to_body(event)?)).await
    }

    async fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &EventPayload,
    ) -> Result<Value, CalendarError> {
        let url = self.endpoint(&["calendars", calendar_id, "events", event_id]);
        self.call_json(Method::PATCH, url, Some(to_body(patch)?)).await
    }

    async fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        send_notifications: bool,
    ) -> Result<(), CalendarError> {
        let mut url = self.endpoint(&["calendars", calendar_id, "events", event_id]);
        url.query_pairs_mut()
            .append_pair("sendNotifications", &send_notifications.to_string());
        self.call(Method::DELETE, url, None).await.map(|_| ())
    }
}
