/// HTTP client for the IMS assistant endpoint.
///
/// `POST {base}/api/chatbot/chat` with `{"message": "..."}` returns
/// `{"response": "..."}`. [`ChatClient::send`] never fails: transport
/// errors, error statuses and unparseable bodies become
/// [`ERROR_REPLY`], and a reply without text becomes [`EMPTY_REPLY`].
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::ChatBackend;
use crate::config::ImsConfig;
use crate::eventlog::{EventKind, EventLog};
use crate::utils::http;

/// Reply shown when the request itself failed.
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Reply shown when the backend answered without any text.
pub const EMPTY_REPLY: &str = "Sorry, I couldn't process that request.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    chat_url: String,
    timeout: Duration,
    events: EventLog,
}

impl ChatClient {
    pub fn from_config(config: &ImsConfig) -> Self {
        Self {
            chat_url: http::endpoint_url(&config.server.base_url, &config.endpoints.chat),
            timeout: config.server.timeout(),
            events: EventLog::disabled(),
        }
    }

    pub fn with_event_log(mut self, events: EventLog) -> Self {
        self.events = events;
        self
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    /// Send one message and return the raw `response` field.
    ///
    /// `Ok(None)` means the backend answered successfully but without text.
    pub fn try_send(&self, message: &str) -> Result<Option<String>> {
        let reply: ChatResponse =
            http::post_json(&self.chat_url, self.timeout, &ChatRequest { message })?;
        Ok(reply.response.filter(|text| !text.is_empty()))
    }

    /// Send one message and always return displayable text.
    pub fn send(&self, message: &str) -> String {
        match self.try_send(message) {
            Ok(Some(text)) => text,
            Ok(None) => {
                self.events.record(EventKind::Chat, "empty-reply", None);
                EMPTY_REPLY.to_string()
            }
            Err(e) => {
                self.events
                    .record(EventKind::Chat, "fallback", Some(&format!("{e:#}")));
                ERROR_REPLY.to_string()
            }
        }
    }
}

impl ChatBackend for ChatClient {
    fn reply(&self, message: &str) -> String {
        self.send(message)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_single_field() {
        let json = serde_json::to_string(&ChatRequest { message: "stock?" }).unwrap();
        assert_eq!(json, r#"{"message":"stock?"}"#);
    }

    #[test]
    fn response_field_is_optional() {
        let parsed: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.response.is_none());
        let parsed: ChatResponse = serde_json::from_str(r#"{"response":"42 pens"}"#).unwrap();
        assert_eq!(parsed.response.as_deref(), Some("42 pens"));
    }

    #[test]
    fn unreachable_backend_yields_error_reply() {
        let mut cfg = ImsConfig::default();
        cfg.server.base_url = "http://127.0.0.1:9".to_string();
        cfg.server.timeout_ms = 200;
        let client = ChatClient::from_config(&cfg);
        assert_eq!(client.send("hello"), ERROR_REPLY);
    }

    #[test]
    fn url_uses_chat_endpoint() {
        let client = ChatClient::from_config(&ImsConfig::default());
        assert_eq!(client.chat_url(), "http://127.0.0.1:8080/api/chatbot/chat");
    }
}
