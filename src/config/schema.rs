/// Configuration schema and defaults for imsdash.
///
/// Defines the TOML-serializable configuration with the sections
/// `[server]`, `[endpoints]`, `[dashboard]`, and `[logging]`. Every field
/// has a built-in default matching the stock IMS backend, so an empty file
/// is a valid configuration.
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Largest accepted `dashboard.capacity`.
pub const MAX_CAPACITY: usize = 10_000;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level imsdash configuration.
///
/// Maps directly to `~/.imsdash/config.toml` and `.imsdash.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImsConfig {
    pub server: ServerConfig,
    pub endpoints: EndpointsConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Backend location and transport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the IMS backend, without a trailing path.
    pub base_url: String,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// [endpoints]
// ---------------------------------------------------------------------------

/// Endpoint paths, relative to `server.base_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Snapshot history (JSON array, oldest first).
    pub history: String,
    /// Current stats (single JSON object).
    pub stats: String,
    /// Assistant chat (`POST`, `{"message"}` → `{"response"}`).
    pub chat: String,
    /// Assistant liveness probe (plain text).
    pub chat_test: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            history: "/api/dashboard/history".to_string(),
            stats: "/api/dashboard/stats".to_string(),
            chat: "/api/chatbot/chat".to_string(),
            chat_test: "/api/chatbot/test".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Polling and series settings for the live dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Period between polls (milliseconds).
    pub poll_interval_ms: u64,
    /// Delay before the initial seed (milliseconds).
    pub initial_delay_ms: u64,
    /// Maximum number of points kept per series.
    pub capacity: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 3000,
            initial_delay_ms: 500,
            capacity: 20,
        }
    }
}

impl DashboardConfig {
    /// Reject settings the dashboard cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_CAPACITY).contains(&self.capacity) {
            anyhow::bail!(
                "dashboard.capacity must be between 1 and {MAX_CAPACITY}, got {}",
                self.capacity
            );
        }
        if self.poll_interval_ms == 0 {
            anyhow::bail!("dashboard.poll_interval_ms must be at least 1");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Event log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write seed/poll/chat events to the JSONL event log.
    pub events_enabled: bool,
    /// Override for the event log location. Empty means
    /// `~/.imsdash/events.jsonl`.
    pub events_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            events_enabled: true,
            events_path: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl ImsConfig {
    /// Check cross-field limits that the TOML types alone cannot express.
    pub fn validate(&self) -> Result<()> {
        self.dashboard.validate()
    }

    /// The annotated config written by `imsdash config init`.
    pub fn default_toml() -> &'static str {
        DEFAULT_TOML
    }
}

const DEFAULT_TOML: &str = r#"# imsdash configuration
#
# Precedence: built-in defaults < ~/.imsdash/config.toml < .imsdash.toml
# < IMSDASH_* environment variables.

[server]
# Base URL of the IMS backend.
base_url = "http://localhost:8080"
# Per-request timeout in milliseconds.
timeout_ms = 5000

[endpoints]
history = "/api/dashboard/history"
stats = "/api/dashboard/stats"
chat = "/api/chatbot/chat"
chat_test = "/api/chatbot/test"

[dashboard]
# Milliseconds between polls for a new snapshot.
poll_interval_ms = 3000
# Milliseconds to wait before the first history fetch.
initial_delay_ms = 500
# Points kept per chart; the oldest point is dropped first.
capacity = 20

[logging]
# Append seed/poll/chat events to a JSONL log.
events_enabled = true
# Empty means ~/.imsdash/events.jsonl
events_path = ""
"#;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
