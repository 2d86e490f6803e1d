//! Configuration types.

use serde::{Deserialize, Serialize};

use crate::calls::{DEFAULT_MESSAGE_CAPACITY, DEFAULT_STUCK_AFTER_SECS};
use crate::capture::{DEFAULT_CAPTURE_BINARY, DEFAULT_SIP_PORT};

/// Default port for the monitor server.
pub const DEFAULT_SERVER_PORT: u16 = 8060;

/// Top-level monitor configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Capture process settings.
    pub capture: CaptureConfig,
    /// History and view limits.
    pub history: HistoryConfig,
    /// HTTP/WebSocket server settings.
    pub server: ServerConfig,
    /// Diagnostic scan settings.
    pub analyzer: AnalyzerConfig,
    /// Live subscriber channel settings.
    pub live: LiveConfig,
}

/// Capture process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Capture binary to spawn.
    pub binary: String,
    /// Default network interface when start() omits one.
    pub interface: String,
    /// Signaling port to filter on.
    pub port: u16,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_CAPTURE_BINARY.to_string(),
            interface: default_interface(),
            port: DEFAULT_SIP_PORT,
        }
    }
}

fn default_interface() -> String {
    "eth0".to_string()
}

/// History bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Capacity of the raw message ring buffer.
    pub message_capacity: usize,
    /// Default session count for the call-history view.
    pub session_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            message_capacity: DEFAULT_MESSAGE_CAPACITY,
            session_limit: default_session_limit(),
        }
    }
}

fn default_session_limit() -> usize {
    50
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable permissive CORS.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_SERVER_PORT,
            cors_permissive: true,
        }
    }
}

/// Problem analyzer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Seconds after which a call still in trying is flagged.
    pub stuck_call_secs: i64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            stuck_call_secs: DEFAULT_STUCK_AFTER_SECS,
        }
    }
}

/// Live push channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Seconds an idle subscriber waits before receiving a keepalive.
    pub keepalive_secs: u64,
    /// Capacity of the event broadcast channel.
    pub event_channel_capacity: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            keepalive_secs: default_keepalive_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_keepalive_secs() -> u64 {
    30
}

fn default_event_channel_capacity() -> usize {
    256
}
