//! Monitor configuration.

mod loader;
mod types;

pub use loader::{ConfigError, ConfigLoader};
pub use types::{
    AnalyzerConfig, CaptureConfig, HistoryConfig, LiveConfig, MonitorConfig, ServerConfig,
    DEFAULT_SERVER_PORT,
};
