//! HTTP and WebSocket surface of the monitor.

mod api;
mod error;
mod handlers;
mod server;
mod ws;

pub use api::{CaptureControlResponse, HistoryQuery, MessagesQuery, StartRequest, MAX_LIST_LIMIT};
pub use error::ApiError;
pub use handlers::AppState;
pub use server::MonitorServer;
pub use ws::SubscriberCommand;
