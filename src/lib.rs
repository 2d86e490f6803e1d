//! Live SIP signaling monitor.
//!
//! Captures signaling traffic with an external tcpdump process, classifies
//! it into typed messages, tracks per-call state, diagnoses common failure
//! codes and serves it all over HTTP and WebSocket.

pub mod calls;
pub mod capture;
pub mod config;
pub mod monitor;
pub mod server;
pub mod sip;
