//! External capture process management.

mod error;
mod process;

pub use error::{CaptureError, SpawnError};
pub use process::{
    CaptureCommandBuilder, CaptureProcess, DEFAULT_CAPTURE_BINARY, DEFAULT_SIP_PORT,
};
