//! Capture error types.

/// Error type for spawning the capture process.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The capture binary was not found on PATH.
    #[error("capture binary not found")]
    NotFound,
    /// Permission denied when spawning (raw capture usually needs root).
    #[error("permission denied spawning capture process")]
    PermissionDenied,
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpawnError {
    /// Classify common spawn failures from an I/O error.
    pub(crate) fn from_io(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound,
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Io(err),
        }
    }
}

/// Errors that can occur while starting a capture pipeline.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    /// The capture process failed to spawn.
    #[error("failed to spawn capture process: {0}")]
    Spawn(#[from] SpawnError),

    /// The spawned process exposed no stdout handle.
    #[error("capture process stdout not available")]
    NoStdout,
}
