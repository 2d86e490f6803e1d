//! Capture process spawning and control.
//!
//! Builds and owns the external tcpdump process that produces the raw
//! signaling dump. One capture process exists at a time; lifecycle
//! enforcement lives in the monitor service, this module only spawns and
//! terminates.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, ChildStdout, Command};

use super::error::SpawnError;

/// Default capture binary.
pub const DEFAULT_CAPTURE_BINARY: &str = "tcpdump";

/// Default SIP signaling port.
pub const DEFAULT_SIP_PORT: u16 = 5060;

/// Builder for the capture command line.
#[derive(Debug, Clone)]
pub struct CaptureCommandBuilder {
    interface: String,
    port: u16,
}

impl CaptureCommandBuilder {
    /// Create a builder capturing on the given network interface.
    #[must_use]
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            port: DEFAULT_SIP_PORT,
        }
    }

    /// Set the signaling port to filter on.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// The interface this builder captures on.
    #[must_use]
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Build the command-line arguments: line-buffered ASCII dump of the
    /// signaling port.
    #[must_use]
    pub fn build_args(&self) -> Vec<String> {
        vec![
            "-i".to_string(),
            self.interface.clone(),
            "-n".to_string(),
            "-l".to_string(),
            "-A".to_string(),
            "port".to_string(),
            self.port.to_string(),
        ]
    }
}

/// A running capture process.
#[derive(Debug)]
pub struct CaptureProcess {
    child: Child,
}

impl CaptureProcess {
    /// Spawn the configured capture binary (tcpdump in practice, a stub
    /// script in tests).
    ///
    /// # Errors
    ///
    /// Returns `SpawnError` if the process fails to spawn.
    pub fn spawn_with_binary(
        binary: &str,
        builder: &CaptureCommandBuilder,
    ) -> Result<Self, SpawnError> {
        let child = Command::new(binary)
            .args(builder.build_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(SpawnError::from_io)?;

        Ok(Self { child })
    }

    /// Take ownership of the stdout handle.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Get the process ID, if still running.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Forcefully kill the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the kill signal cannot be sent.
    pub async fn kill(&mut self) -> std::io::Result<()> {
        self.child.kill().await
    }

    /// Attempt graceful termination with a timeout.
    ///
    /// On Unix, sends SIGTERM first, then SIGKILL after the timeout.
    /// On other platforms, falls back to immediate kill.
    ///
    /// # Errors
    ///
    /// Returns an error if termination fails.
    pub async fn graceful_terminate(&mut self, timeout: Duration) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            self.graceful_terminate_unix(timeout).await
        }

        #[cfg(not(unix))]
        {
            let _ = timeout;
            self.kill().await
        }
    }

    #[cfg(unix)]
    async fn graceful_terminate_unix(&mut self, timeout: Duration) -> std::io::Result<()> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = self.id() {
            let nix_pid = Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));
            let _ = kill(nix_pid, Signal::SIGTERM);

            match tokio::time::timeout(timeout, self.child.wait()).await {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(e)) => Err(e),
                Err(_) => self.child.kill().await,
            }
        } else {
            // Process already exited
            Ok(())
        }
    }
}
