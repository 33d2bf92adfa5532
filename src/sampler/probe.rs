//! Reachability probes.
//!
//! A probe is one bounded run of the external `ping` binary; its exit
//! code is the sample. Exit codes are environment-defined and pass
//! through uninterpreted, so the documents record exactly what the
//! probe reported.

use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// Sample code recorded when a probe produced no exit code at all:
/// killed by a signal, or reaped by the watchdog timeout. Distinct
/// from every real `ping` exit code, which are non-negative.
pub const PROBE_FAILURE_CODE: i32 = -1;

/// Errors that prevent a probe from running at all.
///
/// A probe that runs and fails is data, not an error; this type covers
/// only infrastructure problems like a missing probe binary.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Failed to spawn or reap the probe process.
    #[error("probe process error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single reachability test producing an integer status code.
///
/// 0 means the target was reachable; any other value is a failure with
/// probe-defined meaning, recorded verbatim.
#[async_trait::async_trait]
pub trait Prober: Send + Sync + 'static {
    /// Run one probe to completion within its bounded wait.
    async fn probe(&self) -> Result<i32, ProbeError>;
}

/// Prober backed by the system `ping` binary.
#[derive(Debug, Clone)]
pub struct PingProber {
    program: String,
    target: String,
    interface: Option<String>,
    timeout: Duration,
}

impl PingProber {
    /// Create a prober for the given target.
    pub fn new(target: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: "ping".to_string(),
            target: target.into(),
            interface: None,
            timeout,
        }
    }

    /// Pin probes to an egress interface (`ping -I`).
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    /// Override the probe executable (test seam).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments passed to the probe binary: one echo request with a
    /// deadline, optionally pinned to an interface.
    pub fn command_args(&self) -> Vec<String> {
        // `ping -w` wants whole seconds; sub-second timeouts still get
        // a deadline of 1, with the watchdog below enforcing the finer
        // bound.
        let deadline = self.timeout.as_secs().max(1);
        let mut args = vec![
            "-c".to_string(),
            "1".to_string(),
            "-w".to_string(),
            deadline.to_string(),
        ];
        if let Some(ref iface) = self.interface {
            args.push("-I".to_string());
            args.push(iface.clone());
        }
        args.push(self.target.clone());
        args
    }
}

#[async_trait::async_trait]
impl Prober for PingProber {
    async fn probe(&self) -> Result<i32, ProbeError> {
        let mut child = Command::new(&self.program)
            .args(self.command_args())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        // Watchdog on top of ping's own deadline, so a wedged probe
        // cannot stall the scheduler past the next slot.
        match timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => Ok(status.code().unwrap_or(PROBE_FAILURE_CODE)),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                tracing::warn!(
                    target_host = %self.target,
                    timeout_ms = self.timeout.as_millis(),
                    "Probe timed out, killing"
                );
                child.start_kill().ok();
                child.wait().await.ok();
                Ok(PROBE_FAILURE_CODE)
            }
        }
    }
}
