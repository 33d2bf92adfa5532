//! Live device-status passthrough.
//!
//! The dish exposes a local gRPC device-management endpoint; `current`
//! requests are answered by shelling out to `grpcurl` and forwarding
//! its stdout verbatim. No retry, and no timeout beyond what the
//! transport gives us.

use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;

/// Default device-management endpoint on the dish's LAN address.
pub const DEFAULT_ENDPOINT: &str = "192.168.100.1:9200";

/// gRPC method handling device queries.
const DEVICE_METHOD: &str = "SpaceX.API.Device.Device/Handle";

/// Fixed query payload for the current-status call.
const STATUS_PAYLOAD: &str = r#"{"get_history":{}}"#;

/// Errors from the live-status call.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Could not run the proxy command at all.
    #[error("proxy process error: {0}")]
    Io(#[from] std::io::Error),

    /// The device call ran but failed.
    #[error("device call failed: {0}")]
    Call(String),
}

/// Synchronous passthrough to the device-management endpoint.
#[derive(Debug, Clone)]
pub struct StatusProxy {
    program: String,
    endpoint: String,
}

impl Default for StatusProxy {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl StatusProxy {
    /// Create a proxy against the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            program: "grpcurl".to_string(),
            endpoint: endpoint.into(),
        }
    }

    /// Override the proxy executable (test seam).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments for the device query call.
    pub fn command_args(&self) -> Vec<String> {
        vec![
            "-plaintext".to_string(),
            "-d".to_string(),
            STATUS_PAYLOAD.to_string(),
            self.endpoint.clone(),
            DEVICE_METHOD.to_string(),
        ]
    }

    /// Perform one device query and return the raw response bytes.
    ///
    /// # Errors
    /// Returns `ProxyError::Io` if the command cannot run, `Call` if
    /// it exits nonzero.
    pub async fn fetch(&self) -> Result<Vec<u8>, ProxyError> {
        let output = Command::new(&self.program)
            .args(self.command_args())
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ProxyError::Call(stderr));
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args() {
        let proxy = StatusProxy::default();
        assert_eq!(
            proxy.command_args(),
            vec![
                "-plaintext",
                "-d",
                r#"{"get_history":{}}"#,
                "192.168.100.1:9200",
                "SpaceX.API.Device.Device/Handle",
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_forwards_stdout_verbatim() {
        // `echo` prints its arguments, standing in for grpcurl.
        let proxy = StatusProxy::new("127.0.0.1:1").with_program("echo");
        let body = proxy.fetch().await.unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains(r#"{"get_history":{}}"#));
        assert!(text.contains("127.0.0.1:1"));
    }

    #[tokio::test]
    async fn test_fetch_nonzero_exit_is_call_error() {
        let proxy = StatusProxy::new("127.0.0.1:1").with_program("false");
        let err = proxy.fetch().await.unwrap_err();
        assert!(matches!(err, ProxyError::Call(_)));
    }

    #[tokio::test]
    async fn test_fetch_missing_binary_is_io_error() {
        let proxy = StatusProxy::new("127.0.0.1:1").with_program("linkwatch-no-such");
        let err = proxy.fetch().await.unwrap_err();
        assert!(matches!(err, ProxyError::Io(_)));
    }
}
