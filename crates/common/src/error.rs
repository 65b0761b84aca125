//! Error types for airhook
//!
//! Environment failures, tool launch failures and process supervision errors.
//! Expected negative outcomes (no clients, no handshake, key not in wordlist)
//! are never errors: they are `None` / empty results at the call site.
//! A capture stopped by the user interrupt surfaces as `Cancelled` once its
//! process has been terminated.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AirhookError {
    #[error("Required tool not found: {0}")]
    ToolMissing(String),

    #[error("No wireless interface capable of monitor mode found")]
    NoInterface,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("Process did not exit after termination request: {0}")]
    ProcessUnresponsive(String),

    #[error("Capture session already running for {0}")]
    SessionActive(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

impl AirhookError {
    /// Build a launch error for `tool`.
    pub fn launch(tool: impl Into<String>, source: io::Error) -> Self {
        AirhookError::Launch {
            tool: tool.into(),
            source,
        }
    }

    /// Environment errors abort the whole run; everything else is scoped to one target.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AirhookError::ToolMissing(_)
                | AirhookError::NoInterface
                | AirhookError::PermissionDenied(_)
                | AirhookError::Config(_)
        )
    }
}

/// Result type alias for airhook operations
pub type AirhookResult<T> = Result<T, AirhookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        assert!(AirhookError::NoInterface.is_fatal());
        assert!(AirhookError::ToolMissing("aircrack-ng".into()).is_fatal());
        assert!(!AirhookError::Cancelled.is_fatal());
        assert!(!AirhookError::ProcessUnresponsive("airodump-ng".into()).is_fatal());
    }

    #[test]
    fn launch_error_names_tool() {
        let err = AirhookError::launch(
            "aireplay-ng",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert!(err.to_string().contains("aireplay-ng"));
    }
}
