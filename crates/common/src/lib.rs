//! Airhook Common - Shared types and traits
//!
//! This crate provides the data model, error taxonomy, shared flags and
//! tool-runner traits used across the airhook workspace.

pub mod context;
pub mod error;
pub mod signal;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use context::{airodump_artifact, remove_artifacts, EngineContext};
pub use error::{AirhookError, AirhookResult};
pub use signal::{HandshakeLatch, Interrupt};
pub use traits::{RunningTool, ToolCommand, ToolOutput, ToolRunner};
pub use types::{
    sanitize_name, AccessPoint, CaptureState, Client, EngineOptions, MacAddr, Passphrase,
    RecoveryResult, HIDDEN_SSID,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// External programs every full run depends on.
pub const REQUIRED_TOOLS: [&str; 4] = ["airmon-ng", "airodump-ng", "aireplay-ng", "aircrack-ng"];
