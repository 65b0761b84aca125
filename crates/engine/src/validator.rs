//! Handshake validator - asks aircrack-ng whether a capture holds a handshake

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use airhook_common::{ToolCommand, ToolRunner};

/// "1 handshake" as a whole count, so "11 handshake" or "21 handshake" do not match.
static ONE_HANDSHAKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^0-9])1 handshake").expect("static regex"));

/// Whether aircrack-ng output reports exactly one handshake.
pub fn reports_single_handshake(output: &str) -> bool {
    ONE_HANDSHAKE.is_match(output)
}

#[derive(Clone)]
pub struct HandshakeValidator {
    runner: Arc<dyn ToolRunner>,
}

impl HandshakeValidator {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }

    /// `true` when the capture at `path` holds one complete handshake.
    ///
    /// Never fails: a missing file or a tool that will not run both read as
    /// "not captured yet". Calling it again on an unchanged file gives the
    /// same answer.
    pub async fn validate(&self, path: &Path) -> bool {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return false;
        }

        let cmd = ToolCommand::new("aircrack-ng").path_arg(path);
        match self.runner.run(&cmd).await {
            Ok(out) => reports_single_handshake(&out.stdout) || reports_single_handshake(&out.stderr),
            Err(e) => {
                debug!("Handshake check on {} failed: {}", path.display(), e);
                false
            }
        }
    }
}
