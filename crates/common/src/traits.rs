//! Seams between the engine and the external tool processes
//!
//! Every airodump/aireplay/aircrack invocation goes through `ToolRunner`,
//! which lets the engine run against real processes in production and a
//! scripted runner in tests.

use crate::error::AirhookResult;
use async_trait::async_trait;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// A single external command: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl ToolCommand {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.as_os_str().to_os_string())
    }

    /// Value following `flag`, if present.
    #[must_use]
    pub fn flag_value(&self, flag: &str) -> Option<&OsString> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
    }

    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a command run to completion.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Launches external tools.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run to completion and capture output.
    async fn run(&self, cmd: &ToolCommand) -> AirhookResult<ToolOutput>;

    /// Start a supervised background process. The caller owns its termination.
    async fn spawn(&self, cmd: &ToolCommand) -> AirhookResult<Box<dyn RunningTool>>;

    /// Start a process and forget about it (frame injection bursts).
    fn launch_detached(&self, cmd: &ToolCommand) -> AirhookResult<()>;

    /// Whether `program` can be found on this system.
    fn is_available(&self, program: &str) -> bool;
}

/// Handle to a supervised background process.
#[async_trait]
pub trait RunningTool: Send {
    fn describe(&self) -> String;

    /// Ask the process to stop and wait at most `grace` for it to exit.
    ///
    /// A process still alive after `grace` is force-killed and reported as
    /// `AirhookError::ProcessUnresponsive`.
    async fn terminate(&mut self, grace: Duration) -> AirhookResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_builder_and_lookup() {
        let cmd = ToolCommand::new("airodump-ng")
            .args(["--bssid", "00:11:22:33:44:55"])
            .arg("--write")
            .path_arg(Path::new("/tmp/cap"))
            .arg("wlan0mon");
        assert_eq!(
            cmd.flag_value("--write").map(|v| v.to_string_lossy().into_owned()),
            Some("/tmp/cap".to_string())
        );
        assert!(cmd.has_flag("--bssid"));
        assert!(!cmd.has_flag("--channel"));
        assert_eq!(
            cmd.to_string(),
            "airodump-ng --bssid 00:11:22:33:44:55 --write /tmp/cap wlan0mon"
        );
    }
}
