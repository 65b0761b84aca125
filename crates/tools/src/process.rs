// crates/tools/src/process.rs
//! Process-backed `ToolRunner`
//!
//! Supervised processes and `run` invocations are spawned with `kill_on_drop`,
//! so a handle or future dropped on an unexpected path (an aborted task, a
//! timeout) still takes its process down with it.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, instrument, warn};

use airhook_common::{
    AirhookError, AirhookResult, RunningTool, ToolCommand, ToolOutput, ToolRunner,
};

use crate::deps::which;

/// Runs tools as real OS processes.
#[derive(Debug, Clone, Default)]
pub struct SystemToolRunner;

impl SystemToolRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(cmd: &ToolCommand) -> Command {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args).stdin(Stdio::null());
        command
    }
}

#[async_trait]
impl ToolRunner for SystemToolRunner {
    #[instrument(skip(self, cmd), fields(cmd = %cmd))]
    async fn run(&self, cmd: &ToolCommand) -> AirhookResult<ToolOutput> {
        let output = Self::command(cmd)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AirhookError::launch(&cmd.program, e))?;

        Ok(ToolOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn spawn(&self, cmd: &ToolCommand) -> AirhookResult<Box<dyn RunningTool>> {
        let child = Self::command(cmd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AirhookError::launch(&cmd.program, e))?;

        debug!("spawned {} (pid {:?})", cmd.program, child.id());
        Ok(Box::new(ChildProcess {
            child,
            label: cmd.program.clone(),
        }))
    }

    fn launch_detached(&self, cmd: &ToolCommand) -> AirhookResult<()> {
        // The runtime reaps the child once it exits.
        Self::command(cmd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
            .map_err(|e| AirhookError::launch(&cmd.program, e))
    }

    fn is_available(&self, program: &str) -> bool {
        which(program).is_some()
    }
}

/// A supervised child process.
pub struct ChildProcess {
    child: Child,
    label: String,
}

impl ChildProcess {
    fn request_stop(&mut self) {
        #[cfg(unix)]
        {
            if let Some(pid) = self.child.id() {
                // SAFETY: plain kill(2) on a pid we spawned and have not reaped yet.
                let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
                if rc != 0 {
                    debug!(
                        "SIGTERM to {} failed: {}",
                        self.label,
                        std::io::Error::last_os_error()
                    );
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = self.child.start_kill();
        }
    }
}

#[async_trait]
impl RunningTool for ChildProcess {
    fn describe(&self) -> String {
        match self.child.id() {
            Some(pid) => format!("{} (pid {})", self.label, pid),
            None => self.label.clone(),
        }
    }

    async fn terminate(&mut self, grace: Duration) -> AirhookResult<()> {
        self.request_stop();

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!("{} exited with {}", self.label, status);
                Ok(())
            }
            Ok(Err(e)) => Err(AirhookError::Io(e)),
            Err(_) => {
                warn!("{} ignored SIGTERM for {:?}, killing", self.label, grace);
                let _ = self.child.start_kill();
                let _ = self.child.wait().await;
                Err(AirhookError::ProcessUnresponsive(self.label.clone()))
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_captures_stdout() {
        let runner = SystemToolRunner::new();
        let out = runner
            .run(&ToolCommand::new("sh").args(["-c", "echo 1 handshake"]))
            .await
            .unwrap();
        assert!(out.success);
        assert_eq!(out.stdout.trim(), "1 handshake");
    }

    #[tokio::test]
    async fn missing_program_is_launch_error() {
        let runner = SystemToolRunner::new();
        let err = runner
            .run(&ToolCommand::new("definitely-not-a-real-tool-xyz"))
            .await
            .unwrap_err();
        assert!(matches!(err, AirhookError::Launch { .. }));
        assert!(runner
            .launch_detached(&ToolCommand::new("definitely-not-a-real-tool-xyz"))
            .is_err());
    }

    #[tokio::test]
    async fn terminate_stops_cooperative_process() {
        let runner = SystemToolRunner::new();
        let mut proc = runner
            .spawn(&ToolCommand::new("sleep").arg("30"))
            .await
            .unwrap();
        proc.terminate(Duration::from_secs(5)).await.unwrap();
    }

    #[tokio::test]
    async fn terminate_reports_process_ignoring_sigterm() {
        let runner = SystemToolRunner::new();
        let mut proc = runner
            .spawn(&ToolCommand::new("sh").args(["-c", "trap '' TERM; sleep 30"]))
            .await
            .unwrap();
        // Give the shell time to install the trap.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let err = proc.terminate(Duration::from_millis(200)).await.unwrap_err();
        assert!(matches!(err, AirhookError::ProcessUnresponsive(_)));
    }

    /// `/proc/<pid>/stat` exists and the process is not a zombie.
    #[cfg(target_os = "linux")]
    fn alive(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .map(|rest| rest.trim_start().chars().next() != Some('Z'))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    async fn read_pid(path: &std::path::Path) -> String {
        for _ in 0..100 {
            if let Ok(pid) = std::fs::read_to_string(path) {
                if !pid.trim().is_empty() {
                    return pid.trim().to_string();
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("child never wrote its pid");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn aborted_run_kills_its_process() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let script = format!("echo $$ > {}; exec sleep 30", pid_file.display());

        let task = tokio::spawn(async move {
            SystemToolRunner::new()
                .run(&ToolCommand::new("sh").args(["-c", script.as_str()]))
                .await
        });
        let pid = read_pid(&pid_file).await;
        assert!(alive(&pid));

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        let mut gone = false;
        for _ in 0..100 {
            if !alive(&pid) {
                gone = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(gone, "pid {pid} outlived the aborted run");
    }
}
