//! Scripted `ToolRunner` for tests
//!
//! Handlers are registered per program name. Every call is recorded, and
//! every `terminate` on a spawned process is counted.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{AirhookError, AirhookResult};
use crate::traits::{RunningTool, ToolCommand, ToolOutput, ToolRunner};

type RunFn = Box<dyn Fn(&ToolCommand) -> AirhookResult<ToolOutput> + Send + Sync>;
type SpawnFn = Box<dyn Fn(&ToolCommand) + Send + Sync>;
type LaunchFn = Box<dyn Fn(&ToolCommand) -> AirhookResult<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Run,
    Spawn,
    Launch,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub kind: CallKind,
    pub cmd: ToolCommand,
}

#[derive(Default)]
pub struct ScriptedRunner {
    run: HashMap<String, RunFn>,
    spawn: HashMap<String, SpawnFn>,
    launch: HashMap<String, LaunchFn>,
    stubborn: HashSet<String>,
    broken: HashSet<String>,
    unavailable: HashSet<String>,
    calls: Mutex<Vec<Call>>,
    terminations: Arc<AtomicUsize>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_run<F>(mut self, program: &str, f: F) -> Self
    where
        F: Fn(&ToolCommand) -> AirhookResult<ToolOutput> + Send + Sync + 'static,
    {
        self.run.insert(program.to_string(), Box::new(f));
        self
    }

    /// Side effect executed when `program` is spawned (e.g. write its artifact).
    pub fn on_spawn<F>(mut self, program: &str, f: F) -> Self
    where
        F: Fn(&ToolCommand) + Send + Sync + 'static,
    {
        self.spawn.insert(program.to_string(), Box::new(f));
        self
    }

    pub fn on_launch<F>(mut self, program: &str, f: F) -> Self
    where
        F: Fn(&ToolCommand) -> AirhookResult<()> + Send + Sync + 'static,
    {
        self.launch.insert(program.to_string(), Box::new(f));
        self
    }

    /// Spawned instances of `program` ignore termination requests.
    pub fn stubborn(mut self, program: &str) -> Self {
        self.stubborn.insert(program.to_string());
        self
    }

    /// Every invocation of `program` fails to launch.
    pub fn broken(mut self, program: &str) -> Self {
        self.broken.insert(program.to_string());
        self
    }

    pub fn unavailable(mut self, program: &str) -> Self {
        self.unavailable.insert(program.to_string());
        self
    }

    fn record(&self, kind: CallKind, cmd: &ToolCommand) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Call {
                kind,
                cmd: cmd.clone(),
            });
    }

    fn launch_error(cmd: &ToolCommand) -> AirhookError {
        AirhookError::launch(
            &cmd.program,
            std::io::Error::new(std::io::ErrorKind::NotFound, "scripted failure"),
        )
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn of(&self, kind: CallKind, program: &str) -> Vec<ToolCommand> {
        self.calls()
            .into_iter()
            .filter(|c| c.kind == kind && c.cmd.program == program)
            .map(|c| c.cmd)
            .collect()
    }

    pub fn runs_of(&self, program: &str) -> Vec<ToolCommand> {
        self.of(CallKind::Run, program)
    }

    pub fn spawns_of(&self, program: &str) -> Vec<ToolCommand> {
        self.of(CallKind::Spawn, program)
    }

    pub fn launches_of(&self, program: &str) -> Vec<ToolCommand> {
        self.of(CallKind::Launch, program)
    }

    /// Number of `terminate` calls across all spawned processes.
    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(&self, cmd: &ToolCommand) -> AirhookResult<ToolOutput> {
        self.record(CallKind::Run, cmd);
        if self.broken.contains(&cmd.program) {
            return Err(Self::launch_error(cmd));
        }
        match self.run.get(&cmd.program) {
            Some(f) => f(cmd),
            None => Ok(ToolOutput {
                success: true,
                ..ToolOutput::default()
            }),
        }
    }

    async fn spawn(&self, cmd: &ToolCommand) -> AirhookResult<Box<dyn RunningTool>> {
        self.record(CallKind::Spawn, cmd);
        if self.broken.contains(&cmd.program) {
            return Err(Self::launch_error(cmd));
        }
        if let Some(f) = self.spawn.get(&cmd.program) {
            f(cmd);
        }
        Ok(Box::new(ScriptedProcess {
            label: cmd.program.clone(),
            stubborn: self.stubborn.contains(&cmd.program),
            terminations: Arc::clone(&self.terminations),
        }))
    }

    fn launch_detached(&self, cmd: &ToolCommand) -> AirhookResult<()> {
        self.record(CallKind::Launch, cmd);
        if self.broken.contains(&cmd.program) {
            return Err(Self::launch_error(cmd));
        }
        match self.launch.get(&cmd.program) {
            Some(f) => f(cmd),
            None => Ok(()),
        }
    }

    fn is_available(&self, program: &str) -> bool {
        !self.unavailable.contains(program)
    }
}

struct ScriptedProcess {
    label: String,
    stubborn: bool,
    terminations: Arc<AtomicUsize>,
}

#[async_trait]
impl RunningTool for ScriptedProcess {
    fn describe(&self) -> String {
        format!("{} (scripted)", self.label)
    }

    async fn terminate(&mut self, _grace: Duration) -> AirhookResult<()> {
        self.terminations.fetch_add(1, Ordering::SeqCst);
        if self.stubborn {
            Err(AirhookError::ProcessUnresponsive(self.label.clone()))
        } else {
            Ok(())
        }
    }
}
