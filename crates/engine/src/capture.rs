//! Handshake capture supervisor
//!
//! A session walks `Starting -> Capturing -> {Found | TimedOut | Cancelled}
//! -> Finalizing -> {Saved | Failed}`. While capturing, a watcher task polls
//! the capture artifact through the validator and a foreground loop tracks
//! the deadline and the user interrupt. The capture process is terminated in
//! `Finalizing` on every path once it has been launched.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use airhook_common::{
    airodump_artifact, remove_artifacts, sanitize_name, AccessPoint, AirhookError, AirhookResult,
    CaptureState, EngineContext, HandshakeLatch, Interrupt, MacAddr, ToolCommand,
};

use crate::validator::HandshakeValidator;

/// Receives capture progress, e.g. to drive a countdown display.
pub trait CaptureObserver: Send + Sync {
    fn on_state(&self, _target: &AccessPoint, _state: CaptureState) {}

    fn on_tick(&self, _target: &AccessPoint, _elapsed: Duration, _remaining: Duration) {}

    /// `true` right before a dictionary attack on `target` starts, `false` once it ends.
    fn on_cracking(&self, _target: &AccessPoint, _running: bool) {}
}

/// Observer that ignores everything.
pub struct SilentObserver;

impl CaptureObserver for SilentObserver {}

/// BSSIDs with a capture in flight. At most one session per access point.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    active: Arc<Mutex<HashSet<MacAddr>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire(&self, bssid: MacAddr) -> AirhookResult<SessionGuard> {
        if !self.active.lock().insert(bssid) {
            return Err(AirhookError::SessionActive(bssid.to_string()));
        }
        Ok(SessionGuard {
            registry: self.clone(),
            bssid,
        })
    }

    pub fn is_active(&self, bssid: MacAddr) -> bool {
        self.active.lock().contains(&bssid)
    }
}

struct SessionGuard {
    registry: SessionRegistry,
    bssid: MacAddr,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.active.lock().remove(&self.bssid);
    }
}

/// How a capture session ended.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureReport {
    pub session: Uuid,
    pub bssid: MacAddr,
    pub network: String,
    /// Every state the session entered, in order.
    pub history: Vec<CaptureState>,
    /// Permanent handshake path when the session ended `Saved`.
    pub saved: Option<PathBuf>,
    pub elapsed: Duration,
}

impl CaptureReport {
    /// The state that ended the capturing phase.
    pub fn trigger(&self) -> Option<CaptureState> {
        self.history.iter().copied().find(CaptureState::is_trigger)
    }

    pub fn final_state(&self) -> Option<CaptureState> {
        self.history.last().copied()
    }
}

struct CaptureSession<'a> {
    id: Uuid,
    target: &'a AccessPoint,
    prefix: PathBuf,
    started: Instant,
    history: Vec<CaptureState>,
    observer: &'a dyn CaptureObserver,
}

impl<'a> CaptureSession<'a> {
    fn enter(&mut self, state: CaptureState) {
        debug!(session = %self.id, "capture state -> {}", state);
        self.history.push(state);
        self.observer.on_state(self.target, state);
    }

    fn artifact(&self) -> PathBuf {
        airodump_artifact(&self.prefix, "cap")
    }

    fn into_report(self, saved: Option<PathBuf>) -> CaptureReport {
        CaptureReport {
            session: self.id,
            bssid: self.target.bssid,
            network: self.target.display_name().to_string(),
            history: self.history,
            saved,
            elapsed: self.started.elapsed(),
        }
    }
}

/// Runs capture sessions against one shared registry.
#[derive(Clone)]
pub struct CaptureSupervisor {
    validator: HandshakeValidator,
    sessions: SessionRegistry,
    observer: Arc<dyn CaptureObserver>,
}

impl CaptureSupervisor {
    pub fn new(validator: HandshakeValidator) -> Self {
        Self {
            validator,
            sessions: SessionRegistry::new(),
            observer: Arc::new(SilentObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn CaptureObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Capture and keep a handshake for `target`. `None` means nothing usable
    /// was captured, which is an expected outcome.
    ///
    /// A session cancelled by the interrupt is finalized and cleaned up first,
    /// then reported as `Cancelled` unless a handshake was saved anyway.
    pub async fn capture_handshake(
        &self,
        ctx: &EngineContext,
        target: &AccessPoint,
    ) -> AirhookResult<Option<PathBuf>> {
        let report = self.run(ctx, target).await?;
        match report.saved {
            None if report.trigger() == Some(CaptureState::Cancelled) => {
                Err(AirhookError::Cancelled)
            }
            saved => Ok(saved),
        }
    }

    /// Run one full session and report how it went.
    ///
    /// Errors: `SessionActive` if `target` already has a session,
    /// `Launch` if airodump-ng cannot start, `ProcessUnresponsive` if it
    /// ignored the stop request, `Io` if the handshake could not be stored.
    #[instrument(skip(self, ctx, target), fields(bssid = %target.bssid))]
    pub async fn run(&self, ctx: &EngineContext, target: &AccessPoint) -> AirhookResult<CaptureReport> {
        let _guard = self.sessions.acquire(target.bssid)?;
        let safe_name = sanitize_name(target.display_name());

        let mut session = CaptureSession {
            id: Uuid::new_v4(),
            target,
            prefix: ctx.unique_prefix(&safe_name),
            started: Instant::now(),
            history: Vec::new(),
            observer: self.observer.as_ref(),
        };
        session.enter(CaptureState::Starting);
        info!("Starting handshake capture for {}...", target.display_name());

        let cmd = ToolCommand::new("airodump-ng")
            .args(["--bssid", &target.bssid.to_string()])
            .args(["--channel", &target.channel.to_string()])
            .arg("--write")
            .path_arg(&session.prefix)
            .arg(ctx.interface.as_str());
        let mut process = match ctx.runner.spawn(&cmd).await {
            Ok(p) => p,
            Err(e) => {
                session.enter(CaptureState::Failed);
                return Err(e);
            }
        };

        let latch = HandshakeLatch::new();
        let stop = Interrupt::new();
        session.enter(CaptureState::Capturing);
        let watcher = spawn_watcher(
            self.validator.clone(),
            session.artifact(),
            latch.clone(),
            stop.clone(),
            ctx.options.poll_interval,
        );

        let trigger = self.wait_for_trigger(ctx, target, &latch).await;
        session.enter(trigger);
        match trigger {
            CaptureState::Found => info!("Handshake detected!"),
            CaptureState::TimedOut => warn!(
                "Handshake capture timed out after {}s",
                ctx.options.capture_timeout.as_secs()
            ),
            _ => warn!("Capture cancelled by user"),
        }

        stop.trigger();
        session.enter(CaptureState::Finalizing);
        let terminated = process.terminate(ctx.options.terminate_grace).await;
        join_watcher(watcher, ctx.options.terminate_grace).await;

        if let Err(e) = terminated {
            error!("{}: {}", process.describe(), e);
            session.enter(CaptureState::Failed);
            remove_artifacts(&session.prefix).await;
            return Err(e);
        }

        let artifact = session.artifact();
        let saved = if self.validator.validate(&artifact).await {
            match promote(&artifact, &ctx.handshake_dir, &safe_name).await {
                Ok(path) => {
                    info!("Handshake saved to {}", path.display());
                    session.enter(CaptureState::Saved);
                    Some(path)
                }
                Err(e) => {
                    session.enter(CaptureState::Failed);
                    remove_artifacts(&session.prefix).await;
                    return Err(e);
                }
            }
        } else {
            warn!("Failed to capture handshake for {}", target.display_name());
            session.enter(CaptureState::Failed);
            None
        };

        remove_artifacts(&session.prefix).await;
        Ok(session.into_report(saved))
    }

    /// Foreground loop: report the countdown until the watcher confirms,
    /// the deadline passes or the user interrupts.
    async fn wait_for_trigger(
        &self,
        ctx: &EngineContext,
        target: &AccessPoint,
        latch: &HandshakeLatch,
    ) -> CaptureState {
        let deadline = ctx.options.capture_timeout;
        let started = Instant::now();
        loop {
            if latch.is_set() {
                return CaptureState::Found;
            }
            if ctx.interrupt.is_triggered() {
                return CaptureState::Cancelled;
            }
            let elapsed = started.elapsed();
            if elapsed >= deadline {
                return CaptureState::TimedOut;
            }
            let remaining = deadline - elapsed;
            self.observer.on_tick(target, elapsed, remaining);
            ctx.interrupt
                .sleep(ctx.options.poll_interval.min(remaining))
                .await;
        }
    }
}

fn spawn_watcher(
    validator: HandshakeValidator,
    artifact: PathBuf,
    latch: HandshakeLatch,
    stop: Interrupt,
    poll: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while !latch.is_set() && !stop.is_triggered() {
            if validator.validate(&artifact).await {
                if latch.confirm() {
                    debug!("watcher confirmed handshake in {}", artifact.display());
                }
                return;
            }
            if stop.sleep(poll).await {
                return;
            }
        }
    })
}

async fn join_watcher(mut watcher: JoinHandle<()>, grace: Duration) {
    match tokio::time::timeout(grace, &mut watcher).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Handshake watcher ended abnormally: {}", e),
        Err(_) => {
            warn!("Handshake watcher did not stop in time, aborting it");
            watcher.abort();
        }
    }
}

/// Copy the capture into permanent storage as `<dir>/<name>.cap`.
async fn promote(artifact: &Path, dir: &Path, name: &str) -> AirhookResult<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let dest = dir.join(format!("{name}.cap"));
    tokio::fs::copy(artifact, &dest).await?;
    Ok(dest)
}
