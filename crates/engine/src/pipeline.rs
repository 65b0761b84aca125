//! Engine - drives every selected target from discovery to recovery

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use airhook_common::{
    sanitize_name, AccessPoint, AirhookError, AirhookResult, Client, EngineContext, Passphrase,
};

use crate::capture::{CaptureObserver, CaptureSupervisor, SilentObserver};
use crate::deauth::{deauthenticate, DeauthReport};
use crate::discovery::discover_clients;
use crate::progress::{RunSummary, TargetOutcome, TargetReport};
use crate::recovery::RecoveryEngine;
use crate::validator::HandshakeValidator;

/// One selected target and, if the user chose to reuse one, its stored handshake.
#[derive(Debug, Clone)]
pub struct PlannedTarget {
    pub target: AccessPoint,
    pub reuse: Option<PathBuf>,
}

impl PlannedTarget {
    pub fn capture(target: AccessPoint) -> Self {
        Self { target, reuse: None }
    }

    pub fn reuse(target: AccessPoint, capture: PathBuf) -> Self {
        Self {
            target,
            reuse: Some(capture),
        }
    }
}

/// Owns the run context and the components that borrow it.
pub struct Engine {
    ctx: EngineContext,
    capture: CaptureSupervisor,
    recovery: RecoveryEngine,
    observer: Arc<dyn CaptureObserver>,
}

impl Engine {
    /// Build an engine, seeding the prior-passphrase cache from the results store.
    pub async fn new(ctx: EngineContext) -> Self {
        let validator = HandshakeValidator::new(Arc::clone(&ctx.runner));
        let recovery = RecoveryEngine::load(Arc::clone(&ctx.runner), ctx.results_file.clone()).await;
        Self {
            capture: CaptureSupervisor::new(validator),
            recovery,
            observer: Arc::new(SilentObserver),
            ctx,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn CaptureObserver>) -> Self {
        self.capture = self.capture.with_observer(Arc::clone(&observer));
        self.observer = observer;
        self
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn recovery(&self) -> &RecoveryEngine {
        &self.recovery
    }

    pub async fn discover_clients(&self, target: &AccessPoint) -> Vec<Client> {
        discover_clients(&self.ctx, target).await
    }

    pub async fn deauthenticate(&self, target: &AccessPoint, clients: &[Client]) -> DeauthReport {
        deauthenticate(&self.ctx, target, clients).await
    }

    pub async fn capture_handshake(&self, target: &AccessPoint) -> AirhookResult<Option<PathBuf>> {
        self.capture.capture_handshake(&self.ctx, target).await
    }

    pub async fn crack_password(
        &self,
        capture: &Path,
        dictionary: &Path,
        target: &AccessPoint,
    ) -> AirhookResult<Option<Passphrase>> {
        self.recovery.crack_password(capture, dictionary, target).await
    }

    /// Stored handshake for a network with this name, if one exists.
    pub fn existing_capture(&self, target: &AccessPoint) -> Option<PathBuf> {
        let path = self
            .ctx
            .handshake_dir
            .join(format!("{}.cap", sanitize_name(target.display_name())));
        path.is_file().then_some(path)
    }

    /// Discovery, deauthentication and capture for one target.
    #[instrument(skip(self, target), fields(bssid = %target.bssid))]
    pub async fn acquire(&self, target: &AccessPoint) -> AirhookResult<Result<PathBuf, TargetOutcome>> {
        let clients = self.discover_clients(target).await;
        if clients.is_empty() {
            return Ok(Err(TargetOutcome::NoClients));
        }
        if self.ctx.interrupt.is_triggered() {
            return Ok(Err(TargetOutcome::Skipped));
        }

        self.deauthenticate(target, &clients).await;

        match self.capture_handshake(target).await {
            Ok(Some(path)) => Ok(Ok(path)),
            Ok(None) => Ok(Err(TargetOutcome::NoHandshake)),
            Err(AirhookError::Cancelled) => Ok(Err(TargetOutcome::Skipped)),
            Err(e) => Err(e),
        }
    }

    /// Process every target: capture phase first, then one dictionary attack
    /// per captured handshake. A failing target never stops the others; an
    /// interrupt stops new targets from starting.
    pub async fn run(&self, plan: Vec<PlannedTarget>, dictionary: &Path) -> RunSummary {
        let mut summary = RunSummary::new(plan.len());
        let mut captured = Vec::new();

        for (i, planned) in plan.into_iter().enumerate() {
            let target = planned.target;
            if self.ctx.interrupt.is_triggered() {
                summary.interrupted = true;
                summary.record(TargetReport {
                    target,
                    capture: None,
                    outcome: TargetOutcome::Skipped,
                });
                continue;
            }
            info!(
                "[Processing Target {}/{}] {} ({})",
                i + 1,
                summary.total,
                target.display_name(),
                target.bssid
            );

            if let Some(path) = planned.reuse {
                info!("Using existing handshake file: {}", path.display());
                captured.push((target, path));
                continue;
            }

            match self.acquire(&target).await {
                Ok(Ok(path)) => captured.push((target, path)),
                Ok(Err(outcome)) => {
                    warn!(
                        "Failed to capture handshake for {} ({}). Skipping to next target.",
                        target.display_name(),
                        outcome.label()
                    );
                    summary.record(TargetReport {
                        target,
                        capture: None,
                        outcome,
                    });
                }
                Err(e) => {
                    error!("Target {} failed: {}", target.display_name(), e);
                    summary.record(TargetReport {
                        target,
                        capture: None,
                        outcome: TargetOutcome::Error {
                            message: e.to_string(),
                        },
                    });
                }
            }
        }

        if captured.is_empty() {
            warn!("No handshakes captured for cracking.");
        }

        let cracking = captured.len();
        for (i, (target, path)) in captured.into_iter().enumerate() {
            if self.ctx.interrupt.is_triggered() {
                summary.interrupted = true;
                summary.record(TargetReport {
                    target,
                    capture: Some(path),
                    outcome: TargetOutcome::Skipped,
                });
                continue;
            }
            info!(
                "[Cracking Target {}/{}] {} ({})",
                i + 1,
                cracking,
                target.display_name(),
                target.bssid
            );
            self.observer.on_cracking(&target, true);
            let recovered = self.recovery.recover(&path, dictionary, &target).await;
            self.observer.on_cracking(&target, false);
            let outcome = match recovered {
                Ok(Some(result)) => TargetOutcome::Cracked { result },
                Ok(None) => TargetOutcome::NotInDictionary,
                Err(e) => {
                    error!("Cracking {} failed: {}", target.display_name(), e);
                    TargetOutcome::Error {
                        message: e.to_string(),
                    }
                }
            };
            summary.record(TargetReport {
                target,
                capture: Some(path),
                outcome,
            });
        }

        summary.interrupted |= self.ctx.interrupt.is_triggered();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dictionary_aircrack, fast_options, target, write_cap, write_csv, SCAN};
    use airhook_common::testing::ScriptedRunner;
    use airhook_common::{Interrupt, MacAddr};

    const WORDLIST: &str = "password\n12345678\nqwerty123\nadmin123\nhunter2!\n";

    async fn engine(runner: &Arc<ScriptedRunner>, dir: &Path) -> Engine {
        let ctx = EngineContext::new(runner.clone(), "wlan0mon", dir.join("work"))
            .with_handshake_dir(dir.join("handshakes"))
            .with_results_file(dir.join("cracked.txt"))
            .with_options(fast_options());
        std::fs::create_dir_all(dir.join("work")).unwrap();
        Engine::new(ctx).await
    }

    fn wordlist(dir: &Path) -> PathBuf {
        let path = dir.join("words.txt");
        std::fs::write(&path, WORDLIST).unwrap();
        path
    }

    #[tokio::test]
    async fn full_pipeline_cracks_target() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(
            ScriptedRunner::new()
                .on_spawn("airodump-ng", write_cap())
                .on_run("aircrack-ng", dictionary_aircrack("hunter2!")),
        );
        let engine = engine(&runner, dir.path()).await;

        let summary = engine
            .run(vec![PlannedTarget::capture(target())], &wordlist(dir.path()))
            .await;
        assert_eq!(summary.cracked().count(), 1);
        assert_eq!(
            summary.reports[0].capture.as_deref(),
            Some(dir.path().join("handshakes/HomeNet.cap").as_path())
        );
        // One client-discovery capture and one handshake capture.
        assert_eq!(runner.spawns_of("airodump-ng").len(), 2);
        assert_eq!(runner.launches_of("aireplay-ng").len(), 3);
        assert!(engine.existing_capture(&target()).is_some());
    }

    #[tokio::test]
    async fn no_clients_skips_deauth_and_capture() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let engine = engine(&runner, dir.path()).await;

        let summary = engine
            .run(vec![PlannedTarget::capture(target())], &wordlist(dir.path()))
            .await;
        assert!(matches!(summary.reports[0].outcome, TargetOutcome::NoClients));
        assert!(runner.launches_of("aireplay-ng").is_empty());
        assert_eq!(runner.spawns_of("airodump-ng").len(), 1);
    }

    #[tokio::test]
    async fn failing_target_does_not_stop_the_next() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(
            ScriptedRunner::new()
                .on_spawn("airodump-ng", write_csv(SCAN))
                .stubborn("airodump-ng")
                .on_run("aircrack-ng", dictionary_aircrack("hunter2!")),
        );
        let engine = engine(&runner, dir.path()).await;

        let stored = dir.path().join("handshakes");
        std::fs::create_dir_all(&stored).unwrap();
        std::fs::write(stored.join("Cafe.cap"), b"pcap").unwrap();
        let cafe = AccessPoint::new(MacAddr([0x10, 0, 0, 0, 0, 1]), 11, -70, "WPA2 CCMP")
            .with_essid("Cafe");

        let plan = vec![
            PlannedTarget::capture(target()),
            PlannedTarget::reuse(cafe.clone(), stored.join("Cafe.cap")),
        ];
        let summary = engine.run(plan, &wordlist(dir.path())).await;

        assert_eq!(summary.reports.len(), 2);
        assert!(matches!(summary.reports[0].outcome, TargetOutcome::Error { .. }));
        assert!(matches!(summary.reports[1].outcome, TargetOutcome::Cracked { .. }));
        assert_eq!(summary.reports[1].target.bssid, cafe.bssid);
    }

    #[tokio::test]
    async fn interrupt_stops_new_targets() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let interrupt = Interrupt::new();
        let ctx = EngineContext::new(runner.clone(), "wlan0mon", dir.path())
            .with_results_file(dir.path().join("cracked.txt"))
            .with_options(fast_options())
            .with_interrupt(interrupt.clone());
        let engine = Engine::new(ctx).await;
        interrupt.trigger();

        let summary = engine
            .run(
                vec![PlannedTarget::capture(target()), PlannedTarget::capture(target())],
                &wordlist(dir.path()),
            )
            .await;
        assert!(summary.interrupted);
        assert!(summary
            .reports
            .iter()
            .all(|r| matches!(r.outcome, TargetOutcome::Skipped)));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn interrupt_during_capture_skips_target() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(
            ScriptedRunner::new()
                .on_spawn("airodump-ng", write_csv(SCAN))
                .on_run("aircrack-ng", dictionary_aircrack("hunter2!")),
        );
        let interrupt = Interrupt::new();
        let mut options = fast_options();
        options.capture_timeout = std::time::Duration::from_secs(30);
        let ctx = EngineContext::new(runner.clone(), "wlan0mon", dir.path())
            .with_handshake_dir(dir.path().join("handshakes"))
            .with_results_file(dir.path().join("cracked.txt"))
            .with_options(options)
            .with_interrupt(interrupt.clone());
        let engine = Engine::new(ctx).await;

        let trigger = interrupt.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(150)).await;
            trigger.trigger();
        });

        let summary = engine
            .run(vec![PlannedTarget::capture(target())], &wordlist(dir.path()))
            .await;
        assert!(summary.interrupted);
        assert!(matches!(summary.reports[0].outcome, TargetOutcome::Skipped));
        assert_eq!(runner.spawns_of("airodump-ng").len(), 2);
        assert_eq!(runner.terminations(), 2);
    }

    #[tokio::test]
    async fn reused_capture_goes_straight_to_recovery() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new().on_run("aircrack-ng", dictionary_aircrack("nope")));
        let engine = engine(&runner, dir.path()).await;
        let cap = dir.path().join("HomeNet.cap");
        std::fs::write(&cap, b"pcap").unwrap();

        let summary = engine
            .run(vec![PlannedTarget::reuse(target(), cap)], &wordlist(dir.path()))
            .await;
        assert!(matches!(summary.reports[0].outcome, TargetOutcome::NotInDictionary));
        assert!(runner.spawns_of("airodump-ng").is_empty());
    }
}
