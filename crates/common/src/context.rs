//! Per-run engine context
//!
//! Owned by the shell for the whole multi-target run and borrowed by every
//! component for the duration of one call.

use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::AirhookResult;
use crate::signal::Interrupt;
use crate::traits::{ToolCommand, ToolRunner};
use crate::types::EngineOptions;

pub struct EngineContext {
    pub runner: Arc<dyn ToolRunner>,
    /// Monitor-mode interface name.
    pub interface: String,
    /// Scratch directory for scan and capture artifacts.
    pub work_dir: PathBuf,
    /// Permanent, append-only handshake storage.
    pub handshake_dir: PathBuf,
    /// Append-only results store.
    pub results_file: PathBuf,
    pub options: EngineOptions,
    pub interrupt: Interrupt,
    seq: AtomicU64,
}

impl EngineContext {
    pub fn new(
        runner: Arc<dyn ToolRunner>,
        interface: impl Into<String>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            interface: interface.into(),
            work_dir: work_dir.into(),
            handshake_dir: PathBuf::from("handshakes"),
            results_file: PathBuf::from("cracked.txt"),
            options: EngineOptions::default(),
            interrupt: Interrupt::new(),
            seq: AtomicU64::new(0),
        }
    }

    pub fn with_handshake_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.handshake_dir = dir.into();
        self
    }

    pub fn with_results_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.results_file = file.into();
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Fresh artifact prefix in the work dir: `<stem>_<timestamp>-<seq>`.
    pub fn unique_prefix(&self, stem: &str) -> PathBuf {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let stamp = Local::now().format("%Y%m%d-%H%M%S-%3f");
        self.work_dir.join(format!("{stem}_{stamp}-{seq}"))
    }

    /// Run `cmd` in the background for `window`, then stop it.
    ///
    /// Returns `true` if the wait was cut short by the interrupt. The process
    /// is terminated on every path once it has been started.
    pub async fn observe(&self, cmd: &ToolCommand, window: std::time::Duration) -> AirhookResult<bool> {
        let mut process = self.runner.spawn(cmd).await?;
        let interrupted = self.interrupt.sleep(window).await;
        if let Err(e) = process.terminate(self.options.terminate_grace).await {
            warn!("{}: {}", process.describe(), e);
        }
        Ok(interrupted)
    }
}

/// airodump-ng appends `-01.<ext>` to the `--write` prefix.
pub fn airodump_artifact(prefix: &Path, ext: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(format!("-01.{ext}"));
    PathBuf::from(name)
}

/// Remove every `<prefix>-01.*` file airodump-ng left behind.
pub async fn remove_artifacts(prefix: &Path) -> usize {
    let (Some(dir), Some(stem)) = (prefix.parent(), prefix.file_name()) else {
        return 0;
    };
    let mut marker = stem.to_os_string();
    marker.push("-01.");
    let marker = marker.to_string_lossy().into_owned();

    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return 0;
    };
    let mut removed = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        if !entry.file_name().to_string_lossy().starts_with(&marker) {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => debug!("Could not remove {}: {}", entry.path().display(), e),
        }
    }
    removed
}
