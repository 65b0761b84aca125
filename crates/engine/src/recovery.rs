//! Password recovery engine - dictionary attacks and the results store

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use airhook_common::{
    AccessPoint, AirhookResult, MacAddr, Passphrase, RecoveryResult, ToolCommand, ToolRunner,
};

/// Note attached to results confirmed by replaying an earlier passphrase.
pub const VERIFIED_NOTE: &str = "verified from prior session";

static KEY_FOUND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"KEY FOUND!\s*\[\s*(.*?)\s*\]").expect("static regex"));

/// Extract the passphrase from aircrack-ng output.
pub fn parse_key(output: &str) -> Option<Passphrase> {
    KEY_FOUND
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| Passphrase::new(m.as_str()))
}

/// Network name to passphrase pairs from a results store, oldest first.
pub fn parse_records(content: &str) -> Vec<(String, Passphrase)> {
    let mut out = Vec::new();
    let mut network: Option<&str> = None;
    for line in content.lines() {
        if line.trim().is_empty() {
            network = None;
        } else if let Some(name) = line.strip_prefix("Network: ") {
            network = Some(name.trim());
        } else if let Some(pass) = line.strip_prefix("Password: ") {
            if let (Some(name), false) = (network, pass.is_empty()) {
                out.push((name.to_string(), Passphrase::new(pass)));
            }
        }
    }
    out
}

/// Runs aircrack-ng dictionary attacks and appends every hit to the results store.
pub struct RecoveryEngine {
    runner: Arc<dyn ToolRunner>,
    results_file: PathBuf,
    known: Mutex<HashMap<String, Passphrase>>,
}

impl RecoveryEngine {
    /// Engine with an empty prior-passphrase cache.
    pub fn new(runner: Arc<dyn ToolRunner>, results_file: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            results_file: results_file.into(),
            known: Mutex::new(HashMap::new()),
        }
    }

    /// Engine whose cache is seeded from the records already in `results_file`.
    pub async fn load(runner: Arc<dyn ToolRunner>, results_file: impl Into<PathBuf>) -> Self {
        let engine = Self::new(runner, results_file);
        match tokio::fs::read_to_string(&engine.results_file).await {
            Ok(content) => {
                let records = parse_records(&content);
                debug!("Seeding {} prior results", records.len());
                let mut known = engine.known.lock();
                for (name, pass) in records {
                    known.insert(name, pass);
                }
            }
            Err(e) => debug!(
                "No prior results at {}: {}",
                engine.results_file.display(),
                e
            ),
        }
        engine
    }

    pub fn results_file(&self) -> &Path {
        &self.results_file
    }

    /// Passphrase recovered earlier for a network with this display name.
    pub fn known_passphrase(&self, network: &str) -> Option<Passphrase> {
        self.known.lock().get(network).cloned()
    }

    pub fn remember(&self, network: &str, passphrase: Passphrase) {
        self.known.lock().insert(network.to_string(), passphrase);
    }

    /// Recover the passphrase for `target` from `capture`.
    ///
    /// Returns `Ok(None)` when the passphrase is not in the dictionary or
    /// an input file is missing. Runs without a deadline.
    pub async fn crack_password(
        &self,
        capture: &Path,
        dictionary: &Path,
        target: &AccessPoint,
    ) -> AirhookResult<Option<Passphrase>> {
        Ok(self
            .recover(capture, dictionary, target)
            .await?
            .and_then(|r| r.passphrase))
    }

    /// Like `crack_password` but returns the full persisted result.
    #[instrument(skip(self, target), fields(bssid = %target.bssid))]
    pub async fn recover(
        &self,
        capture: &Path,
        dictionary: &Path,
        target: &AccessPoint,
    ) -> AirhookResult<Option<RecoveryResult>> {
        if !exists(capture).await {
            warn!("Handshake file not found: {}", capture.display());
            return Ok(None);
        }

        let started = Instant::now();
        if let Some(result) = self.try_prior(capture, target, started).await? {
            return Ok(Some(result));
        }

        if !exists(dictionary).await {
            warn!("Wordlist not found: {}", dictionary.display());
            return Ok(None);
        }

        info!("Using wordlist: {}", dictionary.display());
        info!("Cracking passwords. Please wait, this may take a while...");
        match self.attack(capture, dictionary, target.bssid).await? {
            Some(pass) => {
                info!("Password found for {}", target.display_name());
                let result = RecoveryResult::new(target, Some(pass), started.elapsed());
                self.persist(&result).await?;
                Ok(Some(result))
            }
            None => {
                warn!("Password not found in wordlist for {}", target.display_name());
                Ok(None)
            }
        }
    }

    /// Replay a passphrase recovered earlier for the same network name as a
    /// one-entry dictionary.
    async fn try_prior(
        &self,
        capture: &Path,
        target: &AccessPoint,
        started: Instant,
    ) -> AirhookResult<Option<RecoveryResult>> {
        if target.is_hidden() {
            return Ok(None);
        }
        let Some(prior) = self.known_passphrase(target.display_name()) else {
            return Ok(None);
        };

        info!(
            "Trying passphrase from a previous session for {}",
            target.display_name()
        );
        match self.replay(capture, &prior, target.bssid).await {
            Ok(Some(pass)) if pass == prior => {
                info!("Previous passphrase still valid for {}", target.display_name());
                let result =
                    RecoveryResult::new(target, Some(pass), started.elapsed()).with_note(VERIFIED_NOTE);
                self.persist(&result).await?;
                Ok(Some(result))
            }
            Ok(_) => {
                debug!("Previous passphrase rejected, running full dictionary");
                Ok(None)
            }
            Err(e) => {
                warn!("Could not replay previous passphrase ({}), running full dictionary", e);
                Ok(None)
            }
        }
    }

    /// Attack `capture` with `prior` as the only dictionary entry.
    async fn replay(
        &self,
        capture: &Path,
        prior: &Passphrase,
        bssid: MacAddr,
    ) -> AirhookResult<Option<Passphrase>> {
        let single = tempfile::Builder::new()
            .prefix("airhook-prior-")
            .suffix(".txt")
            .tempfile()?
            .into_temp_path();
        tokio::fs::write(&single, format!("{}\n", prior.expose())).await?;
        self.attack(capture, &single, bssid).await
    }

    async fn attack(
        &self,
        capture: &Path,
        dictionary: &Path,
        bssid: MacAddr,
    ) -> AirhookResult<Option<Passphrase>> {
        let cmd = ToolCommand::new("aircrack-ng")
            .arg("-w")
            .path_arg(dictionary)
            .args(["-b", &bssid.to_string()])
            .path_arg(capture);
        let output = self.runner.run(&cmd).await?;
        Ok(parse_key(&output.stdout))
    }

    /// Append one record to the results store and update the cache.
    async fn persist(&self, result: &RecoveryResult) -> AirhookResult<()> {
        if let Some(parent) = self.results_file.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.results_file)
            .await?;
        file.write_all(result.to_record().as_bytes()).await?;
        file.flush().await?;

        if let Some(pass) = &result.passphrase {
            self.remember(&result.network, pass.clone());
        }
        info!("Result saved to {}", self.results_file.display());
        Ok(())
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
