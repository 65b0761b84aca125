//! Per-run progress and outcome tracking

use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use airhook_common::{AccessPoint, RecoveryResult};

/// What happened to one target.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum TargetOutcome {
    Cracked { result: RecoveryResult },
    NotInDictionary,
    NoHandshake,
    NoClients,
    Skipped,
    Error { message: String },
}

impl TargetOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TargetOutcome::Cracked { .. } => "cracked",
            TargetOutcome::NotInDictionary => "not in dictionary",
            TargetOutcome::NoHandshake => "no handshake",
            TargetOutcome::NoClients => "no clients",
            TargetOutcome::Skipped => "skipped",
            TargetOutcome::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub target: AccessPoint,
    /// Handshake used for recovery, captured or reused.
    pub capture: Option<PathBuf>,
    pub outcome: TargetOutcome,
}

/// Outcomes of a multi-target run, in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub reports: Vec<TargetReport>,
    pub interrupted: bool,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, report: TargetReport) {
        self.reports.push(report);
    }

    pub fn captured(&self) -> usize {
        self.reports.iter().filter(|r| r.capture.is_some()).count()
    }

    pub fn cracked(&self) -> impl Iterator<Item = &RecoveryResult> {
        self.reports.iter().filter_map(|r| match &r.outcome {
            TargetOutcome::Cracked { result } => Some(result),
            _ => None,
        })
    }

    pub fn failed(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, TargetOutcome::Error { .. }))
            .count()
    }

    pub fn log_summary(&self) {
        let cracked = self.cracked().count();
        info!("Run Summary:");
        info!("  Total targets: {}", self.total);
        info!("  Handshakes: {}", self.captured());
        info!("  Cracked: {}", cracked);
        info!("  Errors: {}", self.failed());
        if self.total > 0 {
            info!(
                "  Success rate: {:.1}%",
                (cracked as f64 / self.total as f64) * 100.0
            );
        }
        if self.interrupted {
            warn!("  Run interrupted before all targets were processed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::target;
    use std::time::Duration;

    #[test]
    fn counts_by_outcome() {
        let mut summary = RunSummary::new(3);
        let ap = target();
        summary.record(TargetReport {
            target: ap.clone(),
            capture: Some(PathBuf::from("handshakes/HomeNet.cap")),
            outcome: TargetOutcome::Cracked {
                result: RecoveryResult::new(&ap, None, Duration::from_secs(1)),
            },
        });
        summary.record(TargetReport {
            target: ap.clone(),
            capture: None,
            outcome: TargetOutcome::NoClients,
        });
        summary.record(TargetReport {
            target: ap,
            capture: None,
            outcome: TargetOutcome::Error {
                message: "boom".into(),
            },
        });

        assert_eq!(summary.captured(), 1);
        assert_eq!(summary.cracked().count(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.reports[1].outcome.label(), "no clients");
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(&TargetOutcome::NoHandshake).unwrap();
        assert_eq!(json["status"], "no-handshake");

        let json = serde_json::to_value(&TargetOutcome::Error {
            message: "boom".into(),
        })
        .unwrap();
        assert_eq!(json["message"], "boom");
    }
}
