//! Airhook Engine - handshake capture orchestration
//!
//! Client discovery, deauthentication, supervised capture, validation and
//! dictionary recovery, plus the `Engine` that runs them per target.

mod capture;
mod deauth;
mod discovery;
mod pipeline;
mod progress;
mod recovery;
mod validator;

#[cfg(test)]
mod test_support;

pub use capture::{CaptureObserver, CaptureReport, CaptureSupervisor, SessionRegistry, SilentObserver};
pub use deauth::{deauthenticate, DeauthReport};
pub use discovery::discover_clients;
pub use pipeline::{Engine, PlannedTarget};
pub use progress::{RunSummary, TargetOutcome, TargetReport};
pub use recovery::{parse_key, parse_records, RecoveryEngine, VERIFIED_NOTE};
pub use validator::{reports_single_handshake, HandshakeValidator};
