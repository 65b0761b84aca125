//! Core data types for airhook
//!
//! Access points and clients come out of airodump CSV artifacts, recovery
//! results go into the append-only results store. Hot paths here are tiny,
//! so the types favour clarity: public fields, builder-style constructors.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AirhookError;

/// Name shown for networks that do not broadcast an ESSID.
pub const HIDDEN_SSID: &str = "<HIDDEN SSID>";

/// 48-bit hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);

    #[inline]
    #[must_use]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddr {
    type Err = AirhookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut out = [0u8; 6];
        let mut count = 0;
        for part in s.split(|c| c == ':' || c == '-') {
            if count == 6 || part.len() != 2 {
                return Err(AirhookError::Parse(format!("invalid MAC address: {s}")));
            }
            out[count] = u8::from_str_radix(part, 16)
                .map_err(|_| AirhookError::Parse(format!("invalid MAC address: {s}")))?;
            count += 1;
        }
        if count != 6 {
            return Err(AirhookError::Parse(format!("invalid MAC address: {s}")));
        }
        Ok(MacAddr(out))
    }
}

impl TryFrom<String> for MacAddr {
    type Error = AirhookError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacAddr> for String {
    fn from(mac: MacAddr) -> Self {
        mac.to_string()
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// A discovered access point.
///
/// Everything except `essid` (revealed after decloaking) and `rank`
/// (recomputed after each sort) is fixed once the scan record is parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPoint {
    pub bssid: MacAddr,
    /// `None` for hidden networks.
    pub essid: Option<String>,
    /// `0` when not known, e.g. for an offline capture.
    pub channel: u32,
    /// Signal power in dBm, `0` when not measured.
    pub power: i32,
    /// Empty when not known.
    pub encryption: String,
    /// 1-based ordinal in the catalog.
    pub rank: usize,
}

impl AccessPoint {
    #[must_use]
    pub fn new(bssid: MacAddr, channel: u32, power: i32, encryption: impl Into<String>) -> Self {
        Self {
            bssid,
            essid: None,
            channel,
            power,
            encryption: encryption.into(),
            rank: 0,
        }
    }

    #[must_use]
    pub fn with_essid(mut self, essid: impl Into<String>) -> Self {
        self.essid = Some(essid.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.essid.is_none()
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.essid.as_deref().unwrap_or(HIDDEN_SSID)
    }

    /// Record the name of a hidden network once it has been revealed.
    pub fn reveal_name(&mut self, essid: impl Into<String>) {
        self.essid = Some(essid.into());
    }

    /// Linear approximation: -100 dBm is 0 %, -30 dBm is 100 %.
    #[must_use]
    pub fn signal_percent(&self) -> u8 {
        let pct = (f64::from(self.power) + 100.0) * 100.0 / 70.0;
        pct.clamp(0.0, 100.0) as u8
    }

    #[must_use]
    pub fn known_channel(&self) -> Option<u32> {
        (self.channel != 0).then_some(self.channel)
    }

    #[must_use]
    pub fn known_power(&self) -> Option<i32> {
        (self.power != 0).then_some(self.power)
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.encryption.to_uppercase().contains("OPN")
    }
}

impl fmt::Display for AccessPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}) CH:{} PWR:{}% ({} dBm) {}",
            self.rank,
            self.display_name(),
            self.bssid,
            self.channel,
            self.signal_percent(),
            self.power,
            self.encryption
        )
    }
}

/// A station seen talking to an access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Client {
    pub mac: MacAddr,
}

impl Client {
    #[inline]
    #[must_use]
    pub const fn new(mac: MacAddr) -> Self {
        Self { mac }
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.mac.fmt(f)
    }
}

/// A recovered network passphrase. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Passphrase(String);

impl Passphrase {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(***)")
    }
}

/// Outcome of a successful dictionary attack, persisted once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryResult {
    pub network: String,
    pub bssid: MacAddr,
    pub passphrase: Option<Passphrase>,
    pub channel: Option<u32>,
    pub encryption: Option<String>,
    pub power: Option<i32>,
    pub elapsed: Duration,
    pub recorded_at: DateTime<Local>,
    pub note: Option<String>,
}

impl RecoveryResult {
    #[must_use]
    pub fn new(target: &AccessPoint, passphrase: Option<Passphrase>, elapsed: Duration) -> Self {
        Self {
            network: target.display_name().to_string(),
            bssid: target.bssid,
            passphrase,
            channel: target.known_channel(),
            encryption: Some(target.encryption.clone()).filter(|e| !e.is_empty()),
            power: target.known_power(),
            elapsed,
            recorded_at: Local::now(),
            note: None,
        }
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Human-readable key-value block appended to the results store.
    /// Radio details that are not known are left out.
    #[must_use]
    pub fn to_record(&self) -> String {
        let mut out = format!(
            "[{}]\nNetwork: {}\nBSSID: {}\nPassword: {}\n",
            self.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            self.network,
            self.bssid,
            self.passphrase.as_ref().map(Passphrase::expose).unwrap_or(""),
        );
        if let Some(channel) = self.channel {
            out.push_str(&format!("Channel: {channel}\n"));
        }
        if let Some(encryption) = &self.encryption {
            out.push_str(&format!("Encryption: {encryption}\n"));
        }
        if let Some(power) = self.power {
            out.push_str(&format!("Signal: {power} dBm\n"));
        }
        out.push_str(&format!("Time: {:.2}s\n", self.elapsed.as_secs_f64()));
        if let Some(note) = &self.note {
            out.push_str(&format!("Note: {note}\n"));
        }
        out.push('\n');
        out
    }
}

/// Lifecycle states of a handshake capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureState {
    Starting,
    Capturing,
    Found,
    TimedOut,
    Cancelled,
    Finalizing,
    Saved,
    Failed,
}

impl CaptureState {
    /// The three states that end the capturing phase.
    #[inline]
    #[must_use]
    pub const fn is_trigger(&self) -> bool {
        matches!(
            self,
            CaptureState::Found | CaptureState::TimedOut | CaptureState::Cancelled
        )
    }

    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CaptureState::Starting => "starting",
            CaptureState::Capturing => "capturing",
            CaptureState::Found => "found",
            CaptureState::TimedOut => "timed-out",
            CaptureState::Cancelled => "cancelled",
            CaptureState::Finalizing => "finalizing",
            CaptureState::Saved => "saved",
            CaptureState::Failed => "failed",
        }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing and count knobs for every engine stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineOptions {
    pub scan_window: Duration,
    pub client_window: Duration,
    pub decloak_window: Duration,
    pub capture_timeout: Duration,
    pub poll_interval: Duration,
    /// Frames per aireplay-ng invocation.
    pub deauth_count: u32,
    pub deauth_stagger: Duration,
    pub deauth_settle: Duration,
    pub post_broadcast_wait: Duration,
    pub deauth_join_wait: Duration,
    pub terminate_grace: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            scan_window: Duration::from_secs(8),
            client_window: Duration::from_secs(10),
            decloak_window: Duration::from_secs(10),
            capture_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
            deauth_count: 10,
            deauth_stagger: Duration::from_millis(100),
            deauth_settle: Duration::from_secs(1),
            post_broadcast_wait: Duration::from_secs(3),
            deauth_join_wait: Duration::from_secs(2),
            terminate_grace: Duration::from_secs(5),
        }
    }
}

impl EngineOptions {
    /// Short windows for busy networks with plenty of clients.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            scan_window: Duration::from_secs(5),
            client_window: Duration::from_secs(6),
            capture_timeout: Duration::from_secs(30),
            deauth_count: 5,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn standard() -> Self {
        Self::default()
    }

    /// Long windows for quiet networks where clients reconnect slowly.
    #[must_use]
    pub fn patient() -> Self {
        Self {
            scan_window: Duration::from_secs(15),
            client_window: Duration::from_secs(20),
            decloak_window: Duration::from_secs(20),
            capture_timeout: Duration::from_secs(180),
            deauth_count: 15,
            post_broadcast_wait: Duration::from_secs(5),
            ..Self::default()
        }
    }

    /// Resolve a preset by name.
    pub fn preset(name: &str) -> Result<Self, AirhookError> {
        match name.trim().to_lowercase().as_str() {
            "quick" => Ok(Self::quick()),
            "standard" | "" => Ok(Self::standard()),
            "patient" => Ok(Self::patient()),
            other => Err(AirhookError::Config(format!("unknown preset '{other}'"))),
        }
    }
}

/// Make a network name safe for use in a file name.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() {
        "hidden".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_parse_and_display() {
        let mac: MacAddr = "aa:bb:cc:0d:0e:0f".parse().unwrap();
        assert_eq!(mac.to_string(), "AA:BB:CC:0D:0E:0F");
        let dashed: MacAddr = "AA-BB-CC-0D-0E-0F".parse().unwrap();
        assert_eq!(mac, dashed);
    }

    #[test]
    fn mac_rejects_garbage() {
        assert!("".parse::<MacAddr>().is_err());
        assert!("aa:bb:cc".parse::<MacAddr>().is_err());
        assert!("aa:bb:cc:dd:ee:ff:00".parse::<MacAddr>().is_err());
        assert!("zz:bb:cc:dd:ee:ff".parse::<MacAddr>().is_err());
        assert!("(not associated)".parse::<MacAddr>().is_err());
    }

    #[test]
    fn mac_serde_as_string() {
        let mac: MacAddr = "00:11:22:33:44:55".parse().unwrap();
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"00:11:22:33:44:55\"");
        let back: MacAddr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mac);
    }

    #[test]
    fn access_point_names() {
        let mac: MacAddr = "00:11:22:33:44:55".parse().unwrap();
        let mut ap = AccessPoint::new(mac, 6, -40, "WPA2 CCMP");
        assert!(ap.is_hidden());
        assert_eq!(ap.display_name(), HIDDEN_SSID);
        ap.reveal_name("Cafe");
        assert_eq!(ap.display_name(), "Cafe");
    }

    #[test]
    fn signal_percent_is_clamped() {
        let mac = MacAddr([0; 6]);
        assert_eq!(AccessPoint::new(mac, 1, -100, "WPA2").signal_percent(), 0);
        assert_eq!(AccessPoint::new(mac, 1, -30, "WPA2").signal_percent(), 100);
        assert_eq!(AccessPoint::new(mac, 1, -10, "WPA2").signal_percent(), 100);
        assert_eq!(AccessPoint::new(mac, 1, -120, "WPA2").signal_percent(), 0);
    }

    #[test]
    fn passphrase_debug_is_redacted() {
        let p = Passphrase::new("hunter22");
        assert_eq!(format!("{p:?}"), "Passphrase(***)");
        assert_eq!(p.expose(), "hunter22");
    }

    #[test]
    fn record_contains_all_fields() {
        let mac: MacAddr = "00:11:22:33:44:55".parse().unwrap();
        let ap = AccessPoint::new(mac, 11, -55, "WPA2 CCMP").with_essid("HomeNet");
        let result = RecoveryResult::new(
            &ap,
            Some(Passphrase::new("correcthorse")),
            Duration::from_millis(1500),
        )
        .with_note("verified from prior session");
        let record = result.to_record();
        assert!(record.contains("Network: HomeNet\n"));
        assert!(record.contains("BSSID: 00:11:22:33:44:55\n"));
        assert!(record.contains("Password: correcthorse\n"));
        assert!(record.contains("Channel: 11\n"));
        assert!(record.contains("Signal: -55 dBm\n"));
        assert!(record.contains("Time: 1.50s\n"));
        assert!(record.contains("Note: verified from prior session\n"));
    }

    #[test]
    fn record_omits_unknown_radio_details() {
        let mac: MacAddr = "00:11:22:33:44:55".parse().unwrap();
        let ap = AccessPoint::new(mac, 0, 0, "").with_essid("HomeNet");
        let record = RecoveryResult::new(&ap, Some(Passphrase::new("pw")), Duration::from_secs(2))
            .to_record();
        assert!(record.contains("Password: pw\nTime: 2.00s\n"));
        assert!(!record.contains("Channel:"));
        assert!(!record.contains("Encryption:"));
        assert!(!record.contains("Signal:"));
    }

    #[test]
    fn sanitize_names() {
        assert_eq!(sanitize_name("Home Net!"), "Home_Net");
        assert_eq!(sanitize_name("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_name("ok-name_1"), "ok-name_1");
        assert_eq!(sanitize_name(HIDDEN_SSID), "HIDDEN_SSID");
        assert_eq!(sanitize_name("???"), "hidden");
    }

    #[test]
    fn presets() {
        let quick = EngineOptions::quick();
        assert!(quick.capture_timeout < EngineOptions::default().capture_timeout);
        let patient = EngineOptions::preset("patient").unwrap();
        assert!(patient.capture_timeout > EngineOptions::default().capture_timeout);
        assert!(EngineOptions::preset("turbo").is_err());
    }

    #[test]
    fn capture_state_triggers() {
        assert!(CaptureState::Found.is_trigger());
        assert!(CaptureState::TimedOut.is_trigger());
        assert!(CaptureState::Cancelled.is_trigger());
        assert!(!CaptureState::Finalizing.is_trigger());
        assert_eq!(CaptureState::TimedOut.to_string(), "timed-out");
    }
}
