//! Fixtures shared by the engine tests

use std::path::Path;
use std::time::Duration;

use airhook_common::{
    airodump_artifact, AccessPoint, AirhookResult, EngineOptions, ToolCommand, ToolOutput,
};

pub const SCAN: &str = "\r
BSSID, First time seen, Last time seen, channel, Speed, Privacy, Cipher, Authentication, Power, # beacons, # IV, LAN IP, ID-length, ESSID, Key\r
00:11:22:33:44:55, 2026-10-19 10:00:00, 2026-10-19 10:00:08,  6,  54, WPA2, CCMP, PSK, -61,       10,        0,   0.  0.  0.  0,   7, HomeNet, \r
\r
Station MAC, First time seen, Last time seen, Power, # packets, BSSID, Probed ESSIDs\r
A0:A0:A0:A0:A0:A0, 2026-10-19 10:00:03, 2026-10-19 10:00:08, -50,       12, 00:11:22:33:44:55, HomeNet\r
B0:B0:B0:B0:B0:B0, 2026-10-19 10:00:04, 2026-10-19 10:00:08, -70,        3, (not associated) , Other\r
A0:A0:A0:A0:A0:A0, 2026-10-19 10:00:05, 2026-10-19 10:00:08, -49,       14, 00:11:22:33:44:55, HomeNet\r
C0:C0:C0:C0:C0:C0, 2026-10-19 10:00:06, 2026-10-19 10:00:08, -55,        9, 00:11:22:33:44:55, \r
D0:D0:D0:D0:D0:D0, 2026-10-19 10:00:07, 2026-10-19 10:00:08, -58,        2, CC:DD:EE:FF:00:11, \r
";

pub fn target() -> AccessPoint {
    AccessPoint::new("00:11:22:33:44:55".parse().unwrap(), 6, -61, "WPA2 CCMP").with_essid("HomeNet")
}

/// Millisecond-scale timings so sessions finish quickly.
pub fn fast_options() -> EngineOptions {
    EngineOptions {
        scan_window: Duration::from_millis(20),
        client_window: Duration::from_millis(20),
        decloak_window: Duration::from_millis(20),
        capture_timeout: Duration::from_millis(120),
        poll_interval: Duration::from_millis(10),
        deauth_stagger: Duration::from_millis(1),
        deauth_settle: Duration::from_millis(1),
        post_broadcast_wait: Duration::from_millis(1),
        deauth_join_wait: Duration::from_millis(200),
        terminate_grace: Duration::from_millis(200),
        ..EngineOptions::default()
    }
}

fn prefix_of(cmd: &ToolCommand) -> &Path {
    let prefix = cmd
        .flag_value("--write")
        .or_else(|| cmd.flag_value("-w"))
        .expect("airodump write prefix");
    Path::new(prefix)
}

/// airodump-ng stand-in that drops a CSV artifact when spawned.
pub fn write_csv(content: &'static str) -> impl Fn(&ToolCommand) + Send + Sync + 'static {
    move |cmd: &ToolCommand| {
        std::fs::write(airodump_artifact(prefix_of(cmd), "csv"), content).unwrap();
    }
}

/// airodump-ng stand-in that drops capture and CSV artifacts when spawned.
pub fn write_cap() -> impl Fn(&ToolCommand) + Send + Sync + 'static {
    move |cmd: &ToolCommand| {
        let prefix = prefix_of(cmd);
        std::fs::write(airodump_artifact(prefix, "cap"), b"pcap").unwrap();
        std::fs::write(airodump_artifact(prefix, "csv"), SCAN).unwrap();
    }
}

/// aircrack-ng stand-in that always prints `text`.
pub fn aircrack_reporting(
    text: &'static str,
) -> impl Fn(&ToolCommand) -> AirhookResult<ToolOutput> + Send + Sync + 'static {
    move |_: &ToolCommand| {
        Ok(ToolOutput {
            success: true,
            stdout: text.to_string(),
            stderr: String::new(),
        })
    }
}

/// aircrack-ng stand-in: handshake checks report one handshake, dictionary
/// runs report `secret` when the wordlist contains it.
pub fn dictionary_aircrack(
    secret: &'static str,
) -> impl Fn(&ToolCommand) -> AirhookResult<ToolOutput> + Send + Sync + 'static {
    move |cmd: &ToolCommand| {
        let stdout = match cmd.flag_value("-w") {
            None => "1  00:11:22:33:44:55  HomeNet  WPA (1 handshake)".to_string(),
            Some(words) => {
                let words = std::fs::read_to_string(words).unwrap_or_default();
                if words.lines().any(|w| w.trim() == secret) {
                    format!("KEY FOUND! [ {secret} ]")
                } else {
                    "Passphrase not in dictionary".to_string()
                }
            }
        };
        Ok(ToolOutput {
            success: true,
            stdout,
            stderr: String::new(),
        })
    }
}
