//! airodump-ng CSV artifact parsing
//!
//! The file holds two sections. Access points come first under a header
//! starting with `BSSID`, stations follow under a header starting with
//! `Station MAC`. Rows are comma separated with fixed column positions.

use std::collections::HashSet;

use airhook_common::{AccessPoint, Client, MacAddr};

const AP_HEADER: &str = "BSSID";
const STATION_HEADER: &str = "Station MAC";

const AP_MIN_COLUMNS: usize = 14;
const COL_BSSID: usize = 0;
const COL_CHANNEL: usize = 3;
const COL_PRIVACY: usize = 5;
const COL_CIPHER: usize = 6;
const COL_POWER: usize = 8;
const COL_ESSID: usize = 13;

const STATION_MIN_COLUMNS: usize = 6;
const COL_STATION: usize = 0;
const COL_STATION_BSSID: usize = 5;

fn split_row(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

/// Hidden networks show up with an empty name or a `<length: N>` placeholder.
fn clean_essid(raw: &str) -> Option<String> {
    let essid = raw.replace('\0', "");
    let essid = essid.trim();
    if essid.is_empty() || essid.starts_with("<length:") {
        None
    } else {
        Some(essid.to_string())
    }
}

/// Access point rows, in file order. Open networks are included; rows with
/// an unparseable BSSID or too few columns are skipped.
pub fn parse_access_points(content: &str) -> Vec<AccessPoint> {
    let mut in_section = false;
    let mut out = Vec::new();

    for line in content.lines().map(str::trim) {
        if line.starts_with(AP_HEADER) {
            in_section = true;
            continue;
        }
        if line.starts_with(STATION_HEADER) {
            break;
        }
        if !in_section || line.is_empty() {
            continue;
        }

        let parts = split_row(line);
        if parts.len() < AP_MIN_COLUMNS {
            continue;
        }
        let Ok(bssid) = parts[COL_BSSID].parse::<MacAddr>() else {
            continue;
        };

        let channel = parts[COL_CHANNEL].parse::<u32>().unwrap_or(0);
        let power = parts[COL_POWER].parse::<i32>().unwrap_or(0);
        let encryption = format!("{} {}", parts[COL_PRIVACY], parts[COL_CIPHER])
            .trim()
            .to_string();

        let mut ap = AccessPoint::new(bssid, channel, power, encryption);
        ap.essid = clean_essid(parts[COL_ESSID]);
        out.push(ap);
    }

    out
}

/// Distinct stations associated with `bssid`, in first-seen order.
///
/// Stations marked `(not associated)` or tied to another access point are
/// ignored.
pub fn parse_stations(content: &str, bssid: MacAddr) -> Vec<Client> {
    let mut in_section = false;
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for line in content.lines().map(str::trim) {
        if line.starts_with(STATION_HEADER) {
            in_section = true;
            continue;
        }
        if !in_section || line.is_empty() {
            continue;
        }

        let parts = split_row(line);
        if parts.len() < STATION_MIN_COLUMNS {
            continue;
        }
        let Ok(station) = parts[COL_STATION].parse::<MacAddr>() else {
            continue;
        };
        match parts[COL_STATION_BSSID].parse::<MacAddr>() {
            Ok(assoc) if assoc == bssid => {}
            _ => continue,
        }
        if seen.insert(station) {
            out.push(Client::new(station));
        }
    }

    out
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const SCAN: &str = "\r
BSSID, First time seen, Last time seen, channel, Speed, Privacy, Cipher, Authentication, Power, # beacons, # IV, LAN IP, ID-length, ESSID, Key\r
00:11:22:33:44:55, 2026-10-19 10:00:00, 2026-10-19 10:00:08,  6,  54, WPA2, CCMP, PSK, -61,       10,        0,   0.  0.  0.  0,   7, HomeNet, \r
66:77:88:99:AA:BB, 2026-10-19 10:00:01, 2026-10-19 10:00:08, 11,  54, OPN,  ,  , -30,       22,        0,   0.  0.  0.  0,   8, FreeWifi, \r
CC:DD:EE:FF:00:11, 2026-10-19 10:00:02, 2026-10-19 10:00:08,  1, 130, WPA2 WPA, CCMP TKIP, PSK, -45,       30,        4,   0.  0.  0.  0,   0, , \r
\r
Station MAC, First time seen, Last time seen, Power, # packets, BSSID, Probed ESSIDs\r
A0:A0:A0:A0:A0:A0, 2026-10-19 10:00:03, 2026-10-19 10:00:08, -50,       12, 00:11:22:33:44:55, HomeNet\r
B0:B0:B0:B0:B0:B0, 2026-10-19 10:00:04, 2026-10-19 10:00:08, -70,        3, (not associated) , Other\r
A0:A0:A0:A0:A0:A0, 2026-10-19 10:00:05, 2026-10-19 10:00:08, -49,       14, 00:11:22:33:44:55, HomeNet\r
C0:C0:C0:C0:C0:C0, 2026-10-19 10:00:06, 2026-10-19 10:00:08, -55,        9, 00:11:22:33:44:55, \r
D0:D0:D0:D0:D0:D0, 2026-10-19 10:00:07, 2026-10-19 10:00:08, -58,        2, CC:DD:EE:FF:00:11, \r
";
}
