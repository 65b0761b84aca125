//! Network catalog - ranked, deduplicated registry of access points

use serde::Serialize;
use std::collections::HashMap;

use airhook_common::{AccessPoint, AirhookError, AirhookResult, MacAddr};

use crate::csv::parse_access_points;

/// Encrypted or hidden access points, ranked by descending signal strength.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkCatalog {
    entries: Vec<AccessPoint>,
}

impl NetworkCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an airodump-ng scan CSV. Open networks are dropped.
    pub fn from_scan_csv(content: &str) -> Self {
        let mut catalog = Self::new();
        catalog.merge(parse_access_points(content));
        catalog
    }

    /// Add access points, skipping open ones and keeping the strongest
    /// sighting per BSSID. Ranks are recomputed afterwards.
    pub fn merge(&mut self, aps: impl IntoIterator<Item = AccessPoint>) {
        let mut index: HashMap<MacAddr, usize> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, ap)| (ap.bssid, i))
            .collect();

        for ap in aps {
            if ap.is_open() {
                continue;
            }
            match index.get(&ap.bssid) {
                Some(&i) => {
                    let existing = &mut self.entries[i];
                    let stronger = ap.power > existing.power;
                    let fallback_name = if stronger {
                        existing.essid.clone()
                    } else {
                        ap.essid.clone()
                    };
                    if stronger {
                        *existing = ap;
                    }
                    if existing.essid.is_none() {
                        existing.essid = fallback_name;
                    }
                }
                None => {
                    index.insert(ap.bssid, self.entries.len());
                    self.entries.push(ap);
                }
            }
        }

        self.rank();
    }

    /// Sort by signal strength (strongest first) and renumber from 1.
    fn rank(&mut self) {
        self.entries
            .sort_by(|a, b| b.power.cmp(&a.power).then_with(|| a.bssid.cmp(&b.bssid)));
        for (i, ap) in self.entries.iter_mut().enumerate() {
            ap.rank = i + 1;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessPoint> {
        self.entries.iter()
    }

    /// Look up by 1-based rank.
    pub fn get(&self, rank: usize) -> Option<&AccessPoint> {
        rank.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    pub fn by_bssid(&self, bssid: MacAddr) -> Option<&AccessPoint> {
        self.entries.iter().find(|ap| ap.bssid == bssid)
    }

    /// Store a name revealed for a hidden network.
    pub fn reveal(&mut self, bssid: MacAddr, essid: &str) -> bool {
        match self.entries.iter_mut().find(|ap| ap.bssid == bssid) {
            Some(ap) => {
                ap.reveal_name(essid);
                true
            }
            None => false,
        }
    }

    /// Clone the entries at the given ranks, in the given order.
    pub fn select(&self, ranks: &[usize]) -> AirhookResult<Vec<AccessPoint>> {
        ranks
            .iter()
            .map(|&r| {
                self.get(r)
                    .cloned()
                    .ok_or_else(|| AirhookError::Config(format!("no network with ID {r}")))
            })
            .collect()
    }
}

/// Parse a target selection like "1,3-5" or "all" into ranks within `1..=max`.
pub fn parse_selection(input: &str, max: usize) -> AirhookResult<Vec<usize>> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("all") {
        return Ok((1..=max).collect());
    }

    let mut ranks = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if part.contains('-') {
            let range: Vec<&str> = part.split('-').collect();
            if range.len() != 2 {
                return Err(AirhookError::Config(format!("invalid range: {part}")));
            }
            let start: usize = range[0]
                .trim()
                .parse()
                .map_err(|_| AirhookError::Config(format!("invalid start: {}", range[0])))?;
            let end: usize = range[1]
                .trim()
                .parse()
                .map_err(|_| AirhookError::Config(format!("invalid end: {}", range[1])))?;
            if start > end {
                return Err(AirhookError::Config("invalid range: start > end".into()));
            }
            if start == 0 || end > max {
                return Err(AirhookError::Config(format!(
                    "range {start}-{end} out of range 1-{max}"
                )));
            }
            ranks.extend(start..=end);
        } else {
            let rank: usize = part
                .parse()
                .map_err(|_| AirhookError::Config(format!("invalid ID: {part}")))?;
            ranks.push(rank);
        }
    }

    if ranks.is_empty() {
        return Err(AirhookError::Config("no targets selected".into()));
    }
    if let Some(bad) = ranks.iter().find(|&&r| r == 0 || r > max) {
        return Err(AirhookError::Config(format!(
            "ID {bad} out of range 1-{max}"
        )));
    }

    let mut seen = std::collections::HashSet::new();
    ranks.retain(|r| seen.insert(*r));
    Ok(ranks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::fixtures::SCAN;

    fn ap(mac: &str, power: i32, enc: &str) -> AccessPoint {
        AccessPoint::new(mac.parse().unwrap(), 6, power, enc)
    }

    #[test]
    fn scan_with_open_network_keeps_two_ranked() {
        let catalog = NetworkCatalog::from_scan_csv(SCAN);
        assert_eq!(catalog.len(), 2);

        let first = catalog.get(1).unwrap();
        let second = catalog.get(2).unwrap();
        assert_eq!(first.bssid.to_string(), "CC:DD:EE:FF:00:11");
        assert_eq!(first.power, -45);
        assert_eq!(second.display_name(), "HomeNet");
        assert!(first.power > second.power);
        assert_eq!((first.rank, second.rank), (1, 2));
        assert!(catalog.get(0).is_none());
        assert!(catalog.get(3).is_none());
    }

    #[test]
    fn duplicate_bssid_keeps_strongest_and_name() {
        let mut catalog = NetworkCatalog::new();
        catalog.merge([ap("00:11:22:33:44:55", -70, "WPA2 CCMP").with_essid("Cafe")]);
        catalog.merge([ap("00:11:22:33:44:55", -40, "WPA2 CCMP")]);
        assert_eq!(catalog.len(), 1);
        let only = catalog.get(1).unwrap();
        assert_eq!(only.power, -40);
        assert_eq!(only.display_name(), "Cafe");
    }

    #[test]
    fn ranks_recomputed_after_merge() {
        let mut catalog = NetworkCatalog::new();
        catalog.merge([ap("00:00:00:00:00:01", -60, "WPA2")]);
        catalog.merge([ap("00:00:00:00:00:02", -20, "WPA2")]);
        assert_eq!(catalog.get(1).unwrap().bssid.to_string(), "00:00:00:00:00:02");
        assert_eq!(catalog.get(2).unwrap().rank, 2);
    }

    #[test]
    fn reveal_hidden_name() {
        let mut catalog = NetworkCatalog::from_scan_csv(SCAN);
        let hidden: MacAddr = "CC:DD:EE:FF:00:11".parse().unwrap();
        assert!(catalog.reveal(hidden, "Attic"));
        assert_eq!(catalog.by_bssid(hidden).unwrap().display_name(), "Attic");
        assert!(!catalog.reveal(MacAddr([9; 6]), "Nope"));
    }

    #[test]
    fn select_by_rank() {
        let catalog = NetworkCatalog::from_scan_csv(SCAN);
        let picked = catalog.select(&[2, 1]).unwrap();
        assert_eq!(picked[0].display_name(), "HomeNet");
        assert!(catalog.select(&[5]).is_err());
    }

    #[test]
    fn selection_syntax() {
        assert_eq!(parse_selection("1", 5).unwrap(), vec![1]);
        assert_eq!(parse_selection("1,3-5", 5).unwrap(), vec![1, 3, 4, 5]);
        assert_eq!(parse_selection(" 2 , 2 ,1 ", 5).unwrap(), vec![2, 1]);
        assert_eq!(parse_selection("ALL", 3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn selection_errors() {
        assert!(parse_selection("", 5).is_err());
        assert!(parse_selection(",,,", 5).is_err());
        assert!(parse_selection("abc", 5).is_err());
        assert!(parse_selection("0", 5).is_err());
        assert!(parse_selection("6", 5).is_err());
        assert!(parse_selection("4-2", 5).is_err());
        assert!(parse_selection("1-", 5).is_err());
        assert!(parse_selection("0-2", 5).is_err());
        assert!(parse_selection("4-6", 5).is_err());
        assert!(parse_selection("1-99999999999", 5).is_err());
        assert!(parse_selection(&format!("1-{}", usize::MAX), 5).is_err());
    }
}
