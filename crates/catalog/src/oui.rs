//! Vendor names for access point addresses
//!
//! Reads the IEEE OUI registry in the `XX-XX-XX   (hex)   Vendor` layout used
//! by `oui.txt` and by aircrack-ng's own `airodump-ng-oui.txt`.

use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use airhook_common::{AirhookResult, MacAddr};

/// Where distributions and `airodump-ng-oui-update` put the registry.
pub const DEFAULT_OUI_PATHS: [&str; 4] = [
    "/etc/aircrack-ng/airodump-ng-oui.txt",
    "/usr/local/etc/aircrack-ng/airodump-ng-oui.txt",
    "/usr/share/aircrack-ng/airodump-ng-oui.txt",
    "/usr/share/ieee-data/oui.txt",
];

#[derive(Debug, Clone, Default)]
pub struct VendorDb {
    vendors: HashMap<[u8; 3], String>,
}

impl VendorDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse registry text. Lines without a `(hex)` entry are ignored.
    pub fn parse(text: &str) -> Self {
        let mut vendors = HashMap::new();
        for line in text.lines() {
            let Some((prefix, vendor)) = line.split_once("(hex)") else {
                continue;
            };
            let vendor = vendor.trim();
            if let (Some(oui), false) = (parse_oui(prefix.trim()), vendor.is_empty()) {
                vendors.insert(oui, vendor.to_string());
            }
        }
        Self { vendors }
    }

    pub async fn load(path: &Path) -> AirhookResult<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        let db = Self::parse(&text);
        debug!("Loaded {} vendors from {}", db.len(), path.display());
        Ok(db)
    }

    /// First readable registry from `DEFAULT_OUI_PATHS`, or an empty one.
    pub async fn load_default() -> Self {
        for path in DEFAULT_OUI_PATHS {
            if let Ok(db) = Self::load(Path::new(path)).await {
                if !db.is_empty() {
                    return db;
                }
            }
        }
        debug!("No OUI registry found, vendors will show as unknown");
        Self::new()
    }

    /// Vendor registered for the address prefix. Locally administered
    /// (randomized) addresses never match.
    pub fn lookup(&self, mac: MacAddr) -> Option<&str> {
        let [a, b, c, ..] = mac.0;
        if a & 0x02 != 0 {
            return None;
        }
        self.vendors.get(&[a, b, c]).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }
}

fn parse_oui(prefix: &str) -> Option<[u8; 3]> {
    let mut out = [0u8; 3];
    let mut parts = prefix.split(|c: char| c == '-' || c == ':');
    for byte in &mut out {
        *byte = u8::from_str_radix(parts.next()?.trim(), 16).ok()?;
    }
    parts.next().is_none().then_some(out)
}
