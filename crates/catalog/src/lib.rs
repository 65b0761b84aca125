//! Airhook Catalog - discovering access points
//!
//! Parses airodump-ng CSV artifacts into a ranked `NetworkCatalog`, drives
//! the scan and decloak captures that produce them and names access point
//! vendors from the OUI registry.

mod catalog;
pub mod csv;
mod oui;
mod scan;

pub use catalog::{parse_selection, NetworkCatalog};
pub use csv::{parse_access_points, parse_stations};
pub use oui::{VendorDb, DEFAULT_OUI_PATHS};
pub use scan::{decloak, scan_networks};
