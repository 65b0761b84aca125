//! Output formatting for networks and run results

use anyhow::Result;
use serde_json::json;
use std::time::Duration;

use airhook_catalog::{NetworkCatalog, VendorDb};
use airhook_common::{AccessPoint, Passphrase, RecoveryResult};
use airhook_engine::{RunSummary, TargetOutcome};

/// Print the network catalog in the specified format
pub fn print_networks(catalog: &NetworkCatalog, vendors: &VendorDb, format: &str) -> Result<()> {
    match format.trim().to_lowercase().as_str() {
        "json" | "j" => print_networks_json(catalog, vendors)?,
        _ => print_network_table(catalog, vendors),
    }
    Ok(())
}

fn vendor_of<'a>(vendors: &'a VendorDb, ap: &AccessPoint) -> &'a str {
    vendors.lookup(ap.bssid).unwrap_or("Unknown")
}

fn print_networks_json(catalog: &NetworkCatalog, vendors: &VendorDb) -> Result<()> {
    let mut networks = Vec::with_capacity(catalog.len());
    for ap in catalog.iter() {
        let mut entry = serde_json::to_value(ap)?;
        entry["vendor"] = json!(vendors.lookup(ap.bssid));
        networks.push(entry);
    }
    println!("{}", serde_json::to_string_pretty(&networks)?);
    Ok(())
}

fn print_network_table(catalog: &NetworkCatalog, vendors: &VendorDb) {
    if catalog.is_empty() {
        println!("\nNo networks to display.\n");
        return;
    }

    println!("\n===== {} Networks found =====", catalog.len());
    println!("{:-<107}", "");
    println!(
        "{:<4} {:<19} {:<4} {:<6} {:<7} {:<14} {:<30} {:<20}",
        "ID", "BSSID", "CH", "PWR", "SIGNAL", "ENCRYPTION", "ESSID", "VENDOR"
    );
    println!("{:-<107}", "");
    for ap in catalog.iter() {
        println!(
            "{:<4} {:<19} {:<4} {:<6} {:<7} {:<14} {:<30} {:<20}",
            ap.rank,
            ap.bssid.to_string(),
            ap.channel,
            ap.power,
            format!("{}%", ap.signal_percent()),
            truncate(&ap.encryption, 14),
            truncate(ap.display_name(), 30),
            truncate(vendor_of(vendors, ap), 20)
        );
    }
    println!("{:-<107}", "");
}

/// Print the outcome of a multi-target run
pub fn print_summary(summary: &RunSummary, format: &str, duration: Duration) -> Result<()> {
    match format.trim().to_lowercase().as_str() {
        "json" | "j" => print_summary_json(summary, duration)?,
        _ => print_summary_table(summary, duration),
    }
    Ok(())
}

fn print_summary_table(summary: &RunSummary, duration: Duration) {
    println!("\n{:-<86}", "");
    println!(
        "{:<30} {:<19} {:<18} {:<17}",
        "NETWORK", "BSSID", "STATUS", "PASSWORD"
    );
    println!("{:-<86}", "");
    for report in &summary.reports {
        let password = match &report.outcome {
            TargetOutcome::Cracked { result } => secret(result),
            _ => String::new(),
        };
        println!(
            "{:<30} {:<19} {:<18} {:<17}",
            truncate(report.target.display_name(), 30),
            report.target.bssid.to_string(),
            report.outcome.label(),
            password
        );
    }
    println!("{:-<86}", "");
    println!("\nSummary:");
    println!("  Targets: {}", summary.total);
    println!("  Handshakes: {}", summary.captured());
    println!("  Cracked: {}", summary.cracked().count());
    println!("  Duration: {}", format_duration(duration));
    if summary.interrupted {
        println!("  Interrupted before all targets finished");
    }
    println!();
}

fn print_summary_json(summary: &RunSummary, duration: Duration) -> Result<()> {
    let output = json!({
        "run_info": {
            "duration_seconds": duration.as_secs_f64(),
            "duration_formatted": format_duration(duration),
            "total_targets": summary.total,
            "interrupted": summary.interrupted,
        },
        "results": serde_json::to_value(&summary.reports)?,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print a single recovery outcome
pub fn print_recovery(network: &str, result: Option<&RecoveryResult>) {
    match result {
        Some(r) => {
            println!("\nPassword found for {}: {}", network, secret(r));
            println!("  Time: {}", format_duration(r.elapsed));
            if let Some(note) = &r.note {
                println!("  Note: {}", note);
            }
        }
        None => println!("\nPassword not found in wordlist for {}.", network),
    }
}

fn secret(result: &RecoveryResult) -> String {
    result
        .passphrase
        .as_ref()
        .map(Passphrase::expose)
        .unwrap_or_default()
        .to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

/// Format duration in a human-readable way
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs == 0 {
        format!("{}ms", millis)
    } else if total_secs < 60 {
        if millis > 0 {
            format!("{}.{:03}s", total_secs, millis)
        } else {
            format!("{}s", total_secs)
        }
    } else {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    }
}
