//! Client discovery - stations talking to a target access point

use tracing::{debug, info, instrument, warn};

use airhook_catalog::parse_stations;
use airhook_common::{
    airodump_artifact, remove_artifacts, AccessPoint, Client, EngineContext, ToolCommand,
};

/// Watch the target's channel for the client window and return the distinct
/// stations associated with it.
///
/// An empty result means "cannot proceed" for this target. It is never an
/// error: a missing or unreadable artifact also yields an empty list.
#[instrument(skip(ctx, target), fields(bssid = %target.bssid))]
pub async fn discover_clients(ctx: &EngineContext, target: &AccessPoint) -> Vec<Client> {
    info!("Scanning for connected clients on {}...", target.display_name());

    let prefix = ctx.unique_prefix("clients");
    let cmd = ToolCommand::new("airodump-ng")
        .args(["--bssid", &target.bssid.to_string()])
        .args(["--channel", &target.channel.to_string()])
        .arg("--write")
        .path_arg(&prefix)
        .args(["--output-format", "csv"])
        .arg(ctx.interface.as_str());

    match ctx.observe(&cmd, ctx.options.client_window).await {
        Ok(true) => warn!("Client scan stopped by user"),
        Ok(false) => {}
        Err(e) => {
            warn!("Client scan failed to start: {}", e);
            return Vec::new();
        }
    }

    let artifact = airodump_artifact(&prefix, "csv");
    let clients = match tokio::fs::read(&artifact).await {
        Ok(bytes) => parse_stations(&String::from_utf8_lossy(&bytes), target.bssid),
        Err(e) => {
            debug!("No client artifact at {}: {}", artifact.display(), e);
            Vec::new()
        }
    };
    remove_artifacts(&prefix).await;

    if clients.is_empty() {
        warn!("No connected clients detected for {}", target.display_name());
    } else {
        info!("Found {} connected clients", clients.len());
        for client in &clients {
            debug!("  client {}", client);
        }
    }
    clients
}
