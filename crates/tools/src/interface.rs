//! Wireless interface discovery and monitor-mode toggling
//!
//! Only issues the well-known `iwconfig` / `airmon-ng` commands; driver state
//! is left entirely to those tools.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use airhook_common::{AirhookError, AirhookResult, ToolCommand, ToolRunner};

static MONITOR_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:Created monitor mode interface|monitor mode enabled on|monitor mode vif enabled for \[\w+\]\w+ on \[\w+\])\s*(\w+)",
    )
    .expect("static regex")
});

/// The interface the engine captures and injects on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorInterface {
    /// Managed-mode interface we switched, if we switched one.
    pub original: Option<String>,
    pub name: String,
}

impl MonitorInterface {
    /// True when this run enabled monitor mode and may want to undo it.
    pub fn created_by_us(&self) -> bool {
        self.original.is_some()
    }
}

/// Interface names from `iwconfig` output.
pub fn parse_wireless_interfaces(iwconfig: &str) -> Vec<String> {
    iwconfig
        .lines()
        .filter(|line| line.contains("IEEE 802.11"))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Name of the monitor interface reported by `airmon-ng start`.
pub fn parse_monitor_name(airmon: &str) -> Option<String> {
    MONITOR_NAME
        .captures(airmon)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub async fn list_wireless_interfaces(runner: &dyn ToolRunner) -> AirhookResult<Vec<String>> {
    let out = runner.run(&ToolCommand::new("iwconfig")).await?;
    // iwconfig prints wireless entries on stdout and the rest on stderr.
    Ok(parse_wireless_interfaces(&out.stdout))
}

pub async fn is_monitor_mode(runner: &dyn ToolRunner, iface: &str) -> bool {
    match runner.run(&ToolCommand::new("iwconfig").arg(iface)).await {
        Ok(out) => out.stdout.contains("Mode:Monitor"),
        Err(_) => false,
    }
}

/// Put `iface` in monitor mode and return the monitor interface name.
pub async fn enable_monitor_mode(runner: &dyn ToolRunner, iface: &str) -> AirhookResult<String> {
    // Failures here are tolerated: airmon-ng start reports the real problem.
    let _ = runner
        .run(&ToolCommand::new("airmon-ng").args(["check", "kill"]))
        .await;
    let _ = runner
        .run(&ToolCommand::new("ifconfig").args([iface, "down"]))
        .await;

    let out = runner
        .run(&ToolCommand::new("airmon-ng").args(["start", iface]))
        .await?;
    if !out.success {
        return Err(AirhookError::Config(format!(
            "failed to enable monitor mode on {iface}"
        )));
    }

    let name = match parse_monitor_name(&out.stdout) {
        Some(name) => name,
        None => find_monitor_interface(runner)
            .await
            .unwrap_or_else(|| format!("{iface}mon")),
    };

    let _ = runner
        .run(&ToolCommand::new("ifconfig").args([name.as_str(), "up"]))
        .await;
    info!("Monitor mode active on {}", name);
    Ok(name)
}

/// Leave monitor mode and give the interface back to NetworkManager.
pub async fn disable_monitor_mode(runner: &dyn ToolRunner, iface: &str) -> AirhookResult<()> {
    let out = runner
        .run(&ToolCommand::new("airmon-ng").args(["stop", iface]))
        .await?;
    if !out.success {
        return Err(AirhookError::Config(format!(
            "failed to disable monitor mode on {iface}"
        )));
    }

    if let Err(e) = runner
        .run(&ToolCommand::new("service").args(["NetworkManager", "restart"]))
        .await
    {
        warn!("NetworkManager restart failed: {}", e);
    }
    info!("Monitor mode disabled on {}", iface);
    Ok(())
}

async fn find_monitor_interface(runner: &dyn ToolRunner) -> Option<String> {
    let ifaces = list_wireless_interfaces(runner).await.ok()?;
    for iface in ifaces {
        if is_monitor_mode(runner, &iface).await {
            return Some(iface);
        }
    }
    None
}

/// Pick the interface for this run: an explicit choice, an interface already
/// in monitor mode, or the first wireless interface switched to monitor mode.
pub async fn setup_monitor_interface(
    runner: &dyn ToolRunner,
    preferred: Option<&str>,
) -> AirhookResult<MonitorInterface> {
    let interfaces = list_wireless_interfaces(runner).await?;

    if let Some(wanted) = preferred {
        if is_monitor_mode(runner, wanted).await {
            info!("Interface {} already in monitor mode", wanted);
            return Ok(MonitorInterface {
                original: None,
                name: wanted.to_string(),
            });
        }
        let name = enable_monitor_mode(runner, wanted).await?;
        return Ok(MonitorInterface {
            original: Some(wanted.to_string()),
            name,
        });
    }

    if interfaces.is_empty() {
        return Err(AirhookError::NoInterface);
    }

    for iface in &interfaces {
        if is_monitor_mode(runner, iface).await {
            info!("Interface {} already in monitor mode", iface);
            return Ok(MonitorInterface {
                original: None,
                name: iface.clone(),
            });
        }
    }

    let first = &interfaces[0];
    info!("Using interface {}", first);
    let name = enable_monitor_mode(runner, first).await?;
    Ok(MonitorInterface {
        original: Some(first.clone()),
        name,
    })
}
