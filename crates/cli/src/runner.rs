// runner.rs
use anyhow::{anyhow, bail, Context, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use airhook_catalog::{decloak, parse_selection, scan_networks, VendorDb};
use airhook_common::{
    AccessPoint, EngineContext, EngineOptions, Interrupt, MacAddr, ToolRunner, REQUIRED_TOOLS,
};
use airhook_engine::{Engine, PlannedTarget, RecoveryEngine};
use airhook_tools::interface::list_wireless_interfaces;
use airhook_tools::{
    disable_monitor_mode, ensure_root, ensure_tools, is_root, setup_monitor_interface, which,
    MonitorInterface, SystemToolRunner,
};

use crate::args::{CrackArgs, ReusePolicy, RunArgs};
use crate::output::{print_networks, print_recovery, print_summary};
use crate::progress::{spinner, TerminalProgress};

const DEFAULT_WORDLIST: &str = "airhook.txt";
const DEFAULT_WORDS: [&str; 5] = ["password", "12345678", "qwerty123", "admin123", "wifi12345"];

pub async fn run_attack(args: RunArgs, interrupt: Interrupt) -> Result<()> {
    ensure_root().context("This program requires root access. Please run with sudo")?;
    let runner: Arc<dyn ToolRunner> = Arc::new(SystemToolRunner::new());
    ensure_tools(runner.as_ref(), &REQUIRED_TOOLS)
        .context("Please install the aircrack-ng suite")?;

    let options = build_options(&args)?;
    let wordlist = resolve_wordlist(args.wordlist.as_deref()).await?;
    info!("Wordlist: {}", wordlist.display());

    let monitor = setup_monitor_interface(runner.as_ref(), args.interface.as_deref())
        .await
        .context("Failed to prepare a monitor mode interface")?;
    info!("Monitor interface: {}", monitor.name);

    let work_dir = tempfile::Builder::new()
        .prefix("airhook-")
        .tempdir()
        .context("Failed to create working directory")?;
    let ctx = EngineContext::new(Arc::clone(&runner), monitor.name.clone(), work_dir.path())
        .with_handshake_dir(args.handshake_dir.clone())
        .with_results_file(args.results_file.clone())
        .with_options(options)
        .with_interrupt(interrupt);

    let outcome = attack(ctx, &args, &wordlist).await;
    restore_interface(runner.as_ref(), &monitor, args.keep_monitor).await;
    outcome
}

async fn attack(ctx: EngineContext, args: &RunArgs, wordlist: &Path) -> Result<()> {
    let mut catalog = scan_networks(&ctx).await?;
    if catalog.is_empty() {
        warn!("No networks found!");
        return Ok(());
    }
    let vendors = match &args.oui_file {
        Some(path) => VendorDb::load(path)
            .await
            .with_context(|| format!("Failed to read OUI registry {}", path.display()))?,
        None => VendorDb::load_default().await,
    };
    print_networks(&catalog, &vendors, &args.output_format)?;

    let ranks = match &args.targets {
        Some(selection) => parse_selection(selection, catalog.len())?,
        None => match prompt_selection(catalog.len(), &ctx.interrupt).await? {
            Some(ranks) => ranks,
            None => {
                warn!("Interrupted before any target was selected");
                return Ok(());
            }
        },
    };

    let mut targets = Vec::with_capacity(ranks.len());
    for rank in ranks {
        if ctx.interrupt.is_triggered() {
            break;
        }
        let mut target = catalog
            .get(rank)
            .cloned()
            .ok_or_else(|| anyhow!("No network with ID {}", rank))?;
        if target.is_hidden() {
            match decloak(&ctx, &target).await {
                Some(name) => {
                    info!("Target SSID updated to: {}", name);
                    catalog.reveal(target.bssid, &name);
                    target.reveal_name(name);
                }
                None => warn!("Failed to decloak SSID. Proceeding with capture anyway!"),
            }
        }
        targets.push(target);
    }

    let engine = Engine::new(ctx)
        .await
        .with_observer(Arc::new(TerminalProgress::new()));

    let mut plan = Vec::with_capacity(targets.len());
    for target in targets {
        let reuse = match engine.existing_capture(&target) {
            Some(path) => should_reuse(args.reuse_existing, &path, &engine.context().interrupt)
                .await?
                .then_some(path),
            None => None,
        };
        plan.push(PlannedTarget { target, reuse });
    }

    let started = Instant::now();
    let summary = engine.run(plan, wordlist).await;
    summary.log_summary();
    print_summary(&summary, &args.output_format, started.elapsed())?;
    Ok(())
}

pub async fn run_crack(args: CrackArgs) -> Result<()> {
    let runner: Arc<dyn ToolRunner> = Arc::new(SystemToolRunner::new());
    ensure_tools(runner.as_ref(), &["aircrack-ng"])?;

    let bssid: MacAddr = args
        .bssid
        .parse()
        .with_context(|| format!("Invalid BSSID: {}", args.bssid))?;
    let mut target = AccessPoint::new(
        bssid,
        args.channel.unwrap_or(0),
        args.power.unwrap_or(0),
        args.encryption.clone().unwrap_or_default(),
    );
    if let Some(name) = &args.essid {
        target.reveal_name(name.clone());
    }
    let wordlist = resolve_wordlist(args.wordlist.as_deref()).await?;

    let engine = RecoveryEngine::load(runner, args.results_file).await;
    let pb = spinner(format!("Cracking {}", target.display_name()));
    let result = engine.recover(&args.capture, &wordlist, &target).await;
    pb.finish_and_clear();

    print_recovery(target.display_name(), result?.as_ref());
    Ok(())
}

pub async fn run_check() -> Result<()> {
    let runner = SystemToolRunner::new();
    let mut missing = Vec::new();

    println!("\nRequired tools:");
    for tool in REQUIRED_TOOLS {
        match which(tool) {
            Some(path) => println!("  [ok]      {:<12} {}", tool, path.display()),
            None => {
                println!("  [missing] {}", tool);
                missing.push(tool);
            }
        }
    }

    println!("\nRoot: {}", if is_root() { "yes" } else { "no" });
    match list_wireless_interfaces(&runner).await {
        Ok(ifaces) if !ifaces.is_empty() => println!("Wireless interfaces: {}", ifaces.join(", ")),
        Ok(_) => println!("Wireless interfaces: none"),
        Err(e) => println!("Wireless interfaces: unknown ({})", e),
    }
    println!();

    if !missing.is_empty() {
        bail!(
            "Missing dependencies: {}. Install with: sudo apt-get install aircrack-ng",
            missing.join(", ")
        );
    }
    Ok(())
}

/// Preset timings with per-flag overrides.
fn build_options(args: &RunArgs) -> Result<EngineOptions> {
    let mut options = EngineOptions::preset(&args.preset)?;
    if let Some(secs) = args.scan_time {
        options.scan_window = Duration::from_secs(secs);
    }
    if let Some(secs) = args.capture_timeout {
        options.capture_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = args.client_window {
        options.client_window = Duration::from_secs(secs);
    }
    Ok(options)
}

/// The requested wordlist, or `./airhook.txt` created with a few common
/// passwords when none is given.
async fn resolve_wordlist(requested: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = requested {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            bail!("Wordlist not found: {}", path.display());
        }
        return Ok(path.to_path_buf());
    }
    ensure_default_wordlist(Path::new(DEFAULT_WORDLIST)).await
}

async fn ensure_default_wordlist(path: &Path) -> Result<PathBuf> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        let mut content = DEFAULT_WORDS.join("\n");
        content.push('\n');
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to create wordlist {}", path.display()))?;
        info!("Created default wordlist: {}", path.display());
    }
    Ok(path.to_path_buf())
}

async fn should_reuse(policy: ReusePolicy, existing: &Path, interrupt: &Interrupt) -> Result<bool> {
    info!("Found existing handshake file: {}", existing.display());
    match policy {
        ReusePolicy::Yes => Ok(true),
        ReusePolicy::No => Ok(false),
        ReusePolicy::Ask => {
            let answer = prompt("[?] Use existing handshake file and skip capture? (y/n): ", interrupt).await?;
            Ok(answer.is_some_and(|a| is_yes(&a)))
        }
    }
}

/// `None` when interrupted before a valid selection was entered.
async fn prompt_selection(max: usize, interrupt: &Interrupt) -> Result<Option<Vec<usize>>> {
    loop {
        let Some(answer) = prompt("\nSelect target(s) (e.g. 1 or 1,3-4 or all): ", interrupt).await? else {
            return Ok(None);
        };
        match parse_selection(&answer, max) {
            Ok(ranks) => return Ok(Some(ranks)),
            Err(e) => warn!("{}", e),
        }
    }
}

/// Ask on stdout and read one trimmed line. `None` if interrupted first.
async fn prompt(question: &str, interrupt: &Interrupt) -> Result<Option<String>> {
    print!("{}", question);
    std::io::stdout().flush()?;
    read_answer(interrupt, || {
        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        Ok((read > 0).then(|| line.trim().to_string()))
    })
    .await
}

/// Run a blocking read on its own thread and stop waiting once `interrupt`
/// fires. A plain thread is used since a runtime blocking task stuck in
/// `read_line` would hold up shutdown.
async fn read_answer<F>(interrupt: &Interrupt, read: F) -> Result<Option<String>>
where
    F: FnOnce() -> std::io::Result<Option<String>> + Send + 'static,
{
    let (tx, rx) = tokio::sync::oneshot::channel();
    std::thread::spawn(move || {
        let _ = tx.send(read());
    });
    tokio::select! {
        _ = interrupt.triggered() => Ok(None),
        answer = rx => match answer {
            Ok(Ok(Some(line))) => Ok(Some(line)),
            Ok(Ok(None)) => bail!("No input available"),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => bail!("Input reader stopped unexpectedly"),
        },
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

async fn restore_interface(runner: &dyn ToolRunner, monitor: &MonitorInterface, keep: bool) {
    if keep || !monitor.created_by_us() {
        info!("Leaving {} in monitor mode", monitor.name);
        return;
    }
    if let Err(e) = disable_monitor_mode(runner, &monitor.name).await {
        warn!("Failed to restore {}: {}", monitor.name, e);
    }
}
