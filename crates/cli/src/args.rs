use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "airhook")]
#[command(version = "0.1.0")]
#[command(about = "WPA handshake capture and recovery over the aircrack-ng suite", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan, pick targets, capture handshakes and crack them
    Run(RunArgs),
    /// Run a dictionary attack against an existing capture
    Crack(CrackArgs),
    /// Report which required tools are installed
    Check,
}

/// What to do when a handshake for a target is already stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReusePolicy {
    Yes,
    No,
    Ask,
}

#[derive(Args)]
pub struct RunArgs {
    /// Wireless interface (picked automatically when omitted)
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Wordlist for the dictionary attack
    #[arg(short, long, env = "AIRHOOK_WORDLIST")]
    pub wordlist: Option<PathBuf>,

    /// Targets by ID. Examples: 1 or 1,3-4 or all (prompted when omitted)
    #[arg(short, long)]
    pub targets: Option<String>,

    /// Reuse a stored handshake instead of capturing again
    #[arg(long, value_enum, default_value_t = ReusePolicy::Ask)]
    pub reuse_existing: ReusePolicy,

    /// Timing preset: quick, standard, patient
    #[arg(long, default_value = "standard", value_parser = ["quick", "standard", "patient"])]
    pub preset: String,

    /// Network scan duration in seconds
    #[arg(long)]
    pub scan_time: Option<u64>,

    /// Handshake capture deadline in seconds
    #[arg(long)]
    pub capture_timeout: Option<u64>,

    /// Client discovery window in seconds
    #[arg(long)]
    pub client_window: Option<u64>,

    /// Permanent handshake storage
    #[arg(long, default_value = "handshakes")]
    pub handshake_dir: PathBuf,

    /// Results store (appended to)
    #[arg(long, default_value = "cracked.txt")]
    pub results_file: PathBuf,

    /// Leave the interface in monitor mode on exit
    #[arg(long)]
    pub keep_monitor: bool,

    /// OUI registry for vendor names (defaults to aircrack-ng's copy)
    #[arg(long)]
    pub oui_file: Option<PathBuf>,

    /// Output format: text, json
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    pub output_format: String,
}

#[derive(Args)]
pub struct CrackArgs {
    /// Capture file holding the handshake
    pub capture: PathBuf,

    /// Access point address
    #[arg(short, long)]
    pub bssid: String,

    /// Network name, used for the record and prior-passphrase lookup
    #[arg(short, long)]
    pub essid: Option<String>,

    /// Wordlist for the dictionary attack
    #[arg(short, long, env = "AIRHOOK_WORDLIST")]
    pub wordlist: Option<PathBuf>,

    /// Channel to note in the record
    #[arg(long)]
    pub channel: Option<u32>,

    /// Signal in dBm to note in the record
    #[arg(long, allow_hyphen_values = true)]
    pub power: Option<i32>,

    /// Encryption to note in the record, e.g. "WPA2 CCMP"
    #[arg(long)]
    pub encryption: Option<String>,

    /// Results store (appended to)
    #[arg(long, default_value = "cracked.txt")]
    pub results_file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults() {
        let cli = Cli::parse_from(["airhook", "run"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.reuse_existing, ReusePolicy::Ask);
        assert_eq!(args.preset, "standard");
        assert_eq!(args.results_file, PathBuf::from("cracked.txt"));
        assert!(!args.keep_monitor);
    }

    #[test]
    fn crack_with_options() {
        let cli = Cli::parse_from([
            "airhook", "-vv", "crack", "home.cap", "--bssid", "00:11:22:33:44:55", "--essid", "HomeNet",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Crack(args) = cli.command else {
            panic!("expected crack");
        };
        assert_eq!(args.capture, PathBuf::from("home.cap"));
        assert_eq!(args.essid.as_deref(), Some("HomeNet"));
        assert_eq!((args.channel, args.power), (None, None));
    }

    #[test]
    fn crack_radio_details() {
        let cli = Cli::parse_from([
            "airhook", "crack", "home.cap", "-b", "00:11:22:33:44:55", "--channel", "6", "--power", "-42",
        ]);
        let Commands::Crack(args) = cli.command else {
            panic!("expected crack");
        };
        assert_eq!(args.channel, Some(6));
        assert_eq!(args.power, Some(-42));
        assert!(args.encryption.is_none());
    }

    #[test]
    fn rejects_unknown_preset() {
        assert!(Cli::try_parse_from(["airhook", "run", "--preset", "turbo"]).is_err());
    }
}
