use clap::{Args, Parser, Subcommand};
use migwatch_core::{Style, WatchConfig};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "migwatch")]
#[command(about = "Watch VM migrations with storage-transfer progress", long_about = None)]
#[command(
    after_help = "Environment: NS, INTERVAL, STYLE, SHOW_ERRORS_ONLY=1 and SHOW_EVENTS=1 are honoured; MIGWATCH_<KEY> takes precedence over them."
)]
pub struct Cli {
    /// Configuration file (default: ./Migwatch.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Refresh the dashboard from the cluster using `oc`
    Watch(WatchArgs),
    /// Render the dashboard once from saved `oc get -o json` output
    Snapshot(SnapshotArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Namespace holding plans and migrations
    #[arg(long)]
    pub ns: Option<String>,
    /// Refresh interval in seconds
    #[arg(long)]
    pub interval: Option<u64>,
    /// Render a single refresh and exit
    #[arg(long)]
    pub once: bool,
    #[command(flatten)]
    pub display: DisplayArgs,
}

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// `oc get migration,plan,provider -o json` output
    #[arg(long)]
    pub resources: PathBuf,
    /// `oc get datavolume -A -o json` output
    #[arg(long)]
    pub datavolumes: Option<PathBuf>,
    /// `oc get events -o json` output
    #[arg(long)]
    pub events: Option<PathBuf>,
    #[command(flatten)]
    pub display: DisplayArgs,
}

#[derive(Debug, Args)]
pub struct DisplayArgs {
    /// Output style: pretty or table
    #[arg(long)]
    pub style: Option<Style>,
    /// Show only VMs with errors or failed phases
    #[arg(long)]
    pub errors_only: bool,
    /// Show recent events of the namespace
    #[arg(long)]
    pub show_events: bool,
    /// Include VMs in the Completed phase
    #[arg(long)]
    pub show_completed: bool,
    /// Limit to these plan names
    pub plans: Vec<String>,
}

impl DisplayArgs {
    /// Flags given on the command line win over the loaded configuration.
    pub fn apply(&self, config: &mut WatchConfig) {
        if let Some(style) = self.style {
            config.style = style;
        }
        config.errors_only |= self.errors_only;
        config.show_events |= self.show_events;
        config.show_completed |= self.show_completed;
        if !self.plans.is_empty() {
            config.plans = self.plans.clone();
        }
    }
}

impl WatchArgs {
    pub fn apply(&self, config: &mut WatchConfig) {
        if let Some(ns) = &self.ns {
            config.namespace = ns.clone();
        }
        if let Some(interval) = self.interval {
            config.interval_secs = interval.max(1);
        }
        self.display.apply(config);
    }
}
