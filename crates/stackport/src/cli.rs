//! Clap derive structures for the `stackport` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// stackport -- move stacked switch configuration onto cloud-managed switches
#[derive(Debug, Parser)]
#[command(
    name = "stackport",
    version,
    about = "Migrate stacked switch port configuration to cloud-managed switches",
    long_about = "Reads the running configuration of a legacy switch stack, maps each\n\
        member's ports onto a replacement device, and applies the port settings\n\
        through the cloud dashboard. Comparison commands check link state and\n\
        MAC locations after the cut-over.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Dashboard API key (overrides config and environment)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Device login tried before the STACKPORT_USERNAME_N credentials
    #[arg(long, short = 'u', global = true, requires = "ask_password")]
    pub username: Option<String>,

    /// Prompt for the password of --username
    #[arg(long, global = true, requires = "username")]
    pub ask_password: bool,

    /// Config file path
    #[arg(long, env = "STACKPORT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "STACKPORT_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Dashboard request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply a legacy stack's port configuration to replacement devices
    Convert(ConvertArgs),

    /// Compare legacy state against the replacement devices
    #[command(subcommand)]
    Compare(CompareCommand),

    /// Save structured device output for a later comparison
    #[command(subcommand)]
    Capture(CaptureCommand),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Replacement devices, in stack-member order.
#[derive(Debug, Args)]
pub struct SerialArgs {
    /// Replacement device serial; repeat once per stack member, in order
    #[arg(long = "serial", short = 's', required = true, value_name = "SERIAL")]
    pub serials: Vec<String>,

    /// Module group that carries access ports (three-part names only)
    #[arg(long)]
    pub access_group: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub target: SerialArgs,

    /// Legacy switch address to read the running configuration from
    #[arg(long, conflicts_with = "config_file", required_unless_present = "config_file")]
    pub host: Option<String>,

    /// Saved running configuration to read instead of a live device
    #[arg(long, value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Plan and validate without updating any port
    #[arg(long)]
    pub dry_run: bool,

    /// Replacement devices updated at once
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Debug, Subcommand)]
pub enum CompareCommand {
    /// Compare interface link state
    Status(CompareStatusArgs),
    /// Compare where each MAC address was learned
    Mac(CompareMacArgs),
}

/// Where legacy records come from.
#[derive(Debug, Args)]
pub struct RecordSourceArgs {
    /// Legacy switch address to query
    #[arg(long, conflicts_with = "records", required_unless_present = "records")]
    pub host: Option<String>,

    /// Records saved by `stackport capture`
    #[arg(long, value_name = "PATH")]
    pub records: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CompareStatusArgs {
    #[command(flatten)]
    pub target: SerialArgs,

    #[command(flatten)]
    pub source: RecordSourceArgs,
}

#[derive(Debug, Args)]
pub struct CompareMacArgs {
    #[command(flatten)]
    pub target: SerialArgs,

    #[command(flatten)]
    pub source: RecordSourceArgs,

    /// Highest end-device port number; 0 compares every port
    #[arg(long)]
    pub uplink_threshold: Option<u32>,

    /// Only compare ports whose name starts with this prefix (repeatable)
    #[arg(long = "port-prefix", value_name = "PREFIX")]
    pub port_prefixes: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum CaptureCommand {
    /// Capture interface link state
    Status(CaptureArgs),
    /// Capture the MAC address table
    Mac(CaptureArgs),
}

#[derive(Debug, Args)]
pub struct CaptureArgs {
    /// Legacy switch address
    #[arg(long)]
    pub host: String,

    /// File to write the records to (JSON)
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
