//! Clap derive structures for the `rasd` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// rasd -- facility maps and camera streams for the RASD dashboard
#[derive(Debug, Parser)]
#[command(
    name = "rasd",
    version,
    about = "Manage RASD facility maps and camera stream connections",
    long_about = "Draw, list and export monitored facilities, and configure and test\n\
        the live camera streams shown on the RASD operations dashboard.",
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
    /// Directory holding facilities and stream configuration
    #[arg(long, env = "RASD_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "RASD_OUTPUT",
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Draw, inspect and export facilities
    #[command(alias = "fac", alias = "f")]
    Facilities(FacilitiesArgs),

    /// Configure and test camera streams
    #[command(alias = "s")]
    Streams(StreamsArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Facilities ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FacilitiesArgs {
    #[command(subcommand)]
    pub command: FacilitiesCommand,
}

#[derive(Debug, Subcommand)]
pub enum FacilitiesCommand {
    /// List all facilities
    #[command(alias = "ls")]
    List,

    /// Show one facility in detail
    Show {
        /// Facility ID
        id: String,
    },

    /// Draw a new facility from map points
    Add {
        /// Shape to draw
        #[arg(long, short = 'k', default_value = "polygon")]
        kind: ShapeKind,

        /// Clicked point as LAT,LNG (repeat; 2 for a rectangle, 3+ for a polygon)
        #[arg(long = "point", short = 'p', required = true, value_parser = parse_point)]
        points: Vec<(f64, f64)>,

        /// Name (defaults to "Facility N")
        #[arg(long, short = 'n')]
        name: Option<String>,
    },

    /// Rename a facility
    Rename {
        /// Facility ID
        id: String,

        /// New name
        name: String,
    },

    /// Delete a facility
    #[command(alias = "rm")]
    Delete {
        /// Facility ID
        id: String,
    },

    /// Delete every facility
    Clear,

    /// Export facilities as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },

    /// Add the three sample facilities
    Seed,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ShapeKind {
    /// Two opposite corners
    Rectangle,
    /// Three or more vertices
    Polygon,
}

/// Parse `LAT,LNG` in decimal degrees.
pub fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got '{s}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lng.trim()))?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {lat} is outside -90..=90"));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(format!("longitude {lng} is outside -180..=180"));
    }
    Ok((lat, lng))
}

// ── Streams ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StreamsArgs {
    #[command(subcommand)]
    pub command: StreamsCommand,
}

#[derive(Debug, Subcommand)]
pub enum StreamsCommand {
    /// List configured camera streams
    #[command(alias = "ls")]
    List,

    /// Set the stream source of a camera
    Set {
        /// Camera ID
        camera: String,

        /// Stream URL (HLS manifest, HTTP-FLV or MP4)
        url: String,

        /// Transport (auto-detected from the URL by default)
        #[arg(long = "type", short = 't', default_value = "auto")]
        transport: TransportArg,
    },

    /// Remove a camera's stream source
    #[command(alias = "rm")]
    Remove {
        /// Camera ID
        camera: String,
    },

    /// Show which transport a URL would use
    Detect {
        /// Stream URL
        url: String,
    },

    /// Connect every configured camera and report status
    Connect {
        /// Keep connections up for this many seconds, printing status changes
        #[arg(long, short = 'w', default_value = "0")]
        watch: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TransportArg {
    Auto,
    Hls,
    Flv,
    Mp4,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display current resolved configuration
    Show,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
