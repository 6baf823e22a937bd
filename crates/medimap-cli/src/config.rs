use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::LazyLock;

use medimap_core::DEFAULT_YEAR;

static VERSION_INFO: LazyLock<String> = LazyLock::new(|| {
    let version = env!("CARGO_PKG_VERSION");

    // Use VERGEN_GIT_SHA for the commit hash (with safe slicing)
    let commit = option_env!("VERGEN_GIT_SHA")
        .map(|s| s.chars().take(7).collect::<String>())
        .unwrap_or_else(|| "unknown".to_string());

    let built = option_env!("VERGEN_BUILD_DATE").unwrap_or("unknown"); // YYYY-MM-DD
    let target = option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown");
    let rustc = option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown");

    format!("{version}\ncommit: {commit}\nbuilt: {built}\ntarget: {target}\nrustc: {rustc}")
});

pub fn version_info() -> &'static str {
    &VERSION_INFO
}

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "medimap")]
#[command(
    author,
    version = version_info(),
    about = "Territorial statistics of reimbursed drug consumption"
)]
#[command(after_help = "Examples:
  medimap load --create-schema
  medimap load --sources ./sources.toml --year 2023 --replace
  medimap overview --year 2023
  medimap compare 93
  medimap search doliprane --limit 5
  medimap --json regions > regions.json")]
pub struct Config {
    /// PostgreSQL database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Year selection shared by the statistics commands.
#[derive(Args, Debug, Clone, Copy)]
pub struct YearArg {
    /// Year of the statistics
    #[arg(short, long, default_value_t = DEFAULT_YEAR)]
    pub year: i32,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the pre-aggregated CSV extracts into the database
    #[command(after_help = "Examples:
  medimap load                              # Use ~/.config/medimap/sources.toml or built-in paths
  medimap load --sources ./sources.toml     # Use a custom sources file
  medimap load --year 2024 --replace        # Reload a year that is already present
  medimap load --dry-run                    # Parse and validate only")]
    Load {
        /// Path to the sources.toml file naming the CSV extracts
        #[arg(short, long, value_name = "PATH")]
        sources: Option<PathBuf>,

        /// Year the facts are attributed to (overrides the sources file)
        #[arg(short, long)]
        year: Option<i32>,

        /// Replace the aggregate facts of the year if already loaded
        #[arg(long)]
        replace: bool,

        /// Parse and validate the extracts without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Create missing tables before loading
        #[arg(long)]
        create_schema: bool,
    },
    /// Show national totals
    Overview {
        #[command(flatten)]
        year: YearArg,
    },
    /// List regions ranked by reimbursed amount
    Regions {
        #[command(flatten)]
        year: YearArg,
    },
    /// Show the totals of one region
    Region {
        /// Region code (e.g. 11 for Île-de-France)
        code: i32,
        #[command(flatten)]
        year: YearArg,
    },
    /// Compare a region to the mean of all regions
    #[command(after_help = "Example: medimap compare 93 --year 2023")]
    Compare {
        /// Region code
        code: i32,
        #[command(flatten)]
        year: YearArg,
    },
    /// Show each region's share of the national reimbursement
    Shares {
        #[command(flatten)]
        year: YearArg,
    },
    /// List drugs ranked by reimbursed amount
    TopDrugs {
        /// Maximum number of drugs
        #[arg(short, long, default_value = "10")]
        limit: usize,
        #[command(flatten)]
        year: YearArg,
    },
    /// Search drugs by name
    #[command(after_help = "Example: medimap search doliprane --limit 5")]
    Search {
        /// Case-insensitive substring of the drug name (at least 3 characters)
        query: String,
        /// Maximum number of results to return
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}
