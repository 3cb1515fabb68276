//! CLI argument definitions for foodshare.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `load` | Rebuild the database from the CSV files and report row counts |
//! | `serve` | Start the web dashboard |
//! | `report` | Run one report from the catalog |
//! | `dashboard` | Run every report |
//! | `find` | Search listings by location, food type and meal type |
//! | `listing` | Show, add, update or delete a listing |
//! | `sql` | Run a read-only `SELECT` query |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--data-dir` | `$FOODSHARE_HOME` or `.` | Directory holding the CSV files |
//! | `--db-path` | `<data-dir>/food_wastage.duckdb` | Database file |
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//!
//! # Examples
//!
//! ```bash
//! foodshare --data-dir ./data serve --addr 0.0.0.0:8501
//! foodshare report claim-status-share --format table
//! foodshare find --location Springfield --meal-type Dinner
//! foodshare listing add --provider-id 3 --name Soup --quantity 10 \
//!     --expiry 2026-01-31 --location Springfield --food-type Vegan --meal-type Dinner
//! foodshare sql "SELECT City, COUNT(*) FROM receivers GROUP BY City"
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Local food wastage management: donations, claims and listings.
#[derive(Debug, Parser)]
#[command(
    name = "foodshare",
    author,
    version,
    about = "Local food wastage management dashboard",
    long_about = "foodshare loads provider, receiver, listing and claim CSV files into an \
embedded DuckDB database and serves a dashboard over them. Every dashboard view is \
also available as a subcommand with JSON or table output.\n\
\n\
Use 'foodshare <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Directory holding the four *_cleaned.csv files.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Database file (defaults to food_wastage.duckdb in the data directory).
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON envelope.
    Json,
    /// Metadata lines followed by ASCII tables.
    Table,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rebuild all four tables from the CSV files.
    Load,

    /// Serve the web dashboard until interrupted.
    ///
    ///   foodshare serve
    ///   foodshare serve --addr 0.0.0.0:8080
    Serve(ServeArgs),

    /// Run a single report by slug (e.g. claim-status-share).
    Report(ReportArgs),

    /// Run the whole report catalog.
    Dashboard(DashboardArgs),

    /// Find listings; omitted filters (or "All") match everything.
    Find(FindArgs),

    /// Show, add, update or delete food listings.
    Listing(ListingArgs),

    /// Run a read-only SELECT query.
    ///
    ///   foodshare sql "SELECT * FROM claims LIMIT 5"
    Sql(SqlArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value = foodshare_web::DEFAULT_ADDR)]
    pub addr: SocketAddr,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Report slug.
    pub slug: String,

    /// Provider city for the contacts report.
    #[arg(long)]
    pub city: Option<String>,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Provider city for the contacts report (defaults to the first city).
    #[arg(long)]
    pub city: Option<String>,
}

#[derive(Debug, Args)]
pub struct FindArgs {
    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub food_type: Option<String>,

    #[arg(long)]
    pub meal_type: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListingArgs {
    #[command(subcommand)]
    pub command: ListingCommand,
}

#[derive(Debug, Subcommand)]
pub enum ListingCommand {
    /// Print one listing.
    Show(ListingIdArgs),
    /// Add a listing; the id is assigned by the store.
    Add(AddListingArgs),
    /// Change a listing's name and quantity.
    Update(UpdateListingArgs),
    /// Delete a listing.
    Delete(ListingIdArgs),
}

#[derive(Debug, Args)]
pub struct ListingIdArgs {
    pub food_id: i64,
}

#[derive(Debug, Args)]
pub struct AddListingArgs {
    #[arg(long)]
    pub provider_id: i64,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub quantity: i64,

    /// Expiry date as YYYY-MM-DD; must not be in the past.
    #[arg(long)]
    pub expiry: String,

    #[arg(long)]
    pub location: String,

    /// Vegetarian, Non-Vegetarian or Vegan.
    #[arg(long)]
    pub food_type: String,

    /// Breakfast, Lunch, Dinner or Snacks.
    #[arg(long)]
    pub meal_type: String,
}

#[derive(Debug, Args)]
pub struct UpdateListingArgs {
    pub food_id: i64,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub quantity: i64,
}

#[derive(Debug, Args)]
pub struct SqlArgs {
    /// Query text; must start with SELECT.
    pub query: String,
}
