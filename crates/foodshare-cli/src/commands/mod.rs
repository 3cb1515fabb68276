mod dashboard;
mod find;
mod listing;
mod load;
mod report;
mod serve;
mod sql;

use std::time::Instant;

use foodshare_warehouse::{Warehouse, WarehouseConfig};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::metadata::{Envelope, Metadata};

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub latency_ms: u64,
    pub cache_hit: bool,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            latency_ms: 0,
            cache_hit: false,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }
}

/// Run the selected command; `serve` blocks until shutdown and prints nothing.
pub async fn run(cli: &Cli) -> Result<Option<Envelope>, CliError> {
    let config = warehouse_config(cli);
    let started = Instant::now();

    let command_result = match &cli.command {
        Command::Load => load::run(config)?,
        Command::Serve(args) => {
            serve::run(args, config).await?;
            return Ok(None);
        }
        Command::Report(args) => report::run(args, &Warehouse::open(config)?)?,
        Command::Dashboard(args) => dashboard::run(args, &Warehouse::open(config)?)?,
        Command::Find(args) => find::run(args, &Warehouse::open(config)?)?,
        Command::Listing(args) => listing::run(args, &Warehouse::open(config)?)?,
        Command::Sql(args) => sql::run(args, &Warehouse::open(config)?)?,
    };

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let CommandResult {
        data,
        warnings,
        latency_ms: reported_latency,
        cache_hit,
    } = command_result.with_latency(latency_ms);

    let mut meta = Metadata::new(reported_latency, cache_hit);
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(Some(Envelope { meta, data }))
}

/// Data directory from `--data-dir` (else `FOODSHARE_HOME`), database path from `--db-path`.
fn warehouse_config(cli: &Cli) -> WarehouseConfig {
    let config = match &cli.data_dir {
        Some(data_dir) => WarehouseConfig::for_data_dir(data_dir),
        None => WarehouseConfig::default(),
    };

    match &cli.db_path {
        Some(db_path) => config.with_db_path(db_path),
        None => config,
    }
}
