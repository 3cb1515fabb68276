//! # Foodshare Warehouse
//!
//! DuckDB-backed store for the food redistribution dashboard.
//!
//! ## Overview
//!
//! The warehouse loads four CSV datasets (providers, receivers, food listings,
//! claims) into a single embedded database when it is opened, and exposes
//! everything the dashboard needs on top of it:
//!
//! - **Reports**: a fixed catalog of aggregate queries ([`ReportId`])
//! - **Finder**: filtered listing search ([`FinderFilter`])
//! - **Listing manager**: transactional insert/update/delete of listings
//! - **Ad-hoc runner**: `SELECT`-only free-form SQL
//!
//! Reads go through a [`QueryCache`] keyed by SQL text and bound parameters; every
//! successful write clears it before returning.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use foodshare_warehouse::{ReportId, ReportParams, Warehouse, WarehouseConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open(WarehouseConfig::for_data_dir("./data"))?;
//!
//!     let report = warehouse.run_report(ReportId::TotalQuantity, &ReportParams::default())?;
//!     println!("{}: {}", report.title, report.metric_text());
//!
//!     let (rows, _cache_hit) = warehouse.run_adhoc("SELECT Name FROM providers LIMIT 5")?;
//!     println!("Found {} rows", rows.row_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Tables
//!
//! | Table | Source file |
//! |-------|-------------|
//! | `providers` | `providers_cleaned.csv` |
//! | `receivers` | `receivers_cleaned.csv` |
//! | `food_listings` | `food_listings_cleaned.csv` |
//! | `claims` | `claims_cleaned.csv` |

pub mod adhoc;
pub mod cache;
pub mod duckdb;
pub mod finder;
pub mod listings;
pub mod loader;
pub mod models;
pub mod reports;
pub mod schema;

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ::duckdb::types::{TimeUnit, ToSqlOutput, Value as DuckValue};
use ::duckdb::{params_from_iter, Connection, ToSql};
use log::warn;
use serde::Serialize;
use serde_json::{Number, Value};
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

pub use cache::{CacheStats, QueryCache, QueryKey};
pub use duckdb::{DuckDbConnectionManager, PooledConnection};
pub use finder::{FinderFilter, FinderOptions, ALL_OPTION};
pub use listings::{ListingOption, ProviderOption};
pub use loader::{LoadReport, TableLoad};
pub use models::{FoodType, Listing, ListingId, ListingUpdate, MealType, NewListing};
pub use reports::{DashboardSection, Presentation, ReportId, ReportOutput, ReportParams};
pub use schema::Table;

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` rejected a statement (syntax, type mismatch, constraint).
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// One or more input files are absent; the store cannot be built.
    #[error("missing input file(s): {}", join_paths(.missing))]
    MissingInput { missing: Vec<PathBuf> },

    /// An input file lacks columns the store relies on.
    #[error("table '{table}' is missing required column(s): {}", .columns.join(", "))]
    MissingColumns { table: String, columns: Vec<String> },

    /// Query was rejected before reaching the store.
    #[error("query rejected: {0}")]
    QueryRejected(String),

    /// Form input failed validation; nothing was written.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The referenced provider or listing does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// File names of the four datasets, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSources {
    pub providers: PathBuf,
    pub receivers: PathBuf,
    pub food_listings: PathBuf,
    pub claims: PathBuf,
}

impl Default for DataSources {
    fn default() -> Self {
        Self {
            providers: PathBuf::from("providers_cleaned.csv"),
            receivers: PathBuf::from("receivers_cleaned.csv"),
            food_listings: PathBuf::from("food_listings_cleaned.csv"),
            claims: PathBuf::from("claims_cleaned.csv"),
        }
    }
}

impl DataSources {
    /// File name configured for a table.
    #[must_use]
    pub fn file_for(&self, table: Table) -> &Path {
        match table {
            Table::Providers => self.providers.as_path(),
            Table::Receivers => self.receivers.as_path(),
            Table::FoodListings => self.food_listings.as_path(),
            Table::Claims => self.claims.as_path(),
        }
    }
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Directory holding the CSV datasets.
    pub data_dir: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Dataset file names.
    pub sources: DataSources,
    /// Maximum number of idle connections kept for reuse.
    pub max_pool_size: usize,
    /// Maximum number of memoized query results.
    pub cache_capacity: usize,
    /// Limits applied to every read query.
    pub guardrails: QueryGuardrails,
    /// Claim status labels the dataset is expected to use.
    pub claim_statuses: Vec<String>,
    /// Status label that counts a claim as successful.
    pub successful_status: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self::for_data_dir(resolve_foodshare_home())
    }
}

impl WarehouseConfig {
    /// Configuration reading datasets from `data_dir` and keeping the database
    /// file next to them.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let db_path = data_dir.join("food_wastage.duckdb");
        Self {
            data_dir,
            db_path,
            sources: DataSources::default(),
            max_pool_size: 4,
            cache_capacity: 256,
            guardrails: QueryGuardrails::default(),
            // Both spellings of the cancelled status occur in exported claim files.
            claim_statuses: vec![
                String::from("Completed"),
                String::from("Pending"),
                String::from("Cancelled"),
                String::from("Canceled"),
            ],
            successful_status: String::from("Completed"),
        }
    }

    /// Override the database file location.
    #[must_use]
    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }

    /// Full path of the CSV file backing a table.
    #[must_use]
    pub fn source_path(&self, table: Table) -> PathBuf {
        self.data_dir.join(self.sources.file_for(table))
    }
}

/// Guardrails for query execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryGuardrails {
    /// Maximum number of rows to return.
    pub max_rows: usize,
}

impl Default for QueryGuardrails {
    fn default() -> Self {
        Self { max_rows: 10_000 }
    }
}

/// Column metadata for query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlColumn {
    /// Column name.
    pub name: String,
    /// Column data type.
    #[serde(rename = "type")]
    pub r#type: String,
}

/// Result of a SQL query execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Column definitions.
    pub columns: Vec<SqlColumn>,
    /// Row data as JSON values.
    pub rows: Vec<Vec<Value>>,
    /// Number of rows returned.
    pub row_count: usize,
    /// Whether results were truncated due to the `max_rows` limit.
    pub truncated: bool,
}

impl QueryResult {
    /// `true` when the query legitimately matched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name (case-insensitive).
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.name.eq_ignore_ascii_case(name))
    }

    /// Value at `row` in the named column.
    #[must_use]
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|values| values.get(index))
    }

    /// All values of the named column, in row order.
    #[must_use]
    pub fn column_values(&self, column: &str) -> Vec<&Value> {
        let Some(index) = self.column_index(column) else {
            return Vec::new();
        };
        self.rows.iter().filter_map(|row| row.get(index)).collect()
    }
}

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Text(String),
    Int(i64),
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> ::duckdb::Result<ToSqlOutput<'_>> {
        match self {
            Self::Text(value) => value.to_sql(),
            Self::Int(value) => value.to_sql(),
        }
    }
}

/// The store handle shared by every dashboard component.
///
/// Cloning is cheap; clones share the database instance and the query cache.
#[derive(Clone)]
pub struct Warehouse {
    config: Arc<WarehouseConfig>,
    manager: DuckDbConnectionManager,
    cache: QueryCache,
}

impl Warehouse {
    /// Open the warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open the database and load all four datasets into it.
    ///
    /// # Errors
    /// Returns [`WarehouseError::MissingInput`] without touching the database
    /// when any dataset file is absent.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        Self::open_with_report(config).map(|(warehouse, _)| warehouse)
    }

    /// Like [`Warehouse::open`], also returning what the initial load stored.
    pub fn open_with_report(
        config: WarehouseConfig,
    ) -> Result<(Self, LoadReport), WarehouseError> {
        loader::ensure_sources_exist(&config)?;

        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = DuckDbConnectionManager::open(config.db_path.clone(), config.max_pool_size)?;
        let cache = QueryCache::new(config.cache_capacity);
        let warehouse = Self {
            config: Arc::new(config),
            manager,
            cache,
        };
        let report = warehouse.reload()?;
        Ok((warehouse, report))
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.manager.db_path()
    }

    /// Hit/miss counters of the query cache.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Run a read query through the cache.
    pub(crate) fn cached_query(
        &self,
        sql: &str,
        params: Vec<SqlParam>,
    ) -> Result<(Arc<QueryResult>, bool), WarehouseError> {
        let key = QueryKey::new(sql, params);
        let guardrails = self.config.guardrails;
        self.cache.get_or_try_insert_with(key, |key| {
            let connection = self.manager.acquire()?;
            execute_select_query(&connection, &key.sql, &key.params, guardrails)
        })
    }

    /// Run `work` inside a transaction that commits only if it succeeds.
    pub(crate) fn with_transaction<T>(
        &self,
        work: impl FnOnce(&Connection) -> Result<T, WarehouseError>,
    ) -> Result<T, WarehouseError> {
        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = work(&connection);
        finalize_transaction(connection, result)
    }

    /// Run `work` inside a transaction that is always rolled back.
    pub(crate) fn with_rollback_only<T>(
        &self,
        work: impl FnOnce(&Connection) -> Result<T, WarehouseError>,
    ) -> Result<T, WarehouseError> {
        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = work(&connection);
        let rolled_back = rollback_or_discard(connection);
        match (result, rolled_back) {
            (Err(error), _) => Err(error),
            (Ok(_), Err(error)) => Err(error.into()),
            (Ok(value), Ok(())) => Ok(value),
        }
    }
}

/// Finalize a transaction, committing on success or rolling back on failure.
fn finalize_transaction<T>(
    connection: PooledConnection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => match connection.execute_batch("COMMIT") {
            Ok(()) => Ok(value),
            Err(error) => {
                let _ = rollback_or_discard(connection);
                Err(error.into())
            }
        },
        Err(error) => {
            let _ = rollback_or_discard(connection);
            Err(error)
        }
    }
}

/// Roll back the open transaction.
///
/// A connection that cannot roll back may still hold the transaction, so it is
/// closed instead of going back to the idle pool.
fn rollback_or_discard(connection: PooledConnection) -> Result<(), ::duckdb::Error> {
    match connection.execute_batch("ROLLBACK") {
        Ok(()) => Ok(()),
        Err(error) => {
            warn!("rollback failed, closing connection: {error}");
            connection.discard();
            Err(error)
        }
    }
}

/// Execute a read query with bound parameters and collect the results.
pub(crate) fn execute_select_query(
    connection: &Connection,
    sql: &str,
    params: &[SqlParam],
    guardrails: QueryGuardrails,
) -> Result<QueryResult, WarehouseError> {
    let mut statement = connection.prepare(sql)?;
    // Column metadata is only available once the statement has run.
    let _ = statement.query(params_from_iter(params))?;

    let column_count = statement.column_count();
    let mut columns = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let name = statement
            .column_name(index)
            .map_or_else(|_| format!("column_{index}"), ToString::to_string);
        columns.push(SqlColumn {
            name,
            r#type: statement.column_type(index).to_string(),
        });
    }

    let mut cursor = statement.query(params_from_iter(params))?;
    let mut rows = Vec::new();
    let mut truncated = false;

    while let Some(row) = cursor.next()? {
        if rows.len() >= guardrails.max_rows {
            truncated = true;
            break;
        }
        rows.push(read_row(row, column_count)?);
    }

    Ok(QueryResult {
        columns,
        row_count: rows.len(),
        rows,
        truncated,
    })
}

/// Read a single row from the result set.
fn read_row(row: &::duckdb::Row<'_>, column_count: usize) -> Result<Vec<Value>, ::duckdb::Error> {
    let mut output = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let value: DuckValue = row.get(index)?;
        output.push(to_json_value(value));
    }
    Ok(output)
}

/// Convert a DuckDB value to a JSON value.
fn to_json_value(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(value) => Value::Bool(value),
        DuckValue::TinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::SmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::Int(value) => Value::Number(Number::from(value)),
        DuckValue::BigInt(value) => Value::Number(Number::from(value)),
        // SUM over BIGINT widens to HUGEINT.
        DuckValue::HugeInt(value) => i64::try_from(value)
            .map(|value| Value::Number(Number::from(value)))
            .unwrap_or_else(|_| Value::String(value.to_string())),
        DuckValue::UTinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::USmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::UInt(value) => Value::Number(Number::from(value)),
        DuckValue::UBigInt(value) => Value::Number(Number::from(value)),
        DuckValue::Float(value) => number_from_f64(f64::from(value)),
        DuckValue::Double(value) => number_from_f64(value),
        DuckValue::Decimal(value) => {
            let text = value.to_string();
            text.parse::<f64>()
                .map(number_from_f64)
                .unwrap_or(Value::String(text))
        }
        DuckValue::Text(value) => Value::String(value),
        DuckValue::Blob(value) => Value::String(hex::encode(value)),
        DuckValue::Date32(days) => date_from_days(days)
            .map(|date| Value::String(date.to_string()))
            .unwrap_or(Value::Null),
        DuckValue::Timestamp(unit, value) => timestamp_to_json(unit, value),
        other => Value::String(format!("{other:?}")),
    }
}

/// Convert an f64 to a JSON number, returning Null for NaN/Inf.
fn number_from_f64(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

const UNIX_EPOCH_JULIAN_DAY: i32 = 2_440_588;

fn date_from_days(days: i32) -> Option<Date> {
    let julian_day = UNIX_EPOCH_JULIAN_DAY.checked_add(days)?;
    Date::from_julian_day(julian_day).ok()
}

fn timestamp_to_json(unit: TimeUnit, value: i64) -> Value {
    let value = i128::from(value);
    let nanos = match unit {
        TimeUnit::Second => value * 1_000_000_000,
        TimeUnit::Millisecond => value * 1_000_000,
        TimeUnit::Microsecond => value * 1_000,
        TimeUnit::Nanosecond => value,
    };
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|timestamp| timestamp.format(&Rfc3339).ok())
        .map_or(Value::Null, Value::String)
}

/// Render a JSON cell for display: strings unquoted, nulls blank.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Number(number) => {
            let mut rendered = String::new();
            match number.as_f64() {
                Some(float) if number.is_f64() && float.fract() != 0.0 => {
                    let _ = write!(rendered, "{float:.2}");
                }
                _ => {
                    let _ = write!(rendered, "{number}");
                }
            }
            rendered
        }
        other => other.to_string(),
    }
}

/// Resolve the data directory from `FOODSHARE_HOME` or the working directory.
fn resolve_foodshare_home() -> PathBuf {
    if let Some(path) = env::var_os("FOODSHARE_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    PathBuf::from(".")
}

/// Escape a string for inclusion in a SQL literal.
///
/// Only used for loader file paths; user values are always bound.
pub(crate) fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn connection_that_cannot_roll_back_is_not_reused() {
        let temp = tempdir().expect("tempdir");
        let manager =
            DuckDbConnectionManager::open(temp.path().join("pool.duckdb"), 2).expect("open");

        // No transaction is open, so ROLLBACK fails.
        let broken = manager.acquire().expect("acquire");
        assert!(rollback_or_discard(broken).is_err());
        assert_eq!(manager.idle_count(), 0);

        let healthy = manager.acquire().expect("acquire");
        healthy.execute_batch("BEGIN TRANSACTION").expect("begin");
        rollback_or_discard(healthy).expect("rollback");
        assert_eq!(manager.idle_count(), 1);
    }

    #[test]
    fn hugeint_sums_become_plain_numbers() {
        assert_eq!(to_json_value(DuckValue::HugeInt(100)), Value::from(100));
        let huge = i128::from(i64::MAX) + 1;
        assert_eq!(
            to_json_value(DuckValue::HugeInt(huge)),
            Value::String(huge.to_string())
        );
    }

    #[test]
    fn dates_render_as_iso_strings() {
        // 2025-03-17 is 20164 days after the epoch.
        assert_eq!(
            to_json_value(DuckValue::Date32(20_164)),
            Value::String(String::from("2025-03-17"))
        );
        assert_eq!(
            to_json_value(DuckValue::Date32(0)),
            Value::String(String::from("1970-01-01"))
        );
    }

    #[test]
    fn timestamps_render_as_rfc3339() {
        let rendered = to_json_value(DuckValue::Timestamp(TimeUnit::Second, 86_400));
        assert_eq!(rendered, Value::String(String::from("1970-01-02T00:00:00Z")));
    }

    #[test]
    fn non_finite_doubles_become_null() {
        assert_eq!(to_json_value(DuckValue::Double(f64::NAN)), Value::Null);
    }

    #[test]
    fn display_value_formats_cells() {
        assert_eq!(display_value(&Value::Null), "");
        assert_eq!(display_value(&Value::from("Bread")), "Bread");
        assert_eq!(display_value(&Value::from(42)), "42");
        assert_eq!(display_value(&Value::from(63.333_333)), "63.33");
        assert_eq!(display_value(&Value::from(60.0)), "60.0");
    }

    #[test]
    fn config_resolves_source_paths_under_data_dir() {
        let config = WarehouseConfig::for_data_dir("/srv/foodshare");
        assert_eq!(
            config.source_path(Table::Claims),
            PathBuf::from("/srv/foodshare/claims_cleaned.csv")
        );
        assert_eq!(
            config.db_path,
            PathBuf::from("/srv/foodshare/food_wastage.duckdb")
        );
    }

    #[test]
    fn missing_input_error_lists_every_file() {
        let error = WarehouseError::MissingInput {
            missing: vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")],
        };
        assert_eq!(error.to_string(), "missing input file(s): a.csv, b.csv");
    }
}
