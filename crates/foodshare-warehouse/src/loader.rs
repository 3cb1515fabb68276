//! CSV loading: materializes the four datasets as tables, replacing prior content.

use std::path::{Path, PathBuf};

use ::duckdb::Connection;
use log::{info, warn};
use serde::Serialize;

use crate::schema::{FOOD_ID_SEQUENCE, FOOD_LISTINGS_DDL, FOOD_LISTINGS_INSERT_COLUMNS};
use crate::{
    escape_sql_string, execute_select_query, QueryGuardrails, Table, Warehouse, WarehouseConfig,
    WarehouseError,
};

/// Rows loaded into one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableLoad {
    pub table: String,
    pub source: PathBuf,
    pub rows: i64,
}

/// Outcome of a full load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub tables: Vec<TableLoad>,
}

impl LoadReport {
    /// Rows loaded into `table`, if it was part of the load.
    #[must_use]
    pub fn rows_for(&self, table: Table) -> Option<i64> {
        self.tables
            .iter()
            .find(|load| load.table == table.name())
            .map(|load| load.rows)
    }
}

impl Warehouse {
    /// Drop and rebuild all four tables from the CSV files.
    ///
    /// The load is all-or-nothing and clears the query cache.
    pub fn reload(&self) -> Result<LoadReport, WarehouseError> {
        ensure_sources_exist(self.config())?;

        let report = self.with_transaction(|connection| load_tables(connection, self.config()))?;
        self.cache.invalidate();

        for load in &report.tables {
            info!(
                "loaded {} rows into {} from {}",
                load.rows,
                load.table,
                load.source.display()
            );
        }

        let unknown = self.unrecognized_claim_statuses()?;
        if !unknown.is_empty() {
            warn!(
                "claims use status label(s) outside the configured set: {}",
                unknown.join(", ")
            );
        }

        Ok(report)
    }

    /// Number of rows currently stored in one of the dataset tables.
    pub fn table_row_count(&self, table: Table) -> Result<i64, WarehouseError> {
        let connection = self.manager.acquire()?;
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let count = connection.query_row(sql.as_str(), [], |row| row.get(0))?;
        Ok(count)
    }

    /// Claim statuses present in the data but absent from the configured set.
    pub fn unrecognized_claim_statuses(&self) -> Result<Vec<String>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(
            "SELECT DISTINCT CAST(Status AS VARCHAR) FROM claims WHERE Status IS NOT NULL ORDER BY 1",
        )?;
        let statuses = statement
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let known = &self.config().claim_statuses;
        Ok(statuses
            .into_iter()
            .filter(|status| !known.iter().any(|label| label == status))
            .collect())
    }
}

/// Fail with every absent dataset path before touching the store.
pub(crate) fn ensure_sources_exist(config: &WarehouseConfig) -> Result<(), WarehouseError> {
    let missing: Vec<PathBuf> = Table::ALL
        .into_iter()
        .map(|table| config.source_path(table))
        .filter(|path| !path.is_file())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(WarehouseError::MissingInput { missing })
    }
}

/// Load every table; the caller owns the surrounding transaction.
fn load_tables(
    connection: &Connection,
    config: &WarehouseConfig,
) -> Result<LoadReport, WarehouseError> {
    let mut tables = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
        let source = config.source_path(table);
        let relation = csv_relation(source.as_path());
        ensure_required_columns(connection, table, relation.as_str())?;

        match table {
            Table::FoodListings => load_food_listings(connection, relation.as_str())?,
            other => connection.execute_batch(
                format!(
                    "CREATE OR REPLACE TABLE {name} AS SELECT * REPLACE ({keys}) FROM {relation};",
                    name = other.name(),
                    keys = key_casts(other),
                )
                .as_str(),
            )?,
        }

        let count_sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let rows: i64 = connection.query_row(count_sql.as_str(), [], |row| row.get(0))?;
        tables.push(TableLoad {
            table: table.name().to_owned(),
            source,
            rows,
        });
    }

    Ok(LoadReport { tables })
}

/// Rebuild `food_listings` with a typed schema and restart its id sequence after
/// the highest loaded id.
fn load_food_listings(connection: &Connection, relation: &str) -> Result<(), WarehouseError> {
    let next_id_sql = format!(
        "SELECT COALESCE(MAX(TRY_CAST(Food_ID AS BIGINT)), 0) + 1 FROM {relation}"
    );
    let next_id: i64 = connection.query_row(next_id_sql.as_str(), [], |row| row.get(0))?;

    connection.execute_batch(
        format!(
            "DROP TABLE IF EXISTS food_listings;
             DROP SEQUENCE IF EXISTS {FOOD_ID_SEQUENCE};
             CREATE SEQUENCE {FOOD_ID_SEQUENCE} START WITH {next_id};"
        )
        .as_str(),
    )?;
    connection.execute_batch(FOOD_LISTINGS_DDL)?;
    connection.execute_batch(
        format!(
            "INSERT INTO food_listings \
             (Food_ID, Food_Name, Quantity, Expiry_Date, Provider_ID, Provider_Type, Location, Food_Type, Meal_Type) \
             SELECT {FOOD_LISTINGS_INSERT_COLUMNS} FROM {relation};"
        )
        .as_str(),
    )?;
    Ok(())
}

/// `REPLACE` list casting a table's identifier columns to `BIGINT`.
fn key_casts(table: Table) -> String {
    table
        .key_columns()
        .iter()
        .map(|column| format!("TRY_CAST({column} AS BIGINT) AS {column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reject a CSV whose header lacks columns the catalog depends on.
fn ensure_required_columns(
    connection: &Connection,
    table: Table,
    relation: &str,
) -> Result<(), WarehouseError> {
    let probe = format!("SELECT * FROM {relation} LIMIT 0");
    let result = execute_select_query(connection, probe.as_str(), &[], QueryGuardrails::default())?;

    let missing: Vec<String> = table
        .required_columns()
        .iter()
        .filter(|required| result.column_index(required).is_none())
        .map(|required| (*required).to_owned())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(WarehouseError::MissingColumns {
            table: table.name().to_owned(),
            columns: missing,
        })
    }
}

/// `read_csv_auto` relation over a file; the path comes from configuration.
fn csv_relation(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    format!(
        "read_csv_auto('{}', header = true)",
        escape_sql_string(path.as_str())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn csv_relation_escapes_quotes_in_paths() {
        let relation = csv_relation(Path::new("/data/o'brien/claims.csv"));
        assert_eq!(
            relation,
            "read_csv_auto('/data/o''brien/claims.csv', header = true)"
        );
    }

    #[test]
    fn claim_keys_are_cast_to_bigint() {
        assert_eq!(
            key_casts(Table::Claims),
            "TRY_CAST(Claim_ID AS BIGINT) AS Claim_ID, \
             TRY_CAST(Food_ID AS BIGINT) AS Food_ID, \
             TRY_CAST(Receiver_ID AS BIGINT) AS Receiver_ID"
        );
    }

    #[test]
    fn missing_sources_are_all_reported() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("providers_cleaned.csv"), "Provider_ID\n1\n").expect("write");

        let config = WarehouseConfig::for_data_dir(temp.path());
        let error = ensure_sources_exist(&config).expect_err("three files are absent");

        match error {
            WarehouseError::MissingInput { missing } => {
                assert_eq!(missing.len(), 3);
                assert!(missing.iter().all(|path| !path.ends_with("providers_cleaned.csv")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_without_required_columns_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let csv = temp.path().join("receivers.csv");
        fs::write(&csv, "Receiver_ID,Name\n1,Hope Shelter\n").expect("write");

        let connection = Connection::open_in_memory().expect("connection");
        let error = ensure_required_columns(
            &connection,
            Table::Receivers,
            csv_relation(csv.as_path()).as_str(),
        )
        .expect_err("City and Contact are missing");

        assert!(matches!(
            error,
            WarehouseError::MissingColumns { ref columns, .. }
                if columns == &vec![String::from("City"), String::from("Contact")]
        ));
    }
}
