//! Free-form `SELECT` runner.
//!
//! Text must start with `SELECT` (case-insensitive, after trimming) and hold a
//! single statement. It then runs inside a transaction that is always rolled back.

use std::sync::Arc;

use log::{debug, warn};

use crate::{execute_select_query, QueryKey, QueryResult, Warehouse, WarehouseError};

impl Warehouse {
    /// Run a user-supplied `SELECT` and return its rows.
    ///
    /// # Errors
    /// [`WarehouseError::QueryRejected`] before any store interaction when the
    /// text is empty, not `SELECT`-prefixed, or holds several statements. Store
    /// errors are returned with the engine's message.
    pub fn run_adhoc(&self, text: &str) -> Result<(Arc<QueryResult>, bool), WarehouseError> {
        let sql = normalize_sql(text)?;
        let guardrails = self.config().guardrails;

        let outcome = self
            .cache
            .get_or_try_insert_with(QueryKey::new(sql, Vec::new()), |key| {
                self.with_rollback_only(|connection| {
                    execute_select_query(connection, &key.sql, &[], guardrails)
                })
            });

        match &outcome {
            Ok((result, cache_hit)) => debug!(
                "ad-hoc query returned {} row(s){}",
                result.row_count,
                if *cache_hit { " from cache" } else { "" }
            ),
            Err(error) => warn!("ad-hoc query failed: {error}"),
        }
        outcome
    }
}

/// Trim the text and apply the acceptance rules.
pub fn normalize_sql(text: &str) -> Result<String, WarehouseError> {
    let sql = text.trim();
    if sql.is_empty() {
        return Err(WarehouseError::QueryRejected(String::from(
            "query must not be empty",
        )));
    }
    if !is_select_prefixed(sql) {
        return Err(WarehouseError::QueryRejected(String::from(
            "only SELECT queries are allowed",
        )));
    }
    if has_multiple_statements(sql) {
        return Err(WarehouseError::QueryRejected(String::from(
            "only a single statement is allowed",
        )));
    }
    Ok(sql.trim_end_matches(';').trim_end().to_owned())
}

/// `true` when the upper-cased, trimmed text starts with `SELECT`.
#[must_use]
pub fn is_select_prefixed(text: &str) -> bool {
    text.trim().to_uppercase().starts_with("SELECT")
}

/// `true` when a `;` outside string literals is followed by more text.
#[must_use]
pub fn has_multiple_statements(text: &str) -> bool {
    let mut in_single = false;
    let mut in_double = false;
    let mut terminated = false;

    for ch in text.chars() {
        if terminated && !ch.is_whitespace() && ch != ';' {
            return true;
        }
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            ';' if !in_single && !in_double => terminated = true,
            _ => {}
        }
    }
    false
}
