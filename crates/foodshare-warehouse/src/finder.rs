//! Filtered listing search.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::{QueryResult, SqlParam, Warehouse, WarehouseError};

/// Selector value that means "no filter".
pub const ALL_OPTION: &str = "All";

const FINDER_SELECT: &str = r"
SELECT
    f.Food_ID,
    f.Food_Name,
    f.Quantity,
    f.Expiry_Date,
    f.Provider_ID,
    f.Provider_Type,
    f.Location,
    f.Food_Type,
    f.Meal_Type,
    p.Name AS ProviderName,
    p.Contact AS ProviderContact
FROM food_listings f
LEFT JOIN providers p ON f.Provider_ID = p.Provider_ID";

/// Optional equality filters over listings; `None` leaves a column unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FinderFilter {
    pub location: Option<String>,
    pub food_type: Option<String>,
    pub meal_type: Option<String>,
}

impl FinderFilter {
    /// Build a filter from selector values, treating [`ALL_OPTION`] and blanks as unset.
    pub fn from_selections(location: &str, food_type: &str, meal_type: &str) -> Self {
        Self {
            location: selection(location),
            food_type: selection(food_type),
            meal_type: selection(meal_type),
        }
    }

    /// Query text and bound values for the active filters.
    pub(crate) fn to_query(&self) -> (String, Vec<SqlParam>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        for (column, value) in [
            ("f.Location", &self.location),
            ("f.Food_Type", &self.food_type),
            ("f.Meal_Type", &self.meal_type),
        ] {
            if let Some(value) = value {
                clauses.push(format!("{column} = ?"));
                params.push(SqlParam::from(value.as_str()));
            }
        }

        let mut sql = String::from(FINDER_SELECT);
        if !clauses.is_empty() {
            sql.push_str("\nWHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str("\nORDER BY f.Expiry_Date ASC, f.Food_ID ASC");
        (sql, params)
    }
}

fn selection(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(ALL_OPTION) {
        None
    } else {
        Some(value.to_owned())
    }
}

/// Distinct values offered by the three finder selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FinderOptions {
    pub locations: Vec<String>,
    pub food_types: Vec<String>,
    pub meal_types: Vec<String>,
}

impl Warehouse {
    /// Listings matching every active filter, soonest expiry first.
    ///
    /// No match is an empty result, not an error.
    pub fn find_listings(
        &self,
        filter: &FinderFilter,
    ) -> Result<(Arc<QueryResult>, bool), WarehouseError> {
        let (sql, params) = filter.to_query();
        self.cached_query(&sql, params)
    }

    pub fn finder_options(&self) -> Result<FinderOptions, WarehouseError> {
        Ok(FinderOptions {
            locations: self.distinct_listing_values("Location")?,
            food_types: self.distinct_listing_values("Food_Type")?,
            meal_types: self.distinct_listing_values("Meal_Type")?,
        })
    }

    fn distinct_listing_values(&self, column: &str) -> Result<Vec<String>, WarehouseError> {
        let sql = format!(
            "SELECT DISTINCT {column} FROM food_listings WHERE {column} IS NOT NULL ORDER BY {column}"
        );
        let (result, _) = self.cached_query(&sql, Vec::new())?;
        Ok(result
            .column_values(column)
            .into_iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect())
    }
}
