//! Listing manager: transactional create, update and delete of food listings.

use ::duckdb::{params, Connection, OptionalExt};
use log::info;
use serde::Serialize;
use serde_json::Value;
use time::{Date, OffsetDateTime};

use crate::models::{Listing, ListingId, ListingUpdate, NewListing};
use crate::{SqlParam, Warehouse, WarehouseError};

const INSERT_LISTING: &str = r"
INSERT INTO food_listings
    (Food_Name, Quantity, Expiry_Date, Provider_ID, Provider_Type, Location, Food_Type, Meal_Type)
VALUES (?, ?, CAST(? AS DATE), ?, ?, ?, ?, ?)
RETURNING Food_ID";

const SELECT_LISTING: &str = r"
SELECT Food_ID, Food_Name, Quantity, Expiry_Date, Provider_ID, Provider_Type, Location, Food_Type, Meal_Type
FROM food_listings
WHERE Food_ID = ?";

/// A provider as offered by the add-listing form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderOption {
    pub provider_id: i64,
    pub name: String,
}

/// A listing as offered by the update/delete selectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingOption {
    pub food_id: ListingId,
    pub food_name: String,
}

impl ListingOption {
    /// `"<id> - <name>"`, as shown in the selector.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.food_id, self.food_name)
    }
}

impl Warehouse {
    /// Validate and store a new listing, returning its assigned id.
    ///
    /// The provider's type is copied onto the listing. Nothing is written when
    /// validation fails or the provider does not exist.
    pub fn insert_listing(&self, listing: &NewListing) -> Result<ListingId, WarehouseError> {
        let today = OffsetDateTime::now_utc().date();
        self.insert_listing_as_of(listing, today)
    }

    pub(crate) fn insert_listing_as_of(
        &self,
        listing: &NewListing,
        today: Date,
    ) -> Result<ListingId, WarehouseError> {
        listing.validate(today)?;

        let food_id = self.with_transaction(|connection| {
            let provider_type = provider_type(connection, listing.provider_id)?;
            let food_id = connection.query_row(
                INSERT_LISTING,
                params![
                    listing.food_name.trim(),
                    listing.quantity,
                    listing.expiry_date.to_string(),
                    listing.provider_id,
                    provider_type,
                    listing.location.trim(),
                    listing.food_type.as_str(),
                    listing.meal_type.as_str(),
                ],
                |row| row.get::<_, i64>(0),
            )?;
            Ok(food_id)
        })?;

        self.cache.invalidate();
        info!(
            "added listing {food_id} ({}) for provider {}",
            listing.food_name.trim(),
            listing.provider_id
        );
        Ok(food_id)
    }

    /// Overwrite the name and quantity of an existing listing.
    pub fn update_listing(&self, update: &ListingUpdate) -> Result<(), WarehouseError> {
        update.validate()?;

        self.with_transaction(|connection| {
            let changed = connection.execute(
                "UPDATE food_listings SET Food_Name = ?, Quantity = ? WHERE Food_ID = ?",
                params![update.food_name.trim(), update.quantity, update.food_id],
            )?;
            ensure_listing_changed(changed, update.food_id)
        })?;

        self.cache.invalidate();
        info!(
            "updated listing {} to quantity {}",
            update.food_id, update.quantity
        );
        Ok(())
    }

    /// Remove exactly one listing.
    pub fn delete_listing(&self, food_id: ListingId) -> Result<(), WarehouseError> {
        self.with_transaction(|connection| {
            let changed =
                connection.execute("DELETE FROM food_listings WHERE Food_ID = ?", [food_id])?;
            ensure_listing_changed(changed, food_id)
        })?;

        self.cache.invalidate();
        info!("deleted listing {food_id}");
        Ok(())
    }

    /// Fetch a single listing by id.
    pub fn get_listing(&self, food_id: ListingId) -> Result<Option<Listing>, WarehouseError> {
        let (result, _) = self.cached_query(SELECT_LISTING, vec![SqlParam::from(food_id)])?;
        let Some(row) = result.rows.first() else {
            return Ok(None);
        };

        let text = |index: usize| row.get(index).and_then(Value::as_str).map(str::to_owned);
        let integer = |index: usize| row.get(index).and_then(Value::as_i64);

        Ok(Some(Listing {
            food_id,
            food_name: text(1),
            quantity: integer(2),
            expiry_date: text(3),
            provider_id: integer(4),
            provider_type: text(5),
            location: text(6),
            food_type: text(7),
            meal_type: text(8),
        }))
    }

    /// Every listing as `(id, name)`, ordered by id.
    pub fn listing_options(&self) -> Result<Vec<ListingOption>, WarehouseError> {
        let (result, _) = self.cached_query(
            "SELECT Food_ID, CAST(Food_Name AS VARCHAR) AS Food_Name FROM food_listings ORDER BY Food_ID",
            Vec::new(),
        )?;
        Ok(result
            .rows
            .iter()
            .filter_map(|row| {
                Some(ListingOption {
                    food_id: row.first()?.as_i64()?,
                    food_name: row.get(1).map(crate::display_value).unwrap_or_default(),
                })
            })
            .collect())
    }

    /// Every provider as `(id, name)`, ordered by name.
    pub fn provider_options(&self) -> Result<Vec<ProviderOption>, WarehouseError> {
        let (result, _) = self.cached_query(
            "SELECT CAST(Provider_ID AS BIGINT) AS Provider_ID, CAST(Name AS VARCHAR) AS Name \
             FROM providers ORDER BY Name, Provider_ID",
            Vec::new(),
        )?;
        Ok(result
            .rows
            .iter()
            .filter_map(|row| {
                Some(ProviderOption {
                    provider_id: row.first()?.as_i64()?,
                    name: row.get(1).map(crate::display_value).unwrap_or_default(),
                })
            })
            .collect())
    }
}

fn provider_type(connection: &Connection, provider_id: i64) -> Result<Option<String>, WarehouseError> {
    connection
        .query_row(
            "SELECT CAST(Type AS VARCHAR) FROM providers WHERE Provider_ID = ? LIMIT 1",
            [provider_id],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()?
        .ok_or_else(|| WarehouseError::NotFound(format!("provider {provider_id}")))
}

fn ensure_listing_changed(changed: usize, food_id: ListingId) -> Result<(), WarehouseError> {
    if changed == 0 {
        Err(WarehouseError::NotFound(format!("listing {food_id}")))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_option_label_joins_id_and_name() {
        let option = ListingOption {
            food_id: 12,
            food_name: String::from("Fruit Salad"),
        };
        assert_eq!(option.label(), "12 - Fruit Salad");
    }

    #[test]
    fn zero_changed_rows_means_not_found() {
        assert!(matches!(
            ensure_listing_changed(0, 99),
            Err(WarehouseError::NotFound(message)) if message == "listing 99"
        ));
        assert!(ensure_listing_changed(1, 99).is_ok());
    }
}
