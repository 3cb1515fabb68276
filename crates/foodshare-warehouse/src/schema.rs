//! Table catalog and DDL for the four datasets.

use std::fmt::{Display, Formatter};

/// Sequence backing `food_listings.Food_ID`.
pub const FOOD_ID_SEQUENCE: &str = "food_listings_food_id_seq";

/// The four tables materialized from the CSV datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Providers,
    Receivers,
    FoodListings,
    Claims,
}

impl Table {
    /// Load order; listings come after providers so joins are valid once loaded.
    pub const ALL: [Self; 4] = [
        Self::Providers,
        Self::Receivers,
        Self::FoodListings,
        Self::Claims,
    ];

    /// Table name in the store.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Providers => "providers",
            Self::Receivers => "receivers",
            Self::FoodListings => "food_listings",
            Self::Claims => "claims",
        }
    }

    /// Columns every query in the catalog relies on.
    #[must_use]
    pub const fn required_columns(self) -> &'static [&'static str] {
        match self {
            Self::Providers => &["Provider_ID", "Name", "Type", "City", "Contact"],
            Self::Receivers => &["Receiver_ID", "Name", "City", "Contact"],
            Self::FoodListings => &[
                "Food_ID",
                "Food_Name",
                "Quantity",
                "Expiry_Date",
                "Provider_ID",
                "Provider_Type",
                "Location",
                "Food_Type",
                "Meal_Type",
            ],
            Self::Claims => &["Claim_ID", "Food_ID", "Receiver_ID", "Status"],
        }
    }

    /// Identifier columns normalized to `BIGINT` on load so joins line up even
    /// when a file has no data rows to infer types from.
    #[must_use]
    pub const fn key_columns(self) -> &'static [&'static str] {
        match self {
            Self::Providers => &["Provider_ID"],
            Self::Receivers => &["Receiver_ID"],
            Self::FoodListings => &["Food_ID", "Provider_ID"],
            Self::Claims => &["Claim_ID", "Food_ID", "Receiver_ID"],
        }
    }

    /// Parse a table name as stored.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|table| table.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed definition of `food_listings`; `Food_ID` draws from [`FOOD_ID_SEQUENCE`].
pub(crate) const FOOD_LISTINGS_DDL: &str = r#"
CREATE TABLE food_listings (
    Food_ID BIGINT PRIMARY KEY DEFAULT nextval('food_listings_food_id_seq'),
    Food_Name VARCHAR,
    Quantity BIGINT,
    Expiry_Date DATE,
    Provider_ID BIGINT,
    Provider_Type VARCHAR,
    Location VARCHAR,
    Food_Type VARCHAR,
    Meal_Type VARCHAR
);
"#;

/// Copy listing rows out of a CSV relation, accepting ISO or US dates.
pub(crate) const FOOD_LISTINGS_INSERT_COLUMNS: &str = r"
    CAST(Food_ID AS BIGINT),
    CAST(Food_Name AS VARCHAR),
    CAST(Quantity AS BIGINT),
    COALESCE(
        TRY_CAST(Expiry_Date AS DATE),
        TRY_CAST(TRY_STRPTIME(CAST(Expiry_Date AS VARCHAR), '%m/%d/%Y') AS DATE)
    ),
    CAST(Provider_ID AS BIGINT),
    CAST(Provider_Type AS VARCHAR),
    CAST(Location AS VARCHAR),
    CAST(Food_Type AS VARCHAR),
    CAST(Meal_Type AS VARCHAR)
";
