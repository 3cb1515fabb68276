use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::format_description;
use time::Date;

use crate::WarehouseError;

/// Identity of a row in `food_listings`.
pub type ListingId = i64;

/// Dietary category of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FoodType {
    Vegetarian,
    NonVegetarian,
    Vegan,
}

impl FoodType {
    pub const ALL: [Self; 3] = [Self::Vegetarian, Self::NonVegetarian, Self::Vegan];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vegetarian => "Vegetarian",
            Self::NonVegetarian => "Non-Vegetarian",
            Self::Vegan => "Vegan",
        }
    }
}

impl FromStr for FoodType {
    type Err = WarehouseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                WarehouseError::InvalidInput(format!(
                    "unknown food type '{trimmed}' (expected Vegetarian, Non-Vegetarian or Vegan)"
                ))
            })
    }
}

impl TryFrom<String> for FoodType {
    type Error = WarehouseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FoodType> for String {
    fn from(value: FoodType) -> Self {
        value.as_str().to_owned()
    }
}

impl Display for FoodType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Meal slot a listing is intended for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl MealType {
    pub const ALL: [Self; 4] = [Self::Breakfast, Self::Lunch, Self::Dinner, Self::Snacks];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "Breakfast",
            Self::Lunch => "Lunch",
            Self::Dinner => "Dinner",
            Self::Snacks => "Snacks",
        }
    }
}

impl FromStr for MealType {
    type Err = WarehouseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                WarehouseError::InvalidInput(format!(
                    "unknown meal type '{trimmed}' (expected Breakfast, Lunch, Dinner or Snacks)"
                ))
            })
    }
}

impl TryFrom<String> for MealType {
    type Error = WarehouseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MealType> for String {
    fn from(value: MealType) -> Self {
        value.as_str().to_owned()
    }
}

impl Display for MealType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a `YYYY-MM-DD` form value.
pub fn parse_date(input: &str) -> Result<Date, WarehouseError> {
    let trimmed = input.trim();
    let format = format_description::parse("[year]-[month]-[day]")
        .map_err(|error| WarehouseError::InvalidInput(error.to_string()))?;
    Date::parse(trimmed, &format).map_err(|error| {
        WarehouseError::InvalidInput(format!(
            "invalid date '{trimmed}' (expected YYYY-MM-DD): {error}"
        ))
    })
}

/// A listing to be created; the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListing {
    pub provider_id: i64,
    pub food_name: String,
    pub quantity: i64,
    pub expiry_date: Date,
    pub location: String,
    pub food_type: FoodType,
    pub meal_type: MealType,
}

impl NewListing {
    /// Check the form rules against `today`.
    pub fn validate(&self, today: Date) -> Result<(), WarehouseError> {
        if self.food_name.trim().is_empty() {
            return Err(WarehouseError::InvalidInput(String::from(
                "food name must not be empty",
            )));
        }
        if self.location.trim().is_empty() {
            return Err(WarehouseError::InvalidInput(String::from(
                "location must not be empty",
            )));
        }
        validate_quantity(self.quantity)?;
        if self.expiry_date < today {
            return Err(WarehouseError::InvalidInput(format!(
                "expiry date {} is earlier than today ({today})",
                self.expiry_date
            )));
        }
        Ok(())
    }
}

/// New name and quantity for an existing listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingUpdate {
    pub food_id: ListingId,
    pub food_name: String,
    pub quantity: i64,
}

impl ListingUpdate {
    pub fn validate(&self) -> Result<(), WarehouseError> {
        if self.food_name.trim().is_empty() {
            return Err(WarehouseError::InvalidInput(String::from(
                "food name must not be empty",
            )));
        }
        validate_quantity(self.quantity)
    }
}

fn validate_quantity(quantity: i64) -> Result<(), WarehouseError> {
    if quantity < 1 {
        return Err(WarehouseError::InvalidInput(format!(
            "quantity must be at least 1 (got {quantity})"
        )));
    }
    Ok(())
}

/// A stored listing as read back from `food_listings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub food_id: ListingId,
    pub food_name: Option<String>,
    pub quantity: Option<i64>,
    pub expiry_date: Option<String>,
    pub provider_id: Option<i64>,
    pub provider_type: Option<String>,
    pub location: Option<String>,
    pub food_type: Option<String>,
    pub meal_type: Option<String>,
}
