//! Fixed catalog of aggregate reports shown on the dashboard.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::{QueryResult, SqlParam, Warehouse, WarehouseConfig, WarehouseError};

/// How a report is meant to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    /// Plain result table.
    Table,
    /// Single headline number.
    Metric,
    /// Result table plus a bar chart of label (first column) against value (second).
    BarChart,
}

/// Every report the dashboard knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportId {
    ProvidersByCity,
    ReceiversByCity,
    QuantityByProviderType,
    ProviderContacts,
    TopReceivers,
    TotalQuantity,
    TopListingCity,
    FoodTypeDistribution,
    TopClaimedFoods,
    TopCompletedProvider,
    ClaimStatusShare,
    AverageClaimedPerReceiver,
    TopClaimedMealType,
    DonatedByProvider,
    TopReceiverCities,
    AverageQuantityByFoodType,
}

impl ReportId {
    /// Dashboard order.
    pub const ALL: [Self; 16] = [
        Self::ProvidersByCity,
        Self::ReceiversByCity,
        Self::QuantityByProviderType,
        Self::ProviderContacts,
        Self::TopReceivers,
        Self::TotalQuantity,
        Self::TopListingCity,
        Self::FoodTypeDistribution,
        Self::TopClaimedFoods,
        Self::TopCompletedProvider,
        Self::ClaimStatusShare,
        Self::AverageClaimedPerReceiver,
        Self::TopClaimedMealType,
        Self::DonatedByProvider,
        Self::TopReceiverCities,
        Self::AverageQuantityByFoodType,
    ];

    /// Stable identifier used on the command line and in JSON output.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::ProvidersByCity => "providers-by-city",
            Self::ReceiversByCity => "receivers-by-city",
            Self::QuantityByProviderType => "quantity-by-provider-type",
            Self::ProviderContacts => "provider-contacts",
            Self::TopReceivers => "top-receivers",
            Self::TotalQuantity => "total-quantity",
            Self::TopListingCity => "top-listing-city",
            Self::FoodTypeDistribution => "food-type-distribution",
            Self::TopClaimedFoods => "top-claimed-foods",
            Self::TopCompletedProvider => "top-completed-provider",
            Self::ClaimStatusShare => "claim-status-share",
            Self::AverageClaimedPerReceiver => "average-claimed-per-receiver",
            Self::TopClaimedMealType => "top-claimed-meal-type",
            Self::DonatedByProvider => "donated-by-provider",
            Self::TopReceiverCities => "top-receiver-cities",
            Self::AverageQuantityByFoodType => "average-quantity-by-food-type",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::ProvidersByCity => "Providers per city",
            Self::ReceiversByCity => "Receivers per city",
            Self::QuantityByProviderType => "Food quantity by provider type",
            Self::ProviderContacts => "Provider contacts",
            Self::TopReceivers => "Top receivers by claimed quantity",
            Self::TotalQuantity => "Total food quantity available",
            Self::TopListingCity => "City with the most listings",
            Self::FoodTypeDistribution => "Most common food types",
            Self::TopClaimedFoods => "Most claimed food items",
            Self::TopCompletedProvider => "Provider with the most completed claims",
            Self::ClaimStatusShare => "Claims by status (%)",
            Self::AverageClaimedPerReceiver => "Average quantity claimed per receiver",
            Self::TopClaimedMealType => "Most claimed meal type",
            Self::DonatedByProvider => "Total quantity donated by provider",
            Self::TopReceiverCities => "Cities with the most claims",
            Self::AverageQuantityByFoodType => "Average quantity by food type",
        }
    }

    #[must_use]
    pub const fn presentation(self) -> Presentation {
        match self {
            Self::QuantityByProviderType
            | Self::TopReceivers
            | Self::FoodTypeDistribution
            | Self::ClaimStatusShare => Presentation::BarChart,
            Self::TotalQuantity | Self::AverageClaimedPerReceiver => Presentation::Metric,
            _ => Presentation::Table,
        }
    }

    /// Query text; `?` placeholders are bound by [`ReportId::bind`].
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::ProvidersByCity => {
                r"
SELECT City, COUNT(*) AS Provider_Count
FROM providers
GROUP BY City
ORDER BY Provider_Count DESC, City ASC"
            }
            Self::ReceiversByCity => {
                r"
SELECT City, COUNT(*) AS Receiver_Count
FROM receivers
GROUP BY City
ORDER BY Receiver_Count DESC, City ASC"
            }
            Self::QuantityByProviderType => {
                r"
SELECT p.Type AS Provider_Type, CAST(SUM(f.Quantity) AS BIGINT) AS Total_Quantity
FROM food_listings f
JOIN providers p ON f.Provider_ID = p.Provider_ID
GROUP BY p.Type
ORDER BY Total_Quantity DESC, Provider_Type ASC"
            }
            Self::ProviderContacts => {
                r"
SELECT Name, Contact
FROM providers
WHERE City = ?
ORDER BY Name ASC"
            }
            Self::TopReceivers => {
                r"
SELECT r.Name AS Receiver, CAST(SUM(f.Quantity) AS BIGINT) AS Total_Quantity
FROM claims c
JOIN food_listings f ON c.Food_ID = f.Food_ID
JOIN receivers r ON c.Receiver_ID = r.Receiver_ID
GROUP BY r.Name
ORDER BY Total_Quantity DESC, Receiver ASC
LIMIT 10"
            }
            Self::TotalQuantity => {
                r"
SELECT CAST(COALESCE(SUM(Quantity), 0) AS BIGINT) AS Total_Quantity
FROM food_listings"
            }
            Self::TopListingCity => {
                r"
SELECT Location, COUNT(*) AS Listing_Count
FROM food_listings
GROUP BY Location
ORDER BY Listing_Count DESC, Location ASC
LIMIT 1"
            }
            Self::FoodTypeDistribution => {
                r"
SELECT Food_Type, COUNT(*) AS Listing_Count
FROM food_listings
GROUP BY Food_Type
ORDER BY Listing_Count DESC, Food_Type ASC"
            }
            Self::TopClaimedFoods => {
                r"
SELECT f.Food_Name AS Food_Name, COUNT(*) AS Claim_Count
FROM claims c
JOIN food_listings f ON c.Food_ID = f.Food_ID
GROUP BY f.Food_Name
ORDER BY Claim_Count DESC, Food_Name ASC
LIMIT 10"
            }
            Self::TopCompletedProvider => {
                r"
SELECT p.Name AS Provider, COUNT(*) AS Successful_Claims
FROM claims c
JOIN food_listings f ON c.Food_ID = f.Food_ID
JOIN providers p ON f.Provider_ID = p.Provider_ID
WHERE c.Status = ?
GROUP BY p.Name
ORDER BY Successful_Claims DESC, Provider ASC
LIMIT 1"
            }
            Self::ClaimStatusShare => {
                r"
SELECT
    Status,
    CAST(COUNT(*) AS DOUBLE) * 100.0 / NULLIF((SELECT COUNT(*) FROM claims), 0) AS Percentage
FROM claims
GROUP BY Status
ORDER BY Percentage DESC, Status ASC"
            }
            Self::AverageClaimedPerReceiver => {
                r"
SELECT AVG(Total_Quantity) AS Average_Quantity
FROM (
    SELECT c.Receiver_ID, SUM(f.Quantity) AS Total_Quantity
    FROM claims c
    JOIN food_listings f ON c.Food_ID = f.Food_ID
    GROUP BY c.Receiver_ID
) per_receiver"
            }
            Self::TopClaimedMealType => {
                r"
SELECT f.Meal_Type AS Meal_Type, COUNT(*) AS Claim_Count
FROM claims c
JOIN food_listings f ON c.Food_ID = f.Food_ID
GROUP BY f.Meal_Type
ORDER BY Claim_Count DESC, Meal_Type ASC
LIMIT 1"
            }
            Self::DonatedByProvider => {
                r"
SELECT p.Name AS Provider, CAST(SUM(f.Quantity) AS BIGINT) AS Total_Donated
FROM food_listings f
JOIN providers p ON f.Provider_ID = p.Provider_ID
GROUP BY p.Name
ORDER BY Total_Donated DESC, Provider ASC"
            }
            Self::TopReceiverCities => {
                r"
SELECT r.City AS City, COUNT(*) AS Claim_Count
FROM claims c
JOIN receivers r ON c.Receiver_ID = r.Receiver_ID
GROUP BY r.City
ORDER BY Claim_Count DESC, City ASC
LIMIT 5"
            }
            Self::AverageQuantityByFoodType => {
                r"
SELECT Food_Type, AVG(Quantity) AS Average_Quantity
FROM food_listings
GROUP BY Food_Type
ORDER BY Food_Type ASC"
            }
        }
    }

    /// Parameters for this report's placeholders, in order.
    pub fn bind(
        self,
        params: &ReportParams,
        config: &WarehouseConfig,
    ) -> Result<Vec<SqlParam>, WarehouseError> {
        match self {
            Self::ProviderContacts => {
                let city = params.city().ok_or_else(|| {
                    WarehouseError::InvalidInput(format!("report '{}' requires a city", self.slug()))
                })?;
                Ok(vec![SqlParam::from(city)])
            }
            Self::TopCompletedProvider => {
                Ok(vec![SqlParam::from(config.successful_status.as_str())])
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Look a report up by its slug.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim();
        Self::ALL
            .into_iter()
            .find(|report| report.slug().eq_ignore_ascii_case(slug))
    }
}

impl Display for ReportId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// User selections that parameterize reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportParams {
    pub city: Option<String>,
}

impl ReportParams {
    pub fn for_city(city: impl Into<String>) -> Self {
        Self {
            city: Some(city.into()),
        }
    }

    /// Selected city, ignoring blank input.
    #[must_use]
    pub fn city(&self) -> Option<&str> {
        self.city
            .as_deref()
            .map(str::trim)
            .filter(|city| !city.is_empty())
    }
}

/// A report's rows together with how to show them.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    pub id: ReportId,
    pub title: &'static str,
    pub presentation: Presentation,
    pub result: Arc<QueryResult>,
    pub cache_hit: bool,
}

impl ReportOutput {
    /// Headline value of a metric report: first cell of the first row.
    ///
    /// Integers get thousands separators, fractions two decimals, and NULL or an
    /// empty result becomes `n/a`.
    #[must_use]
    pub fn metric_text(&self) -> String {
        match self.result.rows.first().and_then(|row| row.first()) {
            None | Some(Value::Null) => String::from("n/a"),
            Some(Value::Number(number)) => {
                if let Some(integer) = number.as_i64() {
                    group_thousands(integer)
                } else if let Some(float) = number.as_f64() {
                    format!("{float:.2}")
                } else {
                    number.to_string()
                }
            }
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// `(label, value)` pairs for a bar chart; rows with a non-numeric value are skipped.
    #[must_use]
    pub fn chart_points(&self) -> Vec<(String, f64)> {
        self.result
            .rows
            .iter()
            .filter_map(|row| {
                let label = row.first().map(crate::display_value)?;
                let value = row.get(1).and_then(Value::as_f64)?;
                Some((label, value))
            })
            .collect()
    }
}

/// One dashboard widget; a failed report does not hide the others.
#[derive(Debug)]
pub struct DashboardSection {
    pub report: ReportId,
    pub outcome: Result<ReportOutput, WarehouseError>,
}

impl Warehouse {
    /// Run one report through the query cache.
    pub fn run_report(
        &self,
        id: ReportId,
        params: &ReportParams,
    ) -> Result<ReportOutput, WarehouseError> {
        let bound = id.bind(params, self.config())?;
        let (result, cache_hit) = self.cached_query(id.sql(), bound)?;
        debug!(
            "report {id}: {} row(s), cache {}",
            result.row_count,
            if cache_hit { "hit" } else { "miss" }
        );

        Ok(ReportOutput {
            id,
            title: id.title(),
            presentation: id.presentation(),
            result,
            cache_hit,
        })
    }

    /// Run the whole catalog.
    ///
    /// Without a selected city, the contact list uses the first provider city.
    pub fn dashboard(&self, params: &ReportParams) -> Vec<DashboardSection> {
        let params = match params.city() {
            Some(_) => params.clone(),
            None => ReportParams {
                city: self
                    .provider_cities()
                    .ok()
                    .and_then(|cities| cities.into_iter().next()),
            },
        };

        ReportId::ALL
            .into_iter()
            .map(|report| DashboardSection {
                report,
                outcome: self.run_report(report, &params),
            })
            .collect()
    }

    /// Distinct provider cities, sorted, for the city selector.
    pub fn provider_cities(&self) -> Result<Vec<String>, WarehouseError> {
        let (result, _) = self.cached_query(
            "SELECT DISTINCT CAST(City AS VARCHAR) AS City FROM providers WHERE City IS NOT NULL ORDER BY City",
            Vec::new(),
        )?;
        Ok(result
            .column_values("City")
            .into_iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect())
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
