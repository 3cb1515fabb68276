//! Behavior-driven tests for the warehouse: loading, reports, and the finder.
//!
//! These tests verify WHAT a dashboard user sees after the four datasets are
//! loaded, using the small fixture files under `tests/fixtures/`.

use foodshare_warehouse::{
    FinderFilter, Presentation, ReportId, ReportParams, Table, Warehouse, WarehouseConfig,
    WarehouseError,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/fixtures"))
}

fn open_warehouse(temp: &TempDir) -> Warehouse {
    Warehouse::open(
        WarehouseConfig::for_data_dir(fixtures_dir())
            .with_db_path(temp.path().join("food_wastage.duckdb")),
    )
    .expect("warehouse open")
}

/// Copy the fixture CSVs into `dir` so a test can edit or remove them.
fn copy_fixtures(dir: &Path) {
    for table in Table::ALL {
        let name = format!("{}_cleaned.csv", table.name());
        fs::copy(fixtures_dir().join(&name), dir.join(&name)).expect("copy fixture");
    }
}

fn texts(values: Vec<&Value>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.as_str().unwrap_or_default().to_owned())
        .collect()
}

fn integers(values: Vec<&Value>) -> Vec<i64> {
    values
        .into_iter()
        .map(|value| value.as_i64().expect("integer cell"))
        .collect()
}

// =============================================================================
// Loader
// =============================================================================

#[test]
fn when_the_app_starts_every_csv_row_becomes_a_table_row() {
    // Given: The four fixture files
    let temp = tempdir().expect("tempdir");

    // When: The warehouse is opened
    let warehouse = open_warehouse(&temp);

    // Then: Each table holds exactly the data rows of its file
    assert_eq!(warehouse.table_row_count(Table::Providers).expect("count"), 4);
    assert_eq!(warehouse.table_row_count(Table::Receivers).expect("count"), 3);
    assert_eq!(warehouse.table_row_count(Table::FoodListings).expect("count"), 5);
    assert_eq!(warehouse.table_row_count(Table::Claims).expect("count"), 10);
    assert!(temp.path().join("food_wastage.duckdb").exists());
}

#[test]
fn when_data_is_reloaded_the_contents_are_identical() {
    // Given: A loaded warehouse and the finder's view of it
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);
    let (before, _) = warehouse
        .find_listings(&FinderFilter::default())
        .expect("finder");

    // When: The same files are loaded again
    let report = warehouse.reload().expect("reload");

    // Then: Row counts and rows are unchanged
    assert_eq!(report.rows_for(Table::FoodListings), Some(5));
    assert_eq!(report.rows_for(Table::Claims), Some(10));
    let (after, cache_hit) = warehouse
        .find_listings(&FinderFilter::default())
        .expect("finder");
    assert!(!cache_hit, "reload must clear the cache");
    assert_eq!(before.rows, after.rows);
}

#[test]
fn when_an_input_file_is_missing_no_store_is_produced() {
    // Given: A data directory without the claims file
    let temp = tempdir().expect("tempdir");
    copy_fixtures(temp.path());
    fs::remove_file(temp.path().join("claims_cleaned.csv")).expect("remove");

    // When: The warehouse is opened
    let error = match Warehouse::open(WarehouseConfig::for_data_dir(temp.path())) {
        Ok(_) => panic!("open should fail without claims"),
        Err(error) => error,
    };

    // Then: The error names the file and no database was created
    match error {
        WarehouseError::MissingInput { missing } => {
            assert_eq!(missing, vec![temp.path().join("claims_cleaned.csv")]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!temp.path().join("food_wastage.duckdb").exists());
}

#[test]
fn when_a_file_lacks_required_columns_the_load_names_them() {
    // Given: A receivers file without a City column
    let temp = tempdir().expect("tempdir");
    copy_fixtures(temp.path());
    fs::write(
        temp.path().join("receivers_cleaned.csv"),
        "Receiver_ID,Name,Contact\n1,Hope Shelter,(555) 020-2001\n",
    )
    .expect("write");

    // When: The warehouse is opened
    let error = match Warehouse::open(WarehouseConfig::for_data_dir(temp.path())) {
        Ok(_) => panic!("open should fail"),
        Err(error) => error,
    };

    // Then: The message points at the table and column
    assert_eq!(
        error.to_string(),
        "table 'receivers' is missing required column(s): City"
    );
}

#[test]
fn when_claims_use_an_unknown_status_it_is_reported_not_rejected() {
    // Given: A claims file with a status outside the configured set
    let temp = tempdir().expect("tempdir");
    copy_fixtures(temp.path());
    fs::write(
        temp.path().join("claims_cleaned.csv"),
        "Claim_ID,Food_ID,Receiver_ID,Status,Timestamp\n\
         1,1,1,Completed,2025-03-10 09:15:00\n\
         2,2,2,Expired,2025-03-10 11:30:00\n",
    )
    .expect("write");

    // When: The warehouse is opened
    let warehouse = Warehouse::open(WarehouseConfig::for_data_dir(temp.path())).expect("open");

    // Then: The load succeeds and the odd label is discoverable
    assert_eq!(warehouse.table_row_count(Table::Claims).expect("count"), 2);
    assert_eq!(
        warehouse.unrecognized_claim_statuses().expect("statuses"),
        vec![String::from("Expired")]
    );
}

#[test]
fn when_expiry_dates_use_us_format_they_still_load_as_dates() {
    // Given: Listings with MM/DD/YYYY dates
    let temp = tempdir().expect("tempdir");
    copy_fixtures(temp.path());
    fs::write(
        temp.path().join("food_listings_cleaned.csv"),
        "Food_ID,Food_Name,Quantity,Expiry_Date,Provider_ID,Provider_Type,Location,Food_Type,Meal_Type\n\
         7,Soup,12,03/21/2025,1,Grocery Store,Springfield,Vegan,Dinner\n",
    )
    .expect("write");

    // When: The warehouse is opened
    let warehouse = Warehouse::open(WarehouseConfig::for_data_dir(temp.path())).expect("open");

    // Then: The date is stored as a proper DATE
    let listing = warehouse.get_listing(7).expect("query").expect("listing 7");
    assert_eq!(listing.expiry_date.as_deref(), Some("2025-03-21"));
}

// =============================================================================
// Reports
// =============================================================================

#[test]
fn total_quantity_is_a_formatted_metric() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);

    let report = warehouse
        .run_report(ReportId::TotalQuantity, &ReportParams::default())
        .expect("report");

    assert_eq!(report.presentation, Presentation::Metric);
    assert_eq!(report.metric_text(), "100");
}

#[test]
fn claim_status_share_sums_to_one_hundred() {
    // Given: Claims with 6 Completed, 3 Pending, 1 Cancelled
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);

    // When: The status share report runs
    let report = warehouse
        .run_report(ReportId::ClaimStatusShare, &ReportParams::default())
        .expect("report");

    // Then: Shares are 60/30/10, largest first
    assert_eq!(
        texts(report.result.column_values("Status")),
        vec!["Completed", "Pending", "Cancelled"]
    );
    let shares: Vec<f64> = report
        .result
        .column_values("Percentage")
        .into_iter()
        .map(|value| value.as_f64().expect("share"))
        .collect();
    assert_eq!(shares, vec![60.0, 30.0, 10.0]);
    assert_eq!(report.chart_points().len(), 3);
}

#[test]
fn claim_status_shares_are_not_rounded_in_the_store() {
    // Given: One claim per status, so each share is a repeating third
    let temp = tempdir().expect("tempdir");
    copy_fixtures(temp.path());
    fs::write(
        temp.path().join("claims_cleaned.csv"),
        concat!(
            "Claim_ID,Food_ID,Receiver_ID,Status,Timestamp\n",
            "1,1,1,Completed,2025-03-10 09:15:00\n",
            "2,2,2,Pending,2025-03-10 11:30:00\n",
            "3,3,3,Canceled,2025-03-11 08:45:00\n",
        ),
    )
    .expect("write");
    let warehouse = Warehouse::open(WarehouseConfig::for_data_dir(temp.path())).expect("open");
    assert!(warehouse
        .unrecognized_claim_statuses()
        .expect("statuses")
        .is_empty());

    // When: The status share report runs
    let report = warehouse
        .run_report(ReportId::ClaimStatusShare, &ReportParams::default())
        .expect("report");

    // Then: The exact shares still add up to 100
    let shares: Vec<f64> = report
        .result
        .column_values("Percentage")
        .into_iter()
        .map(|value| value.as_f64().expect("share"))
        .collect();
    assert_eq!(shares.len(), 3);
    let total: f64 = shares.iter().sum();
    assert!((total - 100.0).abs() < 1e-9, "shares sum to {total}");
    assert!(shares.iter().all(|share| (share - 100.0 / 3.0).abs() < 1e-9));

    // And: Display still shows two decimals
    assert_eq!(foodshare_warehouse::display_value(&report.result.rows[0][1]), "33.33");
}

#[test]
fn quantity_by_provider_type_is_ordered_largest_first() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);

    let report = warehouse
        .run_report(ReportId::QuantityByProviderType, &ReportParams::default())
        .expect("report");

    assert_eq!(report.presentation, Presentation::BarChart);
    assert_eq!(
        texts(report.result.column_values("Provider_Type")),
        vec!["Restaurant", "Supermarket", "Grocery Store", "Catering Service"]
    );
    assert_eq!(
        integers(report.result.column_values("Total_Quantity")),
        vec![40, 30, 20, 10]
    );
}

#[test]
fn receiver_reports_aggregate_claimed_quantities() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);
    let params = ReportParams::default();

    let top = warehouse
        .run_report(ReportId::TopReceivers, &params)
        .expect("top receivers");
    assert_eq!(
        texts(top.result.column_values("Receiver")),
        vec!["Community Pantry", "Hope Shelter", "Youth Center"]
    );
    assert_eq!(
        integers(top.result.column_values("Total_Quantity")),
        vec![70, 65, 55]
    );

    let average = warehouse
        .run_report(ReportId::AverageClaimedPerReceiver, &params)
        .expect("average");
    assert_eq!(average.metric_text(), "63.33");

    let cities = warehouse
        .run_report(ReportId::TopReceiverCities, &params)
        .expect("cities");
    assert_eq!(
        texts(cities.result.column_values("City")),
        vec!["Springfield", "Shelbyville"]
    );
    assert_eq!(integers(cities.result.column_values("Claim_Count")), vec![6, 4]);
}

#[test]
fn single_row_leaders_are_reported() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);
    let params = ReportParams::default();

    let provider = warehouse
        .run_report(ReportId::TopCompletedProvider, &params)
        .expect("provider");
    assert_eq!(provider.result.row_count, 1);
    assert_eq!(provider.result.value(0, "Provider"), Some(&Value::from("Harbor Bistro")));
    assert_eq!(provider.result.value(0, "Successful_Claims"), Some(&Value::from(3)));

    let meal = warehouse
        .run_report(ReportId::TopClaimedMealType, &params)
        .expect("meal");
    assert_eq!(meal.result.value(0, "Meal_Type"), Some(&Value::from("Dinner")));
    assert_eq!(meal.result.value(0, "Claim_Count"), Some(&Value::from(4)));

    let city = warehouse
        .run_report(ReportId::TopListingCity, &params)
        .expect("city");
    assert_eq!(city.result.value(0, "Location"), Some(&Value::from("Springfield")));
    assert_eq!(city.result.value(0, "Listing_Count"), Some(&Value::from(3)));
}

#[test]
fn listing_reports_group_by_food_and_provider() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);
    let params = ReportParams::default();

    let foods = warehouse
        .run_report(ReportId::TopClaimedFoods, &params)
        .expect("foods");
    assert_eq!(
        texts(foods.result.column_values("Food_Name")),
        vec!["Chicken Curry", "Rice Bowls", "Fruit Salad", "Bread"]
    );

    let types = warehouse
        .run_report(ReportId::FoodTypeDistribution, &params)
        .expect("types");
    assert_eq!(
        texts(types.result.column_values("Food_Type")),
        vec!["Vegetarian", "Non-Vegetarian", "Vegan"]
    );
    assert_eq!(integers(types.result.column_values("Listing_Count")), vec![3, 1, 1]);

    let averages = warehouse
        .run_report(ReportId::AverageQuantityByFoodType, &params)
        .expect("averages");
    let vegetarian = averages
        .result
        .rows
        .iter()
        .find(|row| row[0] == Value::from("Vegetarian"))
        .expect("vegetarian row");
    assert_eq!(vegetarian[1].as_f64(), Some(25.0));

    let donated = warehouse
        .run_report(ReportId::DonatedByProvider, &params)
        .expect("donated");
    assert_eq!(
        texts(donated.result.column_values("Provider")),
        vec!["Harbor Bistro", "Corner Market", "Green Grocer", "Maple Catering"]
    );
}

#[test]
fn city_counts_break_ties_alphabetically() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);

    let providers = warehouse
        .run_report(ReportId::ProvidersByCity, &ReportParams::default())
        .expect("providers");

    assert_eq!(
        texts(providers.result.column_values("City")),
        vec!["Springfield", "Capital City", "Shelbyville"]
    );
    assert_eq!(
        integers(providers.result.column_values("Provider_Count")),
        vec![2, 1, 1]
    );
}

#[test]
fn provider_contacts_follow_the_selected_city() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);

    let contacts = warehouse
        .run_report(ReportId::ProviderContacts, &ReportParams::for_city("Springfield"))
        .expect("contacts");
    assert_eq!(
        texts(contacts.result.column_values("Name")),
        vec!["Green Grocer", "Harbor Bistro"]
    );

    let nowhere = warehouse
        .run_report(ReportId::ProviderContacts, &ReportParams::for_city("Atlantis"))
        .expect("no contacts is not an error");
    assert!(nowhere.result.is_empty());

    assert!(matches!(
        warehouse.run_report(ReportId::ProviderContacts, &ReportParams::default()),
        Err(WarehouseError::InvalidInput(_))
    ));
}

#[test]
fn repeated_reports_are_served_from_cache() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);
    let params = ReportParams::default();

    let first = warehouse
        .run_report(ReportId::DonatedByProvider, &params)
        .expect("first");
    let second = warehouse
        .run_report(ReportId::DonatedByProvider, &params)
        .expect("second");

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(first.result, second.result);
    assert!(warehouse.cache_stats().hits >= 1);
}

#[test]
fn dashboard_runs_the_whole_catalog() {
    // Given: No city selected
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);

    // When: The dashboard renders
    let sections = warehouse.dashboard(&ReportParams::default());

    // Then: Every report succeeds and contacts default to the first city
    assert_eq!(sections.len(), ReportId::ALL.len());
    assert!(sections.iter().all(|section| section.outcome.is_ok()));
    let contacts = sections
        .iter()
        .find(|section| section.report == ReportId::ProviderContacts)
        .and_then(|section| section.outcome.as_ref().ok())
        .expect("contacts section");
    assert_eq!(texts(contacts.result.column_values("Name")), vec!["Corner Market"]);
    assert_eq!(
        warehouse.provider_cities().expect("cities"),
        vec!["Capital City", "Shelbyville", "Springfield"]
    );
}

#[test]
fn with_zero_claims_shares_are_empty_and_averages_are_unavailable() {
    // Given: A claims file with a header and no rows
    let temp = tempdir().expect("tempdir");
    copy_fixtures(temp.path());
    fs::write(
        temp.path().join("claims_cleaned.csv"),
        "Claim_ID,Food_ID,Receiver_ID,Status,Timestamp\n",
    )
    .expect("write");
    let warehouse = Warehouse::open(WarehouseConfig::for_data_dir(temp.path())).expect("open");
    let params = ReportParams::default();

    // When/Then: No division error, just empty results
    let share = warehouse
        .run_report(ReportId::ClaimStatusShare, &params)
        .expect("share");
    assert!(share.result.is_empty());

    let average = warehouse
        .run_report(ReportId::AverageClaimedPerReceiver, &params)
        .expect("average");
    assert_eq!(average.metric_text(), "n/a");

    let total = warehouse
        .run_report(ReportId::TotalQuantity, &params)
        .expect("total");
    assert_eq!(total.metric_text(), "100");
}

// =============================================================================
// Finder
// =============================================================================

#[test]
fn finder_without_filters_lists_everything_by_expiry() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);

    let (result, _) = warehouse
        .find_listings(&FinderFilter::from_selections("All", "All", "All"))
        .expect("finder");

    assert_eq!(integers(result.column_values("Food_ID")), vec![4, 2, 1, 5, 3]);
    assert!(result.column_index("ProviderName").is_some());
    assert!(result.column_index("ProviderContact").is_some());
}

#[test]
fn finder_filters_combine_with_and() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);

    let (springfield, _) = warehouse
        .find_listings(&FinderFilter::from_selections("Springfield", "All", "All"))
        .expect("finder");
    assert_eq!(integers(springfield.column_values("Food_ID")), vec![2, 1, 5]);
    assert_eq!(
        texts(springfield.column_values("ProviderName")),
        vec!["Harbor Bistro", "Green Grocer", "Harbor Bistro"]
    );

    let (lunch, _) = warehouse
        .find_listings(&FinderFilter::from_selections("Springfield", "Vegetarian", "Lunch"))
        .expect("finder");
    assert_eq!(integers(lunch.column_values("Food_ID")), vec![5]);
}

#[test]
fn finder_with_no_match_is_empty_not_an_error() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);

    let (result, _) = warehouse
        .find_listings(&FinderFilter::from_selections("Shelbyville", "Vegetarian", "All"))
        .expect("finder");

    assert!(result.is_empty());
    assert_eq!(result.columns.len(), 11);
}

#[test]
fn finder_options_list_distinct_sorted_values() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(&temp);

    let options = warehouse.finder_options().expect("options");

    assert_eq!(
        options.locations,
        vec!["Capital City", "Shelbyville", "Springfield"]
    );
    assert_eq!(
        options.food_types,
        vec!["Non-Vegetarian", "Vegan", "Vegetarian"]
    );
    assert_eq!(
        options.meal_types,
        vec!["Breakfast", "Dinner", "Lunch", "Snacks"]
    );
}
