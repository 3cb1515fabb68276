use foodshare_warehouse::{FinderFilter, Warehouse, ALL_OPTION};
use serde_json::json;

use crate::cli::FindArgs;
use crate::error::CliError;

use super::CommandResult;

pub fn run(args: &FindArgs, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let filter = FinderFilter::from_selections(
        args.location.as_deref().unwrap_or(ALL_OPTION),
        args.food_type.as_deref().unwrap_or(ALL_OPTION),
        args.meal_type.as_deref().unwrap_or(ALL_OPTION),
    );

    let (listings, cache_hit) = warehouse.find_listings(&filter)?;

    let data = json!({
        "filter": filter,
        "listings": listings,
    });

    let mut result = CommandResult::ok(data).with_cache_hit(cache_hit);
    if listings.is_empty() {
        result = result.with_warning("no listings match the selected filters");
    }
    Ok(result)
}
