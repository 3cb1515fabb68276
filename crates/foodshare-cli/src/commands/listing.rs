use foodshare_warehouse::models::parse_date;
use foodshare_warehouse::{
    FoodType, ListingId, ListingUpdate, MealType, NewListing, Warehouse, WarehouseError,
};
use serde_json::json;

use crate::cli::{AddListingArgs, ListingArgs, ListingCommand};
use crate::error::CliError;

use super::CommandResult;

pub fn run(args: &ListingArgs, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    match &args.command {
        ListingCommand::Show(args) => show(warehouse, args.food_id),
        ListingCommand::Add(args) => {
            let food_id = warehouse.insert_listing(&new_listing(args)?)?;
            show(warehouse, food_id)
        }
        ListingCommand::Update(args) => {
            warehouse.update_listing(&ListingUpdate {
                food_id: args.food_id,
                food_name: args.name.clone(),
                quantity: args.quantity,
            })?;
            show(warehouse, args.food_id)
        }
        ListingCommand::Delete(args) => {
            warehouse.delete_listing(args.food_id)?;
            Ok(CommandResult::ok(json!({
                "food_id": args.food_id,
                "deleted": true,
            })))
        }
    }
}

fn show(warehouse: &Warehouse, food_id: ListingId) -> Result<CommandResult, CliError> {
    let listing = warehouse
        .get_listing(food_id)?
        .ok_or_else(|| WarehouseError::NotFound(format!("listing {food_id}")))?;
    Ok(CommandResult::ok(serde_json::to_value(listing)?))
}

fn new_listing(args: &AddListingArgs) -> Result<NewListing, WarehouseError> {
    Ok(NewListing {
        provider_id: args.provider_id,
        food_name: args.name.clone(),
        quantity: args.quantity,
        expiry_date: parse_date(&args.expiry)?,
        location: args.location.clone(),
        food_type: args.food_type.parse::<FoodType>()?,
        meal_type: args.meal_type.parse::<MealType>()?,
    })
}
