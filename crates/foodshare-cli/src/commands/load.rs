use foodshare_warehouse::{Warehouse, WarehouseConfig};
use serde_json::json;

use crate::error::CliError;

use super::CommandResult;

pub fn run(config: WarehouseConfig) -> Result<CommandResult, CliError> {
    let (warehouse, report) = Warehouse::open_with_report(config)?;

    let warnings = warehouse
        .unrecognized_claim_statuses()?
        .into_iter()
        .map(|status| format!("claims use unrecognized status '{status}'"))
        .collect();

    let data = json!({
        "db_path": warehouse.db_path().display().to_string(),
        "tables": report.tables,
    });

    Ok(CommandResult::ok(data).with_warnings(warnings))
}
