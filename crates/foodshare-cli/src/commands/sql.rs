use foodshare_warehouse::Warehouse;

use crate::cli::SqlArgs;
use crate::error::CliError;

use super::CommandResult;

pub fn run(args: &SqlArgs, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let (result, cache_hit) = warehouse.run_adhoc(&args.query)?;

    let mut command_result =
        CommandResult::ok(serde_json::to_value(result.as_ref())?).with_cache_hit(cache_hit);

    if result.truncated {
        command_result = command_result.with_warning(format!(
            "result truncated at {} rows",
            result.row_count
        ));
    }

    Ok(command_result)
}
