use foodshare_warehouse::{Presentation, ReportParams, Warehouse};
use serde_json::{json, Value};

use crate::cli::DashboardArgs;
use crate::error::CliError;

use super::CommandResult;

/// Every report in catalog order; a failing report becomes a warning.
pub fn run(args: &DashboardArgs, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let params = ReportParams {
        city: args.city.clone(),
    };

    let mut reports = Vec::new();
    let mut warnings = Vec::new();
    let mut all_cached = true;

    for section in warehouse.dashboard(&params) {
        match section.outcome {
            Ok(output) => {
                all_cached &= output.cache_hit;
                let mut value = serde_json::to_value(&output)?;
                if output.presentation == Presentation::Metric {
                    if let Some(object) = value.as_object_mut() {
                        object.insert(String::from("metric"), Value::String(output.metric_text()));
                    }
                }
                reports.push(value);
            }
            Err(error) => {
                all_cached = false;
                warnings.push(format!("report '{}' failed: {error}", section.report));
            }
        }
    }

    Ok(CommandResult::ok(json!({ "reports": reports }))
        .with_warnings(warnings)
        .with_cache_hit(all_cached))
}
