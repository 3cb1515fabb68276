use foodshare_warehouse::{Presentation, ReportId, ReportParams, Warehouse};
use serde_json::Value;

use crate::cli::ReportArgs;
use crate::error::CliError;

use super::CommandResult;

pub fn run(args: &ReportArgs, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let id = ReportId::from_slug(args.slug.trim()).ok_or_else(|| {
        CliError::Command(format!(
            "unknown report '{}'; expected one of: {}",
            args.slug,
            ReportId::ALL
                .iter()
                .map(|report| report.slug())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })?;

    let params = ReportParams {
        city: args.city.clone(),
    };
    let output = warehouse.run_report(id, &params)?;

    let mut data = serde_json::to_value(&output)?;
    if output.presentation == Presentation::Metric {
        if let Some(object) = data.as_object_mut() {
            object.insert(String::from("metric"), Value::String(output.metric_text()));
        }
    }

    let mut result = CommandResult::ok(data).with_cache_hit(output.cache_hit);
    if output.result.is_empty() {
        result = result.with_warning(format!("report '{id}' returned no data"));
    }
    Ok(result)
}
