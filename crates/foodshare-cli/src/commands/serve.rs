use foodshare_warehouse::{Warehouse, WarehouseConfig};
use log::info;

use crate::cli::ServeArgs;
use crate::error::CliError;

pub async fn run(args: &ServeArgs, config: WarehouseConfig) -> Result<(), CliError> {
    let (warehouse, report) = Warehouse::open_with_report(config)?;
    for table in &report.tables {
        info!("{}: {} row(s) from {}", table.table, table.rows, table.source.display());
    }

    foodshare_web::serve(warehouse, args.addr).await?;
    Ok(())
}
