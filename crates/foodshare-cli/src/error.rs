use foodshare_warehouse::WarehouseError;
use foodshare_web::WebError;
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Web(#[from] WebError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Warehouse(error) => match error {
                WarehouseError::QueryRejected(_)
                | WarehouseError::InvalidInput(_)
                | WarehouseError::NotFound(_) => 2,
                WarehouseError::MissingInput { .. } | WarehouseError::MissingColumns { .. } => 3,
                WarehouseError::DuckDb(_) => 4,
                WarehouseError::Io(_) => 10,
            },
            Self::Web(WebError::Task(_)) => 4,
            Self::Web(_) => 10,
            Self::Command(_) => 2,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
