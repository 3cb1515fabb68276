//! # Foodshare Web
//!
//! Server-rendered dashboard over a [`Warehouse`]: the report dashboard, the
//! listing finder, the listing manager, and the SQL query runner.
//!
//! Store calls are synchronous, so every handler hands them to tokio's blocking
//! pool through [`AppState::run`].

mod dashboard;
mod error;
mod finder;
mod manage;
mod query;
pub mod render;

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use foodshare_warehouse::Warehouse;
use log::info;
use tokio::net::TcpListener;

pub use error::WebError;

/// Default listen address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8501";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    warehouse: Warehouse,
}

impl AppState {
    pub fn new(warehouse: Warehouse) -> Self {
        Self { warehouse }
    }

    /// Run blocking store work off the async runtime.
    pub(crate) async fn run<T, F>(&self, work: F) -> Result<T, WebError>
    where
        F: FnOnce(&Warehouse) -> T + Send + 'static,
        T: Send + 'static,
    {
        let warehouse = self.warehouse.clone();
        let output = tokio::task::spawn_blocking(move || work(&warehouse)).await?;
        Ok(output)
    }
}

/// All routes of the dashboard.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/find", get(finder::find))
        .route("/manage", get(manage::manage))
        .route("/manage/add", post(manage::add))
        .route("/manage/update", post(manage::update))
        .route("/manage/delete", post(manage::delete))
        .route("/query", get(query::query_form).post(query::run_query))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(warehouse: Warehouse, addr: SocketAddr) -> Result<(), WebError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| WebError::Bind { addr, source })?;
    let local = listener.local_addr().unwrap_or(addr);
    info!("dashboard listening on http://{local}");

    axum::serve(listener, router(AppState::new(warehouse)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(WebError::Serve)?;

    info!("dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        log::warn!("could not listen for Ctrl-C: {error}");
        std::future::pending::<()>().await;
    }
}
