//! HTTP gateway: decodes requests, validates them, calls the account
//! service and maps outcomes to status codes. No ledger logic lives here.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::application::AccountService;

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{
    BalanceSummary, StatementResponse, TransactionRequest, TransactionResponse,
};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: AccountService,
}

/// Build the router. Requests that outlive `request_timeout` are answered with
/// `408`; dropping the handler drops any open store transaction, which rolls it back.
pub fn router(service: AccountService, request_timeout: Duration) -> Router {
    Router::new()
        .route("/accounts/{id}/transactions", post(handlers::post_transaction))
        .route("/accounts/{id}/statement", get(handlers::get_statement))
        .route("/health", get(handlers::health))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}

/// Serve `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")
}
