use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Amount, BalanceSnapshot, Description, NewTransaction, Statement, Transaction,
    TransactionKind, parse_account_id,
};

use super::{ApiError, AppState};

/// Body of `POST /accounts/{id}/transactions`.
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    pub amount: Amount,
    pub kind: String,
    pub description: String,
}

impl TransactionRequest {
    pub fn validate(self) -> Result<NewTransaction, ApiError> {
        let kind: TransactionKind = self.kind.parse()?;
        let description = Description::parse(self.description)?;
        Ok(NewTransaction::new(kind, self.amount, description)?)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub limit: Amount,
    pub balance: Amount,
}

impl From<BalanceSnapshot> for TransactionResponse {
    fn from(snapshot: BalanceSnapshot) -> Self {
        Self {
            limit: snapshot.limit,
            balance: snapshot.balance,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub total: Amount,
    pub limit: Amount,
    pub as_of: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatementResponse {
    pub balance: BalanceSummary,
    pub recent_transactions: Vec<Transaction>,
}

impl From<Statement> for StatementResponse {
    fn from(statement: Statement) -> Self {
        Self {
            balance: BalanceSummary {
                total: statement.balance,
                limit: statement.limit,
                as_of: statement.as_of,
            },
            recent_transactions: statement.transactions,
        }
    }
}

pub async fn post_transaction(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::Unprocessable(rejection.body_text()))?;
    let account_id = parse_account_id(&raw_id)?;
    let transaction = request.validate()?;

    let snapshot = state
        .service
        .apply_transaction(account_id, transaction)
        .await?;
    Ok(Json(snapshot.into()))
}

pub async fn get_statement(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<StatementResponse>, ApiError> {
    let account_id = parse_account_id(&raw_id).map_err(|_| ApiError::NotFound)?;
    let statement = state.service.get_statement(account_id).await?;
    Ok(Json(statement.into()))
}

pub async fn health(State(state): State<AppState>) -> StatusCode {
    match state.service.repository().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
