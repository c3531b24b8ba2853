//! Transaction relay and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::{TransactionKey, TransactionRequest, TransactionResponse, TransactionType};
use downstream::DownstreamClient;
use record_store::{RecordStore, TransactionRecord};
use relay::validate;

use crate::AppState;
use crate::error::ApiError;

/// POST /api/v1/transaction: relay a credit transfer.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S, D>(
    State(state): State<Arc<AppState<S, D>>>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<Json<TransactionResponse>, ApiError>
where
    S: RecordStore + 'static,
    D: DownstreamClient + 'static,
{
    let Json(request) = payload?;
    let transaction_type = TransactionType::CreditTransfer;
    let validation = validate(&request);

    let outcome = state
        .pipeline
        .process(
            &request.reference_number,
            &request,
            &validation,
            transaction_type,
        )
        .await
        .map_err(|signal| {
            ApiError::relay(
                TransactionKey::new(request.reference_number.clone(), transaction_type),
                signal,
            )
        })?;

    Ok(Json(outcome.into()))
}

/// GET /api/v1/transaction/{reference_number}: fetch the stored record.
#[tracing::instrument(skip(state))]
pub async fn get<S, D>(
    State(state): State<Arc<AppState<S, D>>>,
    Path(reference_number): Path<String>,
) -> Result<Json<TransactionRecord>, ApiError>
where
    S: RecordStore + 'static,
    D: DownstreamClient + 'static,
{
    let key = TransactionKey::new(reference_number, TransactionType::CreditTransfer);
    let record = state
        .pipeline
        .lookup(&key)
        .await
        .map_err(|signal| ApiError::Internal(signal.message))?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "Transaction with reference number {} does not exist.",
                key.reference_number
            ))
        })?;

    Ok(Json(record))
}
