//! Credit ledger API handlers
//!
//! Handles credit balance lookups and credit purchases.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use common::model::credits::CreditEntry;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::response::ApiResponse;
use crate::error::ApiError;
use crate::AppState;

/// Number of recent transactions included in a balance response
const RECENT_TRANSACTIONS: usize = 10;

/// Credit balance with recent activity
#[derive(Debug, Serialize, ToSchema)]
pub struct CreditBalance {
    /// Current balance
    pub total_credits: i64,
    /// Most recent ledger entries, newest last
    pub recent_transactions: Vec<CreditEntry>,
}

/// Purchase credits request
#[derive(Debug, Deserialize, ToSchema)]
pub struct PurchaseCreditsRequest {
    /// Acting user
    pub actor_id: Uuid,
    /// Number of credits to purchase
    pub amount: i64,
}

/// Get a user's credit balance and recent transactions
#[utoipa::path(
    get,
    path = "/api/v1/credits/{user_id}/balance",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Balance retrieved successfully"),
        (status = 500, description = "Internal server error")
    ),
    tag = "credits"
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<ApiResponse<CreditBalance>, ApiError> {
    let total_credits = state
        .credit_ledger
        .balance(user_id)
        .await
        .map_err(ApiError::Common)?;

    let history = state
        .credit_ledger
        .history(user_id)
        .await
        .map_err(ApiError::Common)?;

    let recent_transactions = history
        .into_iter()
        .rev()
        .take(RECENT_TRANSACTIONS)
        .rev()
        .collect();

    Ok(ApiResponse::new(CreditBalance {
        total_credits,
        recent_transactions,
    }))
}

/// Purchase credits
#[utoipa::path(
    post,
    path = "/api/v1/credits/purchase",
    request_body = PurchaseCreditsRequest,
    responses(
        (status = 200, description = "Credits purchased"),
        (status = 400, description = "Invalid amount"),
        (status = 500, description = "Internal server error")
    ),
    tag = "credits"
)]
pub async fn purchase_credits(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PurchaseCreditsRequest>,
) -> Result<ApiResponse<CreditEntry>, ApiError> {
    let entry = state
        .credit_ledger
        .purchase(request.actor_id, request.amount)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(entry))
}
