//! Sequence handlers.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::state::AppState;
use crate::domain::{ApiResponse, CurrentResponse, NextIdResponse, SequenceRequest};
use crate::error::Result;

/// Issue the next identifier for a tenant and class.
pub async fn next(
    State(state): State<AppState>,
    Json(request): Json<SequenceRequest>,
) -> Result<Json<ApiResponse<NextIdResponse>>> {
    let id = state
        .sequence_service
        .next(&request.tenant_id, &request.sequence_class)
        .await?;

    Ok(Json(ApiResponse::success(NextIdResponse::new(request, id))))
}

/// Peek at the last issued value without consuming one.
pub async fn current(
    State(state): State<AppState>,
    Query(request): Query<SequenceRequest>,
) -> Result<Json<ApiResponse<CurrentResponse>>> {
    let seq = state
        .sequence_service
        .current(&request.tenant_id, &request.sequence_class)
        .await?;

    Ok(Json(ApiResponse::success(CurrentResponse {
        tenant_id: request.tenant_id,
        sequence_class: request.sequence_class,
        seq,
    })))
}
