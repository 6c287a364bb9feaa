//! Fine management endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::fine::{Fine, FineQuery, PayFine, WaiveFine},
    AppState,
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List fines. Staff see everything; other callers only their own.
#[utoipa::path(
    get,
    path = "/fines",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(FineQuery),
    responses(
        (status = 200, description = "Paginated fine list", body = PaginatedResponse<Fine>)
    )
)]
pub async fn list_fines(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(mut query): Query<FineQuery>,
) -> AppResult<Json<PaginatedResponse<Fine>>> {
    if !claims.is_staff() {
        query.user_id = Some(claims.user_id);
    }

    let (fines, total) = state.services.fines.list(&query).await?;

    Ok(Json(PaginatedResponse {
        items: fines,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// Get one fine (staff, or the fined user)
#[utoipa::path(
    get,
    path = "/fines/{id}",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Fine ID")),
    responses(
        (status = 200, description = "Fine details", body = Fine),
        (status = 404, description = "Fine not found")
    )
)]
pub async fn get_fine(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Fine>> {
    let fine = state.services.fines.get(id).await?;
    if let Some(user_id) = fine.user_id {
        claims.require_self_or_staff(user_id)?;
    } else {
        claims.require_staff()?;
    }
    Ok(Json(fine))
}

/// Record a payment on a fine (staff)
#[utoipa::path(
    post,
    path = "/fines/{id}/pay",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Fine ID")),
    request_body = PayFine,
    responses(
        (status = 200, description = "Fine paid", body = Fine),
        (status = 404, description = "Fine not found"),
        (status = 422, description = "Fine not payable")
    )
)]
pub async fn pay_fine(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PayFine>,
) -> AppResult<Json<Fine>> {
    claims.require_staff()?;

    let fine = state
        .services
        .fines
        .pay(id, payload.payment_method)
        .await?;
    Ok(Json(fine))
}

/// Waive a fine with a reason (staff)
#[utoipa::path(
    post,
    path = "/fines/{id}/waive",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Fine ID")),
    request_body = WaiveFine,
    responses(
        (status = 200, description = "Fine waived", body = Fine),
        (status = 404, description = "Fine not found"),
        (status = 422, description = "Fine not waivable")
    )
)]
pub async fn waive_fine(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<WaiveFine>,
) -> AppResult<Json<Fine>> {
    claims.require_staff()?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let fine = state
        .services
        .fines
        .waive(id, claims.user_id, &payload.reason)
        .await?;
    Ok(Json(fine))
}
