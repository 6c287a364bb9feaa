//! Account request endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        account_request::{
            AccountRequest, AccountRequestDetails, AccountRequestQuery, ApproveAccountRequest,
            CreateAccountRequest, RejectAccountRequest,
        },
        user::User,
    },
    AppState,
};

use super::{AuthenticatedUser, PaginatedResponse};

/// Submit a registration request (public, no authentication)
#[utoipa::path(
    post,
    path = "/account-requests",
    tag = "accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Request submitted", body = AccountRequest),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Duplicate email or student ID")
    )
)]
pub async fn submit_account_request(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> AppResult<(StatusCode, Json<AccountRequest>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let created = state.services.accounts.submit(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List account requests (staff)
#[utoipa::path(
    get,
    path = "/account-requests",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(AccountRequestQuery),
    responses(
        (status = 200, description = "Paginated request list", body = PaginatedResponse<AccountRequestDetails>),
        (status = 403, description = "Not staff")
    )
)]
pub async fn list_account_requests(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AccountRequestQuery>,
) -> AppResult<Json<PaginatedResponse<AccountRequestDetails>>> {
    claims.require_staff()?;

    let (requests, total) = state.services.accounts.list(&query).await?;

    Ok(Json(PaginatedResponse {
        items: requests,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// Approve an account request, creating the user (staff)
#[utoipa::path(
    post,
    path = "/account-requests/{id}/approve",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Request ID")),
    request_body = ApproveAccountRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Duplicate email or student ID"),
        (status = 422, description = "Request already reviewed")
    )
)]
pub async fn approve_account_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveAccountRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    claims.require_staff()?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = state
        .services
        .accounts
        .approve(id, claims.user_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Reject an account request with a reason (staff)
#[utoipa::path(
    post,
    path = "/account-requests/{id}/reject",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Request ID")),
    request_body = RejectAccountRequest,
    responses(
        (status = 200, description = "Request rejected", body = AccountRequest),
        (status = 404, description = "Request not found"),
        (status = 422, description = "Request already reviewed")
    )
)]
pub async fn reject_account_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectAccountRequest>,
) -> AppResult<Json<AccountRequest>> {
    claims.require_staff()?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let request = state
        .services
        .accounts
        .reject(id, claims.user_id, payload)
        .await?;
    Ok(Json(request))
}
