//! Circulation endpoints: borrow, return, renew, overdue batch

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::borrow::{BorrowDetails, BorrowQuery, CreateBorrow},
    services::overdue::{OverdueReport, ReminderReport},
    AppState,
};

use super::{AuthenticatedUser, PaginatedResponse};

/// Renewal response with the new due date
#[derive(Serialize, ToSchema)]
pub struct RenewResponse {
    pub id: Uuid,
    pub due_date: DateTime<Utc>,
    pub renewal_count: i32,
    pub message: String,
}

/// List borrow records with filters (staff)
#[utoipa::path(
    get,
    path = "/borrows",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(BorrowQuery),
    responses(
        (status = 200, description = "Paginated borrow list", body = PaginatedResponse<BorrowDetails>),
        (status = 403, description = "Not staff")
    )
)]
pub async fn list_borrows(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BorrowQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowDetails>>> {
    claims.require_staff()?;

    let (records, total) = state.services.circulation.list(&query).await?;

    Ok(Json(PaginatedResponse {
        items: records,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// Borrow a book: allocates one available copy to the user
#[utoipa::path(
    post,
    path = "/borrows",
    tag = "circulation",
    security(("bearer_auth" = [])),
    request_body = CreateBorrow,
    responses(
        (status = 201, description = "Borrow created", body = BorrowDetails),
        (status = 404, description = "User or book not found"),
        (status = 422, description = "No available copies, inactive account or borrow limit reached")
    )
)]
pub async fn create_borrow(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBorrow>,
) -> AppResult<(StatusCode, Json<BorrowDetails>)> {
    // Borrowers may borrow for themselves; staff for anyone
    claims.require_self_or_staff(request.user_id)?;

    let librarian_id = if claims.is_staff() {
        Some(claims.user_id)
    } else {
        None
    };

    let details = state.services.circulation.borrow(request, librarian_id).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// Get one borrow record
#[utoipa::path(
    get,
    path = "/borrows/{id}",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Borrow ID")),
    responses(
        (status = 200, description = "Borrow details", body = BorrowDetails),
        (status = 404, description = "Borrow not found")
    )
)]
pub async fn get_borrow(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BorrowDetails>> {
    let details = state.services.circulation.get(id).await?;
    claims.require_self_or_staff(details.user_id)?;
    Ok(Json(details))
}

/// Return a borrowed book (staff). Does not notify the reservation queue;
/// use the notify-next operation for the hand-off.
#[utoipa::path(
    post,
    path = "/borrows/{id}/return",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Borrow ID")),
    responses(
        (status = 200, description = "Book returned", body = BorrowDetails),
        (status = 404, description = "Borrow not found"),
        (status = 422, description = "Already returned")
    )
)]
pub async fn return_borrow(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BorrowDetails>> {
    claims.require_staff()?;

    let details = state.services.circulation.return_book(id).await?;
    Ok(Json(details))
}

/// Renew a borrow (staff, or the borrower themself)
#[utoipa::path(
    post,
    path = "/borrows/{id}/renew",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Borrow ID")),
    responses(
        (status = 200, description = "Borrow renewed", body = RenewResponse),
        (status = 404, description = "Borrow not found"),
        (status = 422, description = "Renewal limit reached or already returned")
    )
)]
pub async fn renew_borrow(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewResponse>> {
    let details = state.services.circulation.get(id).await?;
    claims.require_self_or_staff(details.user_id)?;

    let (due_date, renewal_count) = state.services.circulation.renew(id).await?;

    Ok(Json(RenewResponse {
        id,
        due_date,
        renewal_count,
        message: format!("Book renewed ({} renewal(s))", renewal_count),
    }))
}

/// List a user's borrow records (staff, or the user themself)
#[utoipa::path(
    get,
    path = "/users/{id}/borrows",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User's borrows", body = Vec<BorrowDetails>),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_borrows(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<BorrowDetails>>> {
    claims.require_self_or_staff(user_id)?;

    let records = state.services.circulation.list_for_user(user_id).await?;
    Ok(Json(records))
}

/// Batch: flip overdue borrows and upsert their fines
#[utoipa::path(
    post,
    path = "/circulation/process-overdue",
    tag = "circulation",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Processing report", body = OverdueReport),
        (status = 403, description = "Not staff")
    )
)]
pub async fn process_overdue(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<OverdueReport>> {
    claims.require_staff()?;

    let report = state.services.overdue.process().await?;
    Ok(Json(report))
}

/// Batch: send due-soon reminders and overdue notices
#[utoipa::path(
    post,
    path = "/circulation/send-reminders",
    tag = "circulation",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reminder report", body = ReminderReport),
        (status = 403, description = "Not staff")
    )
)]
pub async fn send_reminders(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ReminderReport>> {
    claims.require_staff()?;

    let report = state.services.overdue.send_reminders().await?;
    Ok(Json(report))
}
