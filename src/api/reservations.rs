//! Reservation queue endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::reservation::{CreateReservation, Reservation, ReservationDetails},
    services::reservations::NotifyNextOutcome,
    AppState,
};

use super::AuthenticatedUser;

/// Expiry batch report
#[derive(Serialize, ToSchema)]
pub struct ExpireResponse {
    pub expired: i64,
}

/// Reserve a book. Rejected while copies are available, when the user
/// already holds an active reservation, or currently has the book borrowed.
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = CreateReservation,
    responses(
        (status = 201, description = "Reservation created", body = Reservation),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Already reserved"),
        (status = 422, description = "Copies available or book already borrowed")
    )
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateReservation>,
) -> AppResult<(StatusCode, Json<Reservation>)> {
    let user_id = request.user_id.unwrap_or(claims.user_id);
    claims.require_self_or_staff(user_id)?;

    let reservation = state
        .services
        .reservations
        .reserve(user_id, request.book_id)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Cancel a reservation; remaining queue positions close up
#[utoipa::path(
    post,
    path = "/reservations/{id}/cancel",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Reservation ID")),
    responses(
        (status = 204, description = "Reservation cancelled"),
        (status = 403, description = "Another user's reservation"),
        (status = 404, description = "Reservation not found"),
        (status = 422, description = "Reservation not active")
    )
)]
pub async fn cancel_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.reservations.cancel(id, &claims).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List a user's reservations (staff, or the user themself)
#[utoipa::path(
    get,
    path = "/users/{id}/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User's reservations", body = Vec<ReservationDetails>)
    )
)]
pub async fn get_user_reservations(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    claims.require_self_or_staff(user_id)?;

    let reservations = state.services.reservations.list_for_user(user_id).await?;
    Ok(Json(reservations))
}

/// Active queue of a book, in position order (staff)
#[utoipa::path(
    get,
    path = "/books/{id}/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Active queue", body = Vec<ReservationDetails>),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book_reservations(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    claims.require_staff()?;

    let reservations = state.services.reservations.list_for_book(book_id).await?;
    Ok(Json(reservations))
}

/// Notify the head of a book's queue that a copy is ready (staff).
/// The freed copy is not held; the pickup window starts now.
#[utoipa::path(
    post,
    path = "/books/{id}/reservations/notify-next",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Head of queue notified (or queue empty)", body = NotifyNextOutcome),
        (status = 404, description = "Book not found")
    )
)]
pub async fn notify_next(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<NotifyNextOutcome>> {
    claims.require_staff()?;

    let outcome = state.services.reservations.notify_next(book_id).await?;
    Ok(Json(outcome))
}

/// Batch: expire notified reservations past their pickup window
#[utoipa::path(
    post,
    path = "/reservations/expire",
    tag = "reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Expiry report", body = ExpireResponse),
        (status = 403, description = "Not staff")
    )
)]
pub async fn expire_reservations(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ExpireResponse>> {
    claims.require_staff()?;

    let expired = state.services.reservations.expire_lapsed().await?;
    Ok(Json(ExpireResponse { expired }))
}
