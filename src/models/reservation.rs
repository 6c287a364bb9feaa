//! Reservation (queue) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::enums::ReservationStatus;

/// Reservation model from database.
/// A reservation targets a book title, not a specific copy.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub book_id: Uuid,
    pub reservation_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    /// 1-based rank among active reservations for the book
    pub queue_position: i32,
    pub status: ReservationStatus,
    /// Once set, the expiry date is the pickup window, not the hold window
    pub notification_sent: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Reservation with joined display fields
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ReservationDetails {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub book_id: Uuid,
    pub book_title: String,
    pub reservation_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub queue_position: i32,
    pub status: ReservationStatus,
    pub notification_sent: Option<bool>,
}

/// Create reservation request. `user_id` defaults to the caller; only staff
/// may reserve on someone else's behalf.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReservation {
    pub book_id: Uuid,
    pub user_id: Option<Uuid>,
}
