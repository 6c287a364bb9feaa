//! Reservation queue service

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::CirculationConfig,
    error::AppResult,
    models::{
        enums::NotificationType,
        reservation::{Reservation, ReservationDetails},
        user::UserClaims,
    },
    repository::Repository,
};

use super::email::EmailService;

/// Outcome of a notify-next call
#[derive(Debug, Serialize, ToSchema)]
pub struct NotifyNextOutcome {
    /// The notified reservation, or None when the queue was empty
    pub notified: Option<ReservationDetails>,
}

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
    config: CirculationConfig,
    email: EmailService,
}

impl ReservationsService {
    pub fn new(repository: Repository, config: CirculationConfig, email: EmailService) -> Self {
        Self {
            repository,
            config,
            email,
        }
    }

    /// Reserve a book for a user
    pub async fn reserve(&self, user_id: Uuid, book_id: Uuid) -> AppResult<Reservation> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository
            .reservations
            .create(user_id, book_id, self.config.reservation_hold_days)
            .await
    }

    /// Cancel a reservation. Staff may cancel anyone's; other callers only
    /// their own.
    pub async fn cancel(&self, reservation_id: Uuid, claims: &UserClaims) -> AppResult<()> {
        let owner = if claims.is_staff() {
            None
        } else {
            Some(claims.user_id)
        };
        self.repository.reservations.cancel(reservation_id, owner).await
    }

    /// All reservations of a user
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<ReservationDetails>> {
        self.repository.reservations.list_for_user(user_id).await
    }

    /// Active queue of a book
    pub async fn list_for_book(&self, book_id: Uuid) -> AppResult<Vec<ReservationDetails>> {
        self.repository.books.get_by_id(book_id).await?;
        self.repository.reservations.list_for_book(book_id).await
    }

    /// Notify the head of a book's queue that a copy is ready, start the
    /// pickup window, and record the notification. Email failures are
    /// logged, not surfaced; the reservation stays notified either way.
    pub async fn notify_next(&self, book_id: Uuid) -> AppResult<NotifyNextOutcome> {
        let book = self.repository.books.get_by_id(book_id).await?;

        let Some(details) = self
            .repository
            .reservations
            .notify_next(book_id, self.config.reservation_pickup_days)
            .await?
        else {
            return Ok(NotifyNextOutcome { notified: None });
        };

        let mut email_sent = false;
        if let (Some(user_email), Some(user_name), Some(deadline)) = (
            details.user_email.as_deref(),
            details.user_name.as_deref(),
            details.expiry_date,
        ) {
            match self
                .email
                .send_reservation_ready(user_email, user_name, &book.title, deadline)
                .await
            {
                Ok(()) => email_sent = true,
                Err(e) => {
                    tracing::warn!(reservation_id = %details.id, "reservation-ready email failed: {}", e)
                }
            }
        }

        if let Some(user_id) = details.user_id {
            self.repository
                .notifications
                .create(
                    user_id,
                    NotificationType::ReservationReady,
                    &format!("\"{}\" is ready for pickup", book.title),
                    &format!(
                        "Your reserved book \"{}\" is available. Pick it up within {} days.",
                        book.title, self.config.reservation_pickup_days
                    ),
                    email_sent,
                )
                .await?;
        }

        Ok(NotifyNextOutcome {
            notified: Some(details),
        })
    }

    /// Expire notified reservations past their pickup window
    pub async fn expire_lapsed(&self) -> AppResult<i64> {
        let expired = self.repository.reservations.expire_lapsed().await?;
        if expired > 0 {
            tracing::info!(expired, "expired lapsed reservations");
        }
        Ok(expired)
    }
}
