//! Reservations repository: FIFO queues per book title.
//!
//! Queue positions are a contiguous 1..N over the active reservations of a
//! book. Removing one (cancel, expire) rewrites every remaining row's
//! position by creation order; the rewrite happens inside the same
//! transaction as the removal, with the book row locked, so concurrent
//! removals cannot interleave and leave gaps.

use chrono::{Duration, Utc};
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::ReservationStatus,
        reservation::{Reservation, ReservationDetails},
    },
};

const RESERVATION_DETAILS_SELECT: &str = r#"
    SELECT r.id, r.user_id, u.full_name as user_name, u.email as user_email,
           r.book_id, b.title as book_title, r.reservation_date, r.expiry_date,
           r.queue_position, r.status, r.notification_sent
    FROM reservations r
    LEFT JOIN users u ON r.user_id = u.id
    JOIN books b ON r.book_id = b.id
"#;

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reservation by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))
    }

    /// Reserve a book for a user. The book row is locked first, so the
    /// availability check, the duplicate checks and the position count all
    /// see a stable queue.
    pub async fn create(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        hold_days: i64,
    ) -> AppResult<Reservation> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let available: i32 = sqlx::query_scalar(
            "SELECT available_copies FROM books WHERE id = $1 AND is_deleted = FALSE FOR UPDATE",
        )
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        if available > 0 {
            return Err(AppError::BusinessRule(
                "Book is currently available for borrowing".to_string(),
            ));
        }

        let already_reserved: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reservations WHERE user_id = $1 AND book_id = $2 AND status = 'active')",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_reserved {
            return Err(AppError::Conflict(
                "An active reservation for this book already exists".to_string(),
            ));
        }

        let currently_borrowed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM borrow_requests br
                JOIN book_copies c ON br.book_copy_id = c.id
                WHERE br.user_id = $1 AND c.book_id = $2 AND br.return_date IS NULL
                  AND br.status IN ('approved', 'overdue')
            )
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        if currently_borrowed {
            return Err(AppError::BusinessRule(
                "This book is currently borrowed by the user".to_string(),
            ));
        }

        let active_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE book_id = $1 AND status = 'active'",
        )
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (
                user_id, book_id, reservation_date, expiry_date, queue_position,
                status, notification_sent
            )
            VALUES ($1, $2, $3, $4, $5, 'active', FALSE)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .bind(now + Duration::days(hold_days))
        .bind((active_count + 1) as i32)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(reservation_id = %reservation.id, %book_id, position = reservation.queue_position, "reservation created");

        Ok(reservation)
    }

    /// Cancel a reservation, then close the gap in the queue.
    /// `owner` restricts the cancel to that user's own reservation.
    pub async fn cancel(&self, reservation_id: Uuid, owner: Option<Uuid>) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let reservation = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE id = $1 FOR UPDATE",
        )
        .bind(reservation_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Reservation with id {} not found", reservation_id))
        })?;

        if let Some(owner_id) = owner {
            if reservation.user_id != Some(owner_id) {
                return Err(AppError::Authorization(
                    "Reservation belongs to another user".to_string(),
                ));
            }
        }

        if reservation.status != ReservationStatus::Active {
            return Err(AppError::BusinessRule("Reservation is not active".to_string()));
        }

        // Serialize queue rewrites per book
        sqlx::query("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(reservation.book_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE reservations SET status = 'cancelled' WHERE id = $1")
            .bind(reservation_id)
            .execute(&mut *tx)
            .await?;

        resequence_queue(&mut tx, reservation.book_id).await?;

        tx.commit().await?;
        Ok(())
    }

    /// All reservations of a user, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<ReservationDetails>> {
        let query = format!(
            "{} WHERE r.user_id = $1 ORDER BY r.created_at DESC",
            RESERVATION_DETAILS_SELECT
        );
        let reservations = sqlx::query_as::<_, ReservationDetails>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(reservations)
    }

    /// Active queue of a book, in position order
    pub async fn list_for_book(&self, book_id: Uuid) -> AppResult<Vec<ReservationDetails>> {
        let query = format!(
            "{} WHERE r.book_id = $1 AND r.status = 'active' ORDER BY r.queue_position",
            RESERVATION_DETAILS_SELECT
        );
        let reservations = sqlx::query_as::<_, ReservationDetails>(&query)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(reservations)
    }

    /// Mark the head of a book's queue notified and start its pickup
    /// window. Returns None when the queue is empty. The freed copy is not
    /// held for the notified user.
    pub async fn notify_next(
        &self,
        book_id: Uuid,
        pickup_days: i64,
    ) -> AppResult<Option<ReservationDetails>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let head: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM reservations
            WHERE book_id = $1 AND status = 'active'
            ORDER BY queue_position
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(reservation_id) = head else {
            return Ok(None);
        };

        sqlx::query(
            "UPDATE reservations SET notification_sent = TRUE, expiry_date = $2 WHERE id = $1",
        )
        .bind(reservation_id)
        .bind(now + Duration::days(pickup_days))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let query = format!("{} WHERE r.id = $1", RESERVATION_DETAILS_SELECT);
        let details = sqlx::query_as::<_, ReservationDetails>(&query)
            .bind(reservation_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(Some(details))
    }

    /// Expire notified reservations whose pickup window has lapsed, then
    /// resequence every affected book's queue. Returns the expired count.
    pub async fn expire_lapsed(&self) -> AppResult<i64> {
        let mut tx = self.pool.begin().await?;

        let expired: Vec<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT id, book_id FROM reservations
            WHERE status = 'active' AND notification_sent = TRUE AND expiry_date < NOW()
            ORDER BY book_id
            FOR UPDATE
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        if expired.is_empty() {
            return Ok(0);
        }

        for (id, _) in &expired {
            sqlx::query("UPDATE reservations SET status = 'expired' WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let mut affected_books: Vec<Uuid> = expired.iter().map(|(_, b)| *b).collect();
        affected_books.dedup();

        for book_id in affected_books {
            sqlx::query("SELECT id FROM books WHERE id = $1 FOR UPDATE")
                .bind(book_id)
                .fetch_one(&mut *tx)
                .await?;
            resequence_queue(&mut tx, book_id).await?;
        }

        tx.commit().await?;
        Ok(expired.len() as i64)
    }

    /// Count active reservations
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE status = 'active'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

/// Rewrite a book's active queue positions to a contiguous 1..N by creation
/// order. One UPDATE per row; callers hold the book lock.
async fn resequence_queue(tx: &mut Transaction<'_, Postgres>, book_id: Uuid) -> AppResult<()> {
    let active: Vec<Uuid> = sqlx::query_scalar(
        r#"
        SELECT id FROM reservations
        WHERE book_id = $1 AND status = 'active'
        ORDER BY created_at
        "#,
    )
    .bind(book_id)
    .fetch_all(&mut **tx)
    .await?;

    for (i, id) in active.iter().enumerate() {
        sqlx::query("UPDATE reservations SET queue_position = $2 WHERE id = $1")
            .bind(id)
            .bind((i + 1) as i32)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}
