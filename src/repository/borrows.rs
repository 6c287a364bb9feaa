//! Borrows repository for circulation operations.
//!
//! Every multi-statement workflow here (borrow, return, renew, overdue
//! marking) runs in a single transaction with the book row locked, so the
//! `available_copies` counter and the copy-status flags cannot drift apart
//! under concurrent requests.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow::{BorrowDetails, BorrowQuery, BorrowRequest, OverdueBorrow},
        enums::BorrowStatus,
        user::User,
    },
};

const BORROW_DETAILS_SELECT: &str = r#"
    SELECT br.id, br.user_id, u.full_name as user_name, u.email as user_email,
           c.book_id, b.title as book_title, br.book_copy_id, c.copy_number,
           br.approved_date as borrow_date, br.due_date, br.return_date,
           br.status, br.renewal_count, br.max_renewals
    FROM borrow_requests br
    JOIN users u ON br.user_id = u.id
    JOIN book_copies c ON br.book_copy_id = c.id
    JOIN books b ON c.book_id = b.id
"#;

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrow request by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BorrowRequest> {
        sqlx::query_as::<_, BorrowRequest>("SELECT * FROM borrow_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow request with id {} not found", id)))
    }

    /// Get borrow details (joined display row) by ID
    pub async fn get_details(&self, id: Uuid) -> AppResult<BorrowDetails> {
        let query = format!("{} WHERE br.id = $1", BORROW_DETAILS_SELECT);
        let mut details = sqlx::query_as::<_, BorrowDetails>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow request with id {} not found", id)))?;
        details.is_overdue = is_overdue(&details, Utc::now());
        Ok(details)
    }

    /// List borrow records with filters and pagination
    pub async fn list(&self, query: &BorrowQuery) -> AppResult<(Vec<BorrowDetails>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = vec!["TRUE".to_string()];
        let mut params: Vec<String> = Vec::new();

        if let Some(status) = query.status {
            params.push(status.as_str().to_string());
            conditions.push(format!("br.status = ${}", params.len()));
        }
        if let Some(user_id) = query.user_id {
            params.push(user_id.to_string());
            conditions.push(format!("br.user_id = ${}::uuid", params.len()));
        }
        if query.overdue_only.unwrap_or(false) {
            conditions.push("br.return_date IS NULL AND br.due_date < NOW()".to_string());
        }

        let where_clause = conditions.join(" AND ");

        let count_query = format!(
            "SELECT COUNT(*) FROM borrow_requests br WHERE {}",
            where_clause
        );
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for p in &params {
            count_builder = count_builder.bind(p);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let list_query = format!(
            "{} WHERE {} ORDER BY br.created_at DESC LIMIT {} OFFSET {}",
            BORROW_DETAILS_SELECT, where_clause, per_page, offset
        );
        let mut list_builder = sqlx::query_as::<_, BorrowDetails>(&list_query);
        for p in &params {
            list_builder = list_builder.bind(p);
        }
        let mut records = list_builder.fetch_all(&self.pool).await?;

        let now = Utc::now();
        for record in &mut records {
            record.is_overdue = is_overdue(record, now);
        }

        Ok((records, total))
    }

    /// Borrow a book for a user: one transaction locks the book row, takes
    /// one available copy, inserts the approved borrow record, flips the
    /// copy and decrements `available_copies`. The borrower limit is
    /// re-checked inside the transaction.
    pub async fn create_borrow(
        &self,
        user: &User,
        book_id: Uuid,
        librarian_id: Option<Uuid>,
    ) -> AppResult<BorrowDetails> {
        let now = Utc::now();
        let due_date = now + Duration::days(user.max_days_allowed as i64);

        let mut tx = self.pool.begin().await?;

        let available: i64 = sqlx::query_scalar(
            "SELECT available_copies FROM books WHERE id = $1 AND is_deleted = FALSE FOR UPDATE",
        )
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|v: i32| v as i64)
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        if available <= 0 {
            return Err(AppError::BusinessRule(
                "Book is not available for borrowing".to_string(),
            ));
        }

        let open_borrows: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_requests WHERE user_id = $1 AND status IN ('approved', 'overdue')",
        )
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await?;

        if open_borrows >= user.max_books_allowed as i64 {
            return Err(AppError::BusinessRule(format!(
                "Maximum borrows reached ({}/{})",
                open_borrows, user.max_books_allowed
            )));
        }

        // SKIP LOCKED keeps two borrowers of a multi-copy title from
        // serializing on (or double-allocating) the same copy row.
        let copy_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM book_copies
            WHERE book_id = $1 AND status = 'available' AND is_deleted = FALSE
            ORDER BY copy_number
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?;

        let copy_id = copy_id.ok_or_else(|| {
            AppError::BusinessRule("No available copy of this book".to_string())
        })?;

        let borrow_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO borrow_requests (
                user_id, book_copy_id, librarian_id, request_date, approved_date,
                due_date, status, renewal_count
            )
            VALUES ($1, $2, $3, $4, $4, $5, 'approved', 0)
            RETURNING id
            "#,
        )
        .bind(user.id)
        .bind(copy_id)
        .bind(librarian_id)
        .bind(now)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE book_copies SET status = 'borrowed' WHERE id = $1")
            .bind(copy_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE books SET available_copies = available_copies - 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(%borrow_id, user_id = %user.id, %book_id, "book borrowed");

        self.get_details(borrow_id).await
    }

    /// Return a borrowed book: stamps the record, restores the copy and the
    /// availability counter in one transaction. Does not touch the
    /// reservation queue; hand-off is a separate, explicit operation.
    pub async fn return_borrow(&self, borrow_id: Uuid) -> AppResult<BorrowDetails> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT br.book_copy_id, br.return_date, br.status, c.book_id
            FROM borrow_requests br
            JOIN book_copies c ON br.book_copy_id = c.id
            WHERE br.id = $1
            FOR UPDATE OF br, c
            "#,
        )
        .bind(borrow_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrow request with id {} not found", borrow_id)))?;

        let return_date: Option<DateTime<Utc>> = row.get("return_date");
        if return_date.is_some() {
            return Err(AppError::BusinessRule("Book already returned".to_string()));
        }
        let status: BorrowStatus = row.get("status");
        if !matches!(status, BorrowStatus::Approved | BorrowStatus::Overdue) {
            return Err(AppError::BusinessRule(format!(
                "Borrow record is not open (status: {})",
                status
            )));
        }

        let copy_id: Uuid = row.get("book_copy_id");
        let book_id: Uuid = row.get("book_id");

        sqlx::query(
            "UPDATE borrow_requests SET return_date = $2, status = 'returned', updated_at = NOW() WHERE id = $1",
        )
        .bind(borrow_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE book_copies SET status = 'available' WHERE id = $1")
            .bind(copy_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE books
            SET available_copies = LEAST(available_copies + 1, total_copies), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(%borrow_id, %book_id, "book returned");

        self.get_details(borrow_id).await
    }

    /// Renew a borrow: extends the due date and bumps the renewal counter.
    /// An overdue record goes back to approved, matching the web app.
    pub async fn renew(
        &self,
        borrow_id: Uuid,
        renewal_period_days: i64,
    ) -> AppResult<(DateTime<Utc>, i32)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, BorrowRequest>(
            "SELECT * FROM borrow_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(borrow_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrow request with id {} not found", borrow_id)))?;

        if record.return_date.is_some() {
            return Err(AppError::BusinessRule("Book has already been returned".to_string()));
        }

        let renewal_count = record.renewal_count.unwrap_or(0);
        let max_renewals = record.max_renewals.unwrap_or(2);
        if renewal_count >= max_renewals {
            return Err(AppError::BusinessRule(format!(
                "Maximum renewal limit reached ({}/{})",
                renewal_count, max_renewals
            )));
        }

        let new_due_date = now + Duration::days(renewal_period_days);
        let new_count = renewal_count + 1;

        sqlx::query(
            r#"
            UPDATE borrow_requests
            SET due_date = $2, renewal_count = $3, status = 'approved', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(borrow_id)
        .bind(new_due_date)
        .bind(new_count)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((new_due_date, new_count))
    }

    /// Open (approved or overdue) records past their due date
    pub async fn list_overdue(&self) -> AppResult<Vec<OverdueBorrow>> {
        let records = sqlx::query_as::<_, OverdueBorrow>(
            r#"
            SELECT br.id, br.user_id, u.full_name as user_name, u.email as user_email,
                   b.title as book_title, br.due_date
            FROM borrow_requests br
            JOIN users u ON br.user_id = u.id
            JOIN book_copies c ON br.book_copy_id = c.id
            JOIN books b ON c.book_id = b.id
            WHERE br.status IN ('approved', 'overdue')
              AND br.return_date IS NULL
              AND br.due_date < NOW()
            ORDER BY br.due_date
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Open records due within the next `days_ahead` days (for reminders)
    pub async fn list_due_soon(&self, days_ahead: i64) -> AppResult<Vec<OverdueBorrow>> {
        let records = sqlx::query_as::<_, OverdueBorrow>(
            r#"
            SELECT br.id, br.user_id, u.full_name as user_name, u.email as user_email,
                   b.title as book_title, br.due_date
            FROM borrow_requests br
            JOIN users u ON br.user_id = u.id
            JOIN book_copies c ON br.book_copy_id = c.id
            JOIN books b ON c.book_id = b.id
            WHERE br.status = 'approved'
              AND br.return_date IS NULL
              AND br.due_date >= NOW()
              AND br.due_date < NOW() + ($1 || ' days')::interval
            ORDER BY br.due_date
            "#,
        )
        .bind(days_ahead.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Flip one overdue record and upsert its fine in a single transaction.
    /// Returns true when a new fine row was created. An existing fine is
    /// only rewritten while unpaid; paid, waived and disputed fines are
    /// left alone.
    pub async fn mark_overdue_with_fine(
        &self,
        record: &OverdueBorrow,
        amount: Decimal,
        days_overdue: i64,
        fine_due_days: i64,
    ) -> AppResult<bool> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE borrow_requests SET status = 'overdue', updated_at = NOW() WHERE id = $1 AND return_date IS NULL",
        )
        .bind(record.id)
        .execute(&mut *tx)
        .await?;

        let existing = sqlx::query(
            "SELECT id, status FROM fines WHERE borrow_request_id = $1 AND fine_type = 'overdue' FOR UPDATE",
        )
        .bind(record.id)
        .fetch_optional(&mut *tx)
        .await?;

        let created = match existing {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO fines (
                        user_id, borrow_request_id, fine_type, amount, days_overdue,
                        description, fine_date, due_date, status
                    )
                    VALUES ($1, $2, 'overdue', $3, $4, $5, $6, $7, 'unpaid')
                    "#,
                )
                .bind(record.user_id)
                .bind(record.id)
                .bind(amount)
                .bind(days_overdue as i32)
                .bind(format!("Overdue book: {}", record.book_title))
                .bind(now)
                .bind(now + Duration::days(fine_due_days))
                .execute(&mut *tx)
                .await?;
                true
            }
            Some(row) => {
                let status: String = row.get("status");
                if status == "unpaid" {
                    let fine_id: Uuid = row.get("id");
                    sqlx::query(
                        "UPDATE fines SET amount = $2, days_overdue = $3 WHERE id = $1",
                    )
                    .bind(fine_id)
                    .bind(amount)
                    .bind(days_overdue as i32)
                    .execute(&mut *tx)
                    .await?;
                }
                false
            }
        };

        tx.commit().await?;
        Ok(created)
    }

    /// Count open borrows
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_requests WHERE status IN ('approved', 'overdue')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Count open borrows past their due date
    pub async fn count_overdue(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_requests WHERE return_date IS NULL AND due_date < NOW() AND status IN ('approved', 'overdue')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

fn is_overdue(record: &BorrowDetails, now: DateTime<Utc>) -> bool {
    record.return_date.is_none()
        && matches!(record.status, BorrowStatus::Approved | BorrowStatus::Overdue)
        && record.due_date.map(|d| d < now).unwrap_or(false)
}
