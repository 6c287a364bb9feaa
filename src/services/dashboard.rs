//! Administrative dashboard aggregates

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::Row;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::borrow::{BorrowDetails, BorrowQuery},
    repository::Repository,
};

/// One labelled count
#[derive(Debug, Serialize, ToSchema)]
pub struct StatEntry {
    pub label: String,
    pub value: i64,
}

/// Dashboard payload
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub books_total: i64,
    pub copies_total: i64,
    pub users_total: i64,
    pub users_by_role: Vec<StatEntry>,
    pub borrows_active: i64,
    pub borrows_overdue: i64,
    pub reservations_active: i64,
    pub account_requests_pending: i64,
    pub fines_unpaid_total: Decimal,
    pub recent_borrows: Vec<BorrowDetails>,
}

#[derive(Clone)]
pub struct DashboardService {
    repository: Repository,
}

impl DashboardService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Database connectivity probe for the readiness endpoint
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.repository.pool)
            .await?;
        Ok(())
    }

    pub async fn get(&self) -> AppResult<DashboardResponse> {
        let pool = &self.repository.pool;

        let books_total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE is_deleted = FALSE")
                .fetch_one(pool)
                .await?;

        let copies_total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM book_copies WHERE is_deleted = FALSE")
                .fetch_one(pool)
                .await?;

        let users_total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_deleted = FALSE")
                .fetch_one(pool)
                .await?;

        let users_by_role = sqlx::query(
            r#"
            SELECT role as label, COUNT(*) as value
            FROM users
            WHERE is_deleted = FALSE
            GROUP BY role
            ORDER BY value DESC
            "#,
        )
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|row| StatEntry {
            label: row.get("label"),
            value: row.get("value"),
        })
        .collect();

        let borrows_active = self.repository.borrows.count_active().await?;
        let borrows_overdue = self.repository.borrows.count_overdue().await?;
        let reservations_active = self.repository.reservations.count_active().await?;
        let account_requests_pending = self.repository.account_requests.count_pending().await?;
        let fines_unpaid_total = self.repository.fines.unpaid_total().await?;

        let (recent_borrows, _) = self
            .repository
            .borrows
            .list(&BorrowQuery {
                status: None,
                user_id: None,
                overdue_only: None,
                page: Some(1),
                per_page: Some(10),
            })
            .await?;

        Ok(DashboardResponse {
            books_total,
            copies_total,
            users_total,
            users_by_role,
            borrows_active,
            borrows_overdue,
            reservations_active,
            account_requests_pending,
            fines_unpaid_total,
            recent_borrows,
        })
    }
}
