//! Fines repository

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{FineStatus, PaymentMethod},
        fine::{Fine, FineQuery},
    },
};

#[derive(Clone)]
pub struct FinesRepository {
    pool: Pool<Postgres>,
}

impl FinesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get fine by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Fine> {
        sqlx::query_as::<_, Fine>("SELECT * FROM fines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Fine with id {} not found", id)))
    }

    /// List fines with filters and pagination
    pub async fn list(&self, query: &FineQuery) -> AppResult<(Vec<Fine>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = vec!["TRUE".to_string()];
        let mut params: Vec<String> = Vec::new();

        if let Some(user_id) = query.user_id {
            params.push(user_id.to_string());
            conditions.push(format!("user_id = ${}::uuid", params.len()));
        }
        if let Some(status) = query.status {
            params.push(status.as_str().to_string());
            conditions.push(format!("status = ${}", params.len()));
        }

        let where_clause = conditions.join(" AND ");

        let count_query = format!("SELECT COUNT(*) FROM fines WHERE {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for p in &params {
            count_builder = count_builder.bind(p);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let list_query = format!(
            "SELECT * FROM fines WHERE {} ORDER BY fine_date DESC LIMIT {} OFFSET {}",
            where_clause, per_page, offset
        );
        let mut list_builder = sqlx::query_as::<_, Fine>(&list_query);
        for p in &params {
            list_builder = list_builder.bind(p);
        }
        let fines = list_builder.fetch_all(&self.pool).await?;

        Ok((fines, total))
    }

    /// Record a payment. Only unpaid or disputed fines can be paid.
    pub async fn pay(&self, id: Uuid, method: PaymentMethod) -> AppResult<Fine> {
        let fine = self.get_by_id(id).await?;

        if !matches!(fine.status, FineStatus::Unpaid | FineStatus::Disputed) {
            return Err(AppError::BusinessRule(format!(
                "Fine is not payable (status: {})",
                fine.status
            )));
        }

        let paid = sqlx::query_as::<_, Fine>(
            r#"
            UPDATE fines
            SET status = 'paid', paid_date = $2, payment_method = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .bind(method)
        .fetch_one(&self.pool)
        .await?;

        Ok(paid)
    }

    /// Waive a fine. The check constraint requires both reviewer and reason.
    pub async fn waive(&self, id: Uuid, waived_by: Uuid, reason: &str) -> AppResult<Fine> {
        let fine = self.get_by_id(id).await?;

        if !matches!(fine.status, FineStatus::Unpaid | FineStatus::Disputed) {
            return Err(AppError::BusinessRule(format!(
                "Fine cannot be waived (status: {})",
                fine.status
            )));
        }

        let waived = sqlx::query_as::<_, Fine>(
            r#"
            UPDATE fines
            SET status = 'waived', waived_by = $2, waived_reason = $3, payment_method = 'waived'
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(waived_by)
        .bind(reason)
        .fetch_one(&self.pool)
        .await?;

        Ok(waived)
    }

    /// Sum of unpaid fine amounts across the library
    pub async fn unpaid_total(&self) -> AppResult<Decimal> {
        let total: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(amount) FROM fines WHERE status = 'unpaid'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(total.unwrap_or_default())
    }
}
