//! Account requests repository

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        account_request::{
            AccountRequest, AccountRequestDetails, AccountRequestQuery, CreateAccountRequest,
        },
        enums::{RequestStatus, Role},
        user::User,
    },
};

#[derive(Clone)]
pub struct AccountRequestsRepository {
    pool: Pool<Postgres>,
}

impl AccountRequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get account request by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<AccountRequest> {
        sqlx::query_as::<_, AccountRequest>("SELECT * FROM account_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account request with id {} not found", id)))
    }

    /// Check for a pending request with this email
    pub async fn pending_email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM account_requests WHERE LOWER(email) = LOWER($1) AND status = 'pending')",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// List account requests with filters and pagination
    pub async fn list(
        &self,
        query: &AccountRequestQuery,
    ) -> AppResult<(Vec<AccountRequestDetails>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = vec!["TRUE".to_string()];
        let mut params: Vec<String> = Vec::new();

        if let Some(status) = query.status {
            params.push(status.as_str().to_string());
            conditions.push(format!("ar.status = ${}", params.len()));
        }

        let where_clause = conditions.join(" AND ");

        let count_query = format!(
            "SELECT COUNT(*) FROM account_requests ar WHERE {}",
            where_clause
        );
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for p in &params {
            count_builder = count_builder.bind(p);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let list_query = format!(
            r#"
            SELECT ar.id, ar.full_name, ar.email, ar.student_id, ar.phone,
                   d.name as department_name, ar.university_card_url,
                   ar.request_date, ar.status, rv.full_name as reviewer_name,
                   ar.reviewed_at, ar.rejection_reason
            FROM account_requests ar
            LEFT JOIN departments d ON ar.department_id = d.id
            LEFT JOIN users rv ON ar.reviewed_by = rv.id
            WHERE {}
            ORDER BY ar.created_at DESC
            LIMIT {} OFFSET {}
            "#,
            where_clause, per_page, offset
        );
        let mut list_builder = sqlx::query_as::<_, AccountRequestDetails>(&list_query);
        for p in &params {
            list_builder = list_builder.bind(p);
        }
        let requests = list_builder.fetch_all(&self.pool).await?;

        Ok((requests, total))
    }

    /// Create a pending registration request
    pub async fn create(&self, request: &CreateAccountRequest) -> AppResult<AccountRequest> {
        let created = sqlx::query_as::<_, AccountRequest>(
            r#"
            INSERT INTO account_requests (
                full_name, email, student_id, phone, address, department_id,
                university_card_url, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
            RETURNING *
            "#,
        )
        .bind(&request.full_name)
        .bind(&request.email)
        .bind(&request.student_id)
        .bind(&request.phone)
        .bind(&request.address)
        .bind(request.department_id)
        .bind(&request.university_card_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Approve a pending request: create the user and stamp the request in
    /// one transaction. The request row is locked so two reviewers cannot
    /// both approve it.
    pub async fn approve(
        &self,
        request_id: Uuid,
        reviewer_id: Uuid,
        password_hash: &str,
        role: Role,
        max_books_allowed: i32,
    ) -> AppResult<User> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, AccountRequest>(
            "SELECT * FROM account_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Account request with id {} not found", request_id))
        })?;

        if request.status != RequestStatus::Pending {
            return Err(AppError::BusinessRule(
                "Account request has already been processed".to_string(),
            ));
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                full_name, email, student_id, phone, address, password, role,
                department_id, account_status, max_books_allowed, enrollment_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'active', $9, CURRENT_DATE)
            RETURNING *
            "#,
        )
        .bind(&request.full_name)
        .bind(&request.email)
        .bind(&request.student_id)
        .bind(&request.phone)
        .bind(&request.address)
        .bind(password_hash)
        .bind(role)
        .bind(request.department_id)
        .bind(max_books_allowed)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE account_requests
            SET status = 'approved', reviewed_by = $2, reviewed_at = $3,
                approved_user_id = $4, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(request_id)
        .bind(reviewer_id)
        .bind(now)
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(%request_id, user_id = %user.id, "account request approved");

        Ok(user)
    }

    /// Reject a pending request with a reason
    pub async fn reject(
        &self,
        request_id: Uuid,
        reviewer_id: Uuid,
        reason: &str,
    ) -> AppResult<AccountRequest> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, AccountRequest>(
            "SELECT * FROM account_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Account request with id {} not found", request_id))
        })?;

        if request.status != RequestStatus::Pending {
            return Err(AppError::BusinessRule(
                "Account request has already been processed".to_string(),
            ));
        }

        let rejected = sqlx::query_as::<_, AccountRequest>(
            r#"
            UPDATE account_requests
            SET status = 'rejected', reviewed_by = $2, reviewed_at = $3,
                rejection_reason = $4, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(reviewer_id)
        .bind(now)
        .bind(reason)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(rejected)
    }

    /// Count pending requests
    pub async fn count_pending(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM account_requests WHERE status = 'pending'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
