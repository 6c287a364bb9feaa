//! Users repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, Department, UpdateUser, User, UserQuery, UserSummary},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID (soft-deleted users are invisible)
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by email (primary authentication method)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1) AND is_deleted = FALSE",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND id != $2 AND is_deleted = FALSE)",
            )
            .bind(email)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND is_deleted = FALSE)",
            )
            .bind(email)
            .fetch_one(&self.pool)
            .await?
        };
        Ok(exists)
    }

    /// Check if student ID already exists
    pub async fn student_id_exists(&self, student_id: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE student_id = $1 AND id != $2 AND is_deleted = FALSE)",
            )
            .bind(student_id)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE student_id = $1 AND is_deleted = FALSE)",
            )
            .bind(student_id)
            .fetch_one(&self.pool)
            .await?
        };
        Ok(exists)
    }

    /// Search users with filters and pagination
    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<UserSummary>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = vec!["u.is_deleted = FALSE".to_string()];
        let mut params: Vec<String> = Vec::new();

        if let Some(ref search) = query.search {
            params.push(format!("%{}%", search.to_lowercase()));
            conditions.push(format!(
                "(LOWER(u.full_name) LIKE ${n} OR LOWER(u.email) LIKE ${n} OR u.student_id LIKE ${n})",
                n = params.len()
            ));
        }
        if let Some(role) = query.role {
            params.push(role.as_str().to_string());
            conditions.push(format!("u.role = ${}", params.len()));
        }
        if let Some(status) = query.status {
            params.push(status.as_str().to_string());
            conditions.push(format!("u.account_status = ${}", params.len()));
        }

        let where_clause = conditions.join(" AND ");

        let count_query = format!("SELECT COUNT(*) FROM users u WHERE {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for p in &params {
            count_builder = count_builder.bind(p);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let list_query = format!(
            r#"
            SELECT u.id, u.student_id, u.full_name, u.email, u.role, u.account_status,
                   d.name as department_name,
                   (SELECT COUNT(*) FROM borrow_requests br
                    WHERE br.user_id = u.id AND br.status IN ('approved', 'overdue')) as active_borrows,
                   (SELECT COUNT(*) FROM borrow_requests br
                    WHERE br.user_id = u.id AND br.status = 'overdue') as overdue_borrows
            FROM users u
            LEFT JOIN departments d ON u.department_id = d.id
            WHERE {}
            ORDER BY u.full_name
            LIMIT {} OFFSET {}
            "#,
            where_clause, per_page, offset
        );
        let mut list_builder = sqlx::query_as::<_, UserSummary>(&list_query);
        for p in &params {
            list_builder = list_builder.bind(p);
        }
        let users = list_builder.fetch_all(&self.pool).await?;

        Ok((users, total))
    }

    /// Create a new user. `password_hash` is the already-hashed credential.
    pub async fn create(&self, user: &CreateUser, password_hash: &str) -> AppResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                full_name, email, password, role, student_id, phone, address,
                department_id, max_books_allowed, max_days_allowed, enrollment_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, 5), COALESCE($10, 14), $11)
            RETURNING *
            "#,
        )
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(password_hash)
        .bind(user.role)
        .bind(&user.student_id)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(user.department_id)
        .bind(user.max_books_allowed)
        .bind(user.max_days_allowed)
        .bind(user.enrollment_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update a user. `password_hash`, when set, replaces the credential.
    pub async fn update(
        &self,
        id: Uuid,
        user: &UpdateUser,
        password_hash: Option<&str>,
    ) -> AppResult<User> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                password = COALESCE($4, password),
                role = COALESCE($5, role),
                account_status = COALESCE($6, account_status),
                student_id = COALESCE($7, student_id),
                phone = COALESCE($8, phone),
                address = COALESCE($9, address),
                department_id = COALESCE($10, department_id),
                max_books_allowed = COALESCE($11, max_books_allowed),
                max_days_allowed = COALESCE($12, max_days_allowed),
                graduation_date = COALESCE($13, graduation_date),
                updated_at = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(password_hash)
        .bind(user.role)
        .bind(user.account_status)
        .bind(&user.student_id)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(user.department_id)
        .bind(user.max_books_allowed)
        .bind(user.max_days_allowed)
        .bind(user.graduation_date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        Ok(updated)
    }

    /// Soft-delete a user. Refused while the user has open borrows unless forced.
    pub async fn soft_delete(&self, id: Uuid, force: bool) -> AppResult<()> {
        let open_borrows: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_requests WHERE user_id = $1 AND status IN ('approved', 'overdue')",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if open_borrows > 0 && !force {
            return Err(AppError::Conflict(format!(
                "User has {} active borrow(s)",
                open_borrows
            )));
        }

        let result = sqlx::query(
            "UPDATE users SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    /// Count open (approved or overdue) borrows for a user
    pub async fn count_open_borrows(&self, user_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_requests WHERE user_id = $1 AND status IN ('approved', 'overdue')",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// List all departments (for registration forms)
    pub async fn list_departments(&self) -> AppResult<Vec<Department>> {
        let departments = sqlx::query_as::<_, Department>(
            "SELECT * FROM departments ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(departments)
    }
}
