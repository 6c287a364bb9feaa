//! Borrow request model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::enums::BorrowStatus;

/// Borrow request model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BorrowRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_copy_id: Uuid,
    pub librarian_id: Option<Uuid>,
    pub request_date: Option<DateTime<Utc>>,
    pub approved_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: BorrowStatus,
    pub rejection_reason: Option<String>,
    pub renewal_count: Option<i32>,
    pub max_renewals: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Borrow record with joined display fields
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BorrowDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub book_id: Uuid,
    pub book_title: String,
    pub book_copy_id: Uuid,
    pub copy_number: String,
    pub borrow_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: BorrowStatus,
    pub renewal_count: Option<i32>,
    pub max_renewals: Option<i32>,
    #[sqlx(skip)]
    #[serde(default)]
    pub is_overdue: bool,
}

/// Create borrow request: the server picks an available copy of the book
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBorrow {
    pub user_id: Uuid,
    pub book_id: Uuid,
}

/// Borrow list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BorrowQuery {
    pub status: Option<BorrowStatus>,
    pub user_id: Option<Uuid>,
    /// Restrict to unreturned records past their due date
    pub overdue_only: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// A borrow past due, as seen by the overdue processor
#[derive(Debug, Clone, FromRow)]
pub struct OverdueBorrow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub book_title: String,
    pub due_date: DateTime<Utc>,
}
