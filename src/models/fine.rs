//! Fine model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::{FineStatus, FineType, PaymentMethod};

/// Fine model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Fine {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub borrow_request_id: Option<Uuid>,
    pub waived_by: Option<Uuid>,
    pub fine_type: FineType,
    pub amount: Decimal,
    pub days_overdue: Option<i32>,
    pub description: Option<String>,
    pub fine_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub paid_date: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    pub waived_reason: Option<String>,
    pub status: FineStatus,
    pub created_at: Option<DateTime<Utc>>,
}

/// Fine list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct FineQuery {
    pub user_id: Option<Uuid>,
    pub status: Option<FineStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Record a payment on a fine
#[derive(Debug, Deserialize, ToSchema)]
pub struct PayFine {
    pub payment_method: PaymentMethod,
}

/// Waive a fine (staff only); the database requires a reason
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct WaiveFine {
    #[validate(length(min = 1, message = "A waiver reason is required"))]
    pub reason: String,
}
