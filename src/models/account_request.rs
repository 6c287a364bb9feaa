//! Account request (pending registration) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::{RequestStatus, Role};

/// Account request model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AccountRequest {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub student_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub department_id: Option<Uuid>,
    pub university_card_url: Option<String>,
    pub request_date: Option<DateTime<Utc>>,
    pub status: RequestStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub approved_user_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Account request with joined display fields
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AccountRequestDetails {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub student_id: Option<String>,
    pub phone: Option<String>,
    pub department_name: Option<String>,
    pub university_card_url: Option<String>,
    pub request_date: Option<DateTime<Utc>>,
    pub status: RequestStatus,
    pub reviewer_name: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

/// Public self-registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 5, message = "Student ID must be at least 5 characters"))]
    pub student_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub department_id: Option<Uuid>,
    #[validate(url(message = "Invalid card URL"))]
    pub university_card_url: Option<String>,
}

/// Approve an account request, creating the user
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApproveAccountRequest {
    /// Initial password for the new account
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// Role for the new account (defaults to student)
    pub role: Option<Role>,
    pub max_books_allowed: Option<i32>,
}

/// Reject an account request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectAccountRequest {
    #[validate(length(min = 1, message = "A rejection reason is required"))]
    pub reason: String,
}

/// Account request list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AccountRequestQuery {
    pub status: Option<RequestStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
