//! Subject (classification) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub parent_subject_id: Option<Uuid>,
    /// Dewey decimal code, e.g. "005.133"
    pub dewey_decimal: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSubject {
    #[validate(length(min = 1, message = "Subject name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub parent_subject_id: Option<Uuid>,
    pub dewey_decimal: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSubject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_subject_id: Option<Uuid>,
    pub dewey_decimal: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SubjectQuery {
    pub name: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
