//! Book (catalog entry) and book copy models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::{CopyCondition, CopyStatus};

/// Full book model (DB + API). Authors and subjects are loaded separately.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub isbn_13: Option<String>,
    pub isbn_10: Option<String>,
    pub publisher_id: Uuid,
    pub publication_year: i32,
    pub edition: Option<String>,
    pub pages: Option<i32>,
    pub language: String,
    pub description: Option<String>,
    pub shelf_location: String,
    pub acquisition_date: Option<NaiveDate>,
    pub acquisition_price: Option<Decimal>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: Option<bool>,
    // Relations (loaded separately)
    #[sqlx(skip)]
    #[serde(default)]
    pub publisher_name: Option<String>,
    #[sqlx(skip)]
    #[serde(default)]
    pub authors: Vec<BookAuthorRef>,
    #[sqlx(skip)]
    #[serde(default)]
    pub subjects: Vec<BookSubjectRef>,
}

/// Author attached to a book, in display order
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookAuthorRef {
    pub id: Uuid,
    pub full_name: String,
    pub author_order: Option<i32>,
}

/// Subject attached to a book
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSubjectRef {
    pub id: Uuid,
    pub name: String,
}

/// Short book representation for search results and lists
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub isbn_13: Option<String>,
    pub publication_year: i32,
    pub language: String,
    pub shelf_location: String,
    pub total_copies: i32,
    pub available_copies: i32,
    pub publisher_name: Option<String>,
    #[sqlx(skip)]
    #[serde(default)]
    pub authors: Vec<String>,
}

/// One physical circulation unit of a book
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BookCopy {
    pub id: Uuid,
    pub book_id: Uuid,
    pub copy_number: String,
    pub barcode: Option<String>,
    pub status: CopyStatus,
    pub condition_rating: CopyCondition,
    pub acquired_date: Option<NaiveDate>,
    pub last_maintenance: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub is_deleted: Option<bool>,
}

/// Book query parameters. `availability` accepts "available" / "unavailable".
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Matches title, subtitle or ISBN
    pub search: Option<String>,
    pub language: Option<String>,
    pub availability: Option<String>,
    pub publisher_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub subtitle: Option<String>,
    #[validate(length(equal = 13, message = "ISBN-13 must be 13 digits"))]
    pub isbn_13: Option<String>,
    #[validate(length(equal = 10, message = "ISBN-10 must be 10 characters"))]
    pub isbn_10: Option<String>,
    pub publisher_id: Uuid,
    #[validate(range(min = 1400, message = "Implausible publication year"))]
    pub publication_year: i32,
    pub edition: Option<String>,
    #[validate(range(min = 1))]
    pub pages: Option<i32>,
    pub language: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "Shelf location is required"))]
    pub shelf_location: String,
    pub acquisition_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub total_copies: Option<i32>,
    #[serde(default)]
    pub author_ids: Vec<Uuid>,
    #[serde(default)]
    pub subject_ids: Vec<Uuid>,
}

/// Update book request. Author/subject lists, when present, replace the links.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub isbn_13: Option<String>,
    pub isbn_10: Option<String>,
    pub publisher_id: Option<Uuid>,
    pub publication_year: Option<i32>,
    pub edition: Option<String>,
    pub pages: Option<i32>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub shelf_location: Option<String>,
    pub acquisition_price: Option<Decimal>,
    pub author_ids: Option<Vec<Uuid>>,
    pub subject_ids: Option<Vec<Uuid>>,
}

/// Create copy request. Copy numbers are assigned sequentially by the server.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCopy {
    pub barcode: Option<String>,
    pub condition_rating: Option<CopyCondition>,
    pub notes: Option<String>,
}

/// Update copy request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCopy {
    pub status: Option<CopyStatus>,
    pub condition_rating: Option<CopyCondition>,
    pub last_maintenance: Option<NaiveDate>,
    pub notes: Option<String>,
}
