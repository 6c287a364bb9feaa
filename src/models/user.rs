//! User model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

use super::enums::{AccountStatus, Role};

/// Full user model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub student_id: Option<String>,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
    pub department_id: Option<Uuid>,
    pub account_status: AccountStatus,
    pub max_books_allowed: i32,
    pub max_days_allowed: i32,
    pub enrollment_date: Option<NaiveDate>,
    pub graduation_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: Option<bool>,
}

/// Short user representation for lists
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub student_id: Option<String>,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub account_status: AccountStatus,
    pub department_name: Option<String>,
    pub active_borrows: Option<i64>,
    pub overdue_borrows: Option<i64>,
}

/// Academic department (referenced by users and account requests)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// User query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    /// Matches name or email
    pub search: Option<String>,
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create user request (admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub role: Role,
    #[validate(length(min = 5, message = "Student ID must be at least 5 characters"))]
    pub student_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub department_id: Option<Uuid>,
    #[validate(range(min = 1, max = 50))]
    pub max_books_allowed: Option<i32>,
    #[validate(range(min = 1, max = 365))]
    pub max_days_allowed: Option<i32>,
    pub enrollment_date: Option<NaiveDate>,
}

/// Update user request (admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    pub full_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    pub role: Option<Role>,
    pub account_status: Option<AccountStatus>,
    pub student_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub department_id: Option<Uuid>,
    #[validate(range(min = 1, max = 50))]
    pub max_books_allowed: Option<i32>,
    #[validate(range(min = 1, max = 365))]
    pub max_days_allowed: Option<i32>,
    pub graduation_date: Option<NaiveDate>,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Require librarian or admin privileges
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization("Librarian privileges required".to_string()))
        }
    }

    /// Staff may act on anyone; everyone else only on their own records
    pub fn require_self_or_staff(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.is_staff() || self.user_id == user_id {
            Ok(())
        } else {
            Err(AppError::Authorization("Access to another user's records denied".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role) -> UserClaims {
        UserClaims {
            sub: "reader@university.edu".to_string(),
            user_id: Uuid::new_v4(),
            role,
            exp: 4102444800,
            iat: 0,
        }
    }

    #[test]
    fn token_round_trip() {
        let claims = claims(Role::Librarian);
        let token = claims.create_token("secret").unwrap();
        let parsed = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.user_id, claims.user_id);
        assert_eq!(parsed.role, Role::Librarian);
        assert!(UserClaims::from_token(&token, "other-secret").is_err());
    }

    #[test]
    fn self_or_staff_checks() {
        let student = claims(Role::Student);
        assert!(student.require_self_or_staff(student.user_id).is_ok());
        assert!(student.require_self_or_staff(Uuid::new_v4()).is_err());
        assert!(student.require_staff().is_err());

        let librarian = claims(Role::Librarian);
        assert!(librarian.require_self_or_staff(Uuid::new_v4()).is_ok());
        assert!(librarian.require_staff().is_ok());
        assert!(librarian.require_admin().is_err());
    }
}
