//! User management service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        notification::Notification,
        user::{CreateUser, Department, UpdateUser, User, UserQuery, UserSummary},
    },
    repository::Repository,
};

use super::auth;

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search users with filters
    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<UserSummary>, i64)> {
        self.repository.users.search(query).await
    }

    /// Get user by ID
    pub async fn get(&self, id: Uuid) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Create a user with a freshly hashed password
    pub async fn create(&self, user: CreateUser) -> AppResult<User> {
        if self.repository.users.email_exists(&user.email, None).await? {
            return Err(AppError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
        if let Some(ref student_id) = user.student_id {
            if self.repository.users.student_id_exists(student_id, None).await? {
                return Err(AppError::Conflict(
                    "A user with this student ID already exists".to_string(),
                ));
            }
        }

        let password_hash = auth::hash_password(&user.password)?;
        self.repository.users.create(&user, &password_hash).await
    }

    /// Update a user; an included password is re-hashed
    pub async fn update(&self, id: Uuid, user: UpdateUser) -> AppResult<User> {
        if let Some(ref email) = user.email {
            if self.repository.users.email_exists(email, Some(id)).await? {
                return Err(AppError::Conflict(
                    "A user with this email already exists".to_string(),
                ));
            }
        }
        if let Some(ref student_id) = user.student_id {
            if self
                .repository
                .users
                .student_id_exists(student_id, Some(id))
                .await?
            {
                return Err(AppError::Conflict(
                    "A user with this student ID already exists".to_string(),
                ));
            }
        }

        let password_hash = match user.password {
            Some(ref password) => Some(auth::hash_password(password)?),
            None => None,
        };
        self.repository
            .users
            .update(id, &user, password_hash.as_deref())
            .await
    }

    /// Soft-delete a user
    pub async fn delete(&self, id: Uuid, force: bool) -> AppResult<()> {
        self.repository.users.soft_delete(id, force).await
    }

    /// List departments
    pub async fn list_departments(&self) -> AppResult<Vec<Department>> {
        self.repository.users.list_departments().await
    }

    /// List a user's notifications
    pub async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> AppResult<Vec<Notification>> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository
            .notifications
            .list_for_user(user_id, unread_only)
            .await
    }

    /// Mark a notification read (owner only)
    pub async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Notification> {
        self.repository
            .notifications
            .mark_read(notification_id, user_id)
            .await
    }
}
