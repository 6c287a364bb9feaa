//! Account request workflow: submit, approve, reject

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        account_request::{
            AccountRequest, AccountRequestDetails, AccountRequestQuery, ApproveAccountRequest,
            CreateAccountRequest, RejectAccountRequest,
        },
        enums::{NotificationType, RequestStatus, Role},
        user::User,
    },
    repository::Repository,
};

use super::{auth, email::EmailService};

#[derive(Clone)]
pub struct AccountsService {
    repository: Repository,
    email: EmailService,
}

impl AccountsService {
    pub fn new(repository: Repository, email: EmailService) -> Self {
        Self { repository, email }
    }

    /// Submit a self-registration request (public)
    pub async fn submit(&self, request: CreateAccountRequest) -> AppResult<AccountRequest> {
        if self.repository.users.email_exists(&request.email, None).await? {
            return Err(AppError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
        if self
            .repository
            .account_requests
            .pending_email_exists(&request.email)
            .await?
        {
            return Err(AppError::Conflict(
                "A pending request for this email already exists".to_string(),
            ));
        }
        if let Some(ref student_id) = request.student_id {
            if self.repository.users.student_id_exists(student_id, None).await? {
                return Err(AppError::Conflict(
                    "A user with this student ID already exists".to_string(),
                ));
            }
        }

        self.repository.account_requests.create(&request).await
    }

    /// List account requests (admin view)
    pub async fn list(
        &self,
        query: &AccountRequestQuery,
    ) -> AppResult<(Vec<AccountRequestDetails>, i64)> {
        self.repository.account_requests.list(query).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<AccountRequest> {
        self.repository.account_requests.get_by_id(id).await
    }

    /// Approve a request, creating the user account. The approval email is
    /// best-effort: a send failure never fails the approval itself.
    pub async fn approve(
        &self,
        request_id: Uuid,
        reviewer_id: Uuid,
        payload: ApproveAccountRequest,
    ) -> AppResult<User> {
        let request = self.repository.account_requests.get_by_id(request_id).await?;

        if request.status != RequestStatus::Pending {
            return Err(AppError::BusinessRule(
                "Account request has already been processed".to_string(),
            ));
        }
        if self.repository.users.email_exists(&request.email, None).await? {
            return Err(AppError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
        if let Some(ref student_id) = request.student_id {
            if self.repository.users.student_id_exists(student_id, None).await? {
                return Err(AppError::Conflict(
                    "A user with this student ID already exists".to_string(),
                ));
            }
        }

        let password_hash = auth::hash_password(&payload.password)?;
        let role = payload.role.unwrap_or(Role::Student);
        let max_books = payload.max_books_allowed.unwrap_or(5);

        let user = self
            .repository
            .account_requests
            .approve(request_id, reviewer_id, &password_hash, role, max_books)
            .await?;

        let email_sent = match self
            .email
            .send_account_approved(&user.email, &user.full_name)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(user_id = %user.id, "approval email failed: {}", e);
                false
            }
        };

        self.repository
            .notifications
            .create(
                user.id,
                NotificationType::AccountStatus,
                "Account approved",
                "Your library account request has been approved.",
                email_sent,
            )
            .await?;

        Ok(user)
    }

    /// Reject a request with a reason
    pub async fn reject(
        &self,
        request_id: Uuid,
        reviewer_id: Uuid,
        payload: RejectAccountRequest,
    ) -> AppResult<AccountRequest> {
        self.repository
            .account_requests
            .reject(request_id, reviewer_id, &payload.reason)
            .await
    }
}
