//! Circulation service: borrow, return, renew

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    config::CirculationConfig,
    error::{AppError, AppResult},
    models::{
        borrow::{BorrowDetails, BorrowQuery, CreateBorrow},
        enums::AccountStatus,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    config: CirculationConfig,
}

impl CirculationService {
    pub fn new(repository: Repository, config: CirculationConfig) -> Self {
        Self { repository, config }
    }

    /// Borrow a book for a user. The availability and per-user limit checks
    /// run inside the repository transaction; this layer vets the account.
    pub async fn borrow(
        &self,
        request: CreateBorrow,
        librarian_id: Option<Uuid>,
    ) -> AppResult<BorrowDetails> {
        let user = self.repository.users.get_by_id(request.user_id).await?;

        if user.account_status != AccountStatus::Active {
            return Err(AppError::BusinessRule(format!(
                "Account is {} and cannot borrow",
                user.account_status
            )));
        }

        self.repository
            .borrows
            .create_borrow(&user, request.book_id, librarian_id)
            .await
    }

    /// Return a borrowed book. Reservation hand-off is not triggered here;
    /// the queue is served through the explicit notify-next operation.
    pub async fn return_book(&self, borrow_id: Uuid) -> AppResult<BorrowDetails> {
        self.repository.borrows.return_borrow(borrow_id).await
    }

    /// Renew a borrow, extending the due date by the configured period
    pub async fn renew(&self, borrow_id: Uuid) -> AppResult<(DateTime<Utc>, i32)> {
        self.repository
            .borrows
            .renew(borrow_id, self.config.renewal_period_days)
            .await
    }

    /// Get one borrow record with display fields
    pub async fn get(&self, borrow_id: Uuid) -> AppResult<BorrowDetails> {
        self.repository.borrows.get_details(borrow_id).await
    }

    /// List borrow records with filters
    pub async fn list(&self, query: &BorrowQuery) -> AppResult<(Vec<BorrowDetails>, i64)> {
        self.repository.borrows.list(query).await
    }

    /// List a user's borrow records (history included)
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<BorrowDetails>> {
        self.repository.users.get_by_id(user_id).await?;
        let query = BorrowQuery {
            status: None,
            user_id: Some(user_id),
            overdue_only: None,
            page: Some(1),
            per_page: Some(100),
        };
        let (records, _) = self.repository.borrows.list(&query).await?;
        Ok(records)
    }
}
