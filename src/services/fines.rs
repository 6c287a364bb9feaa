//! Fine management service

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        enums::PaymentMethod,
        fine::{Fine, FineQuery},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct FinesService {
    repository: Repository,
}

impl FinesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &FineQuery) -> AppResult<(Vec<Fine>, i64)> {
        self.repository.fines.list(query).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Fine> {
        self.repository.fines.get_by_id(id).await
    }

    pub async fn pay(&self, id: Uuid, method: PaymentMethod) -> AppResult<Fine> {
        self.repository.fines.pay(id, method).await
    }

    pub async fn waive(&self, id: Uuid, waived_by: Uuid, reason: &str) -> AppResult<Fine> {
        self.repository.fines.waive(id, waived_by, reason).await
    }
}
