//! Business logic services

pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod circulation;
pub mod dashboard;
pub mod email;
pub mod fines;
pub mod overdue;
pub mod reservations;
pub mod users;

use crate::{
    config::{AuthConfig, CirculationConfig, EmailConfig},
    error::AppResult,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub circulation: circulation::CirculationService,
    pub reservations: reservations::ReservationsService,
    pub fines: fines::FinesService,
    pub overdue: overdue::OverdueService,
    pub accounts: accounts::AccountsService,
    pub dashboard: dashboard::DashboardService,
    pub email: email::EmailService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        email_config: EmailConfig,
        circulation_config: CirculationConfig,
    ) -> AppResult<Self> {
        let email = email::EmailService::new(email_config);
        Ok(Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            users: users::UsersService::new(repository.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            circulation: circulation::CirculationService::new(
                repository.clone(),
                circulation_config.clone(),
            ),
            reservations: reservations::ReservationsService::new(
                repository.clone(),
                circulation_config.clone(),
                email.clone(),
            ),
            overdue: overdue::OverdueService::new(
                repository.clone(),
                circulation_config,
                email.clone(),
            ),
            fines: fines::FinesService::new(repository.clone()),
            accounts: accounts::AccountsService::new(repository.clone(), email.clone()),
            dashboard: dashboard::DashboardService::new(repository),
            email,
        })
    }
}
