//! Repository layer for database operations

pub mod account_requests;
pub mod books;
pub mod borrows;
pub mod catalog;
pub mod fines;
pub mod notifications;
pub mod reservations;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub users: users::UsersRepository,
    pub borrows: borrows::BorrowsRepository,
    pub reservations: reservations::ReservationsRepository,
    pub fines: fines::FinesRepository,
    pub account_requests: account_requests::AccountRequestsRepository,
    pub catalog: catalog::CatalogRepository,
    pub notifications: notifications::NotificationsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            borrows: borrows::BorrowsRepository::new(pool.clone()),
            reservations: reservations::ReservationsRepository::new(pool.clone()),
            fines: fines::FinesRepository::new(pool.clone()),
            account_requests: account_requests::AccountRequestsRepository::new(pool.clone()),
            catalog: catalog::CatalogRepository::new(pool.clone()),
            notifications: notifications::NotificationsRepository::new(pool.clone()),
            pool,
        }
    }
}
