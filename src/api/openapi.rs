//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    account_requests, auth, authors, books, borrows, dashboard, fines, health, publishers,
    reservations, subjects, users,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "UniLib API",
        version = "0.3.0",
        description = "University Library Management System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Books & copies
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::list_copies,
        books::create_copy,
        books::update_copy,
        books::delete_copy,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::list_departments,
        users::list_notifications,
        users::mark_notification_read,
        // Catalog side entities
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        publishers::list_publishers,
        publishers::get_publisher,
        publishers::create_publisher,
        publishers::update_publisher,
        publishers::delete_publisher,
        subjects::list_subjects,
        subjects::get_subject,
        subjects::create_subject,
        subjects::update_subject,
        subjects::delete_subject,
        // Circulation
        borrows::list_borrows,
        borrows::create_borrow,
        borrows::get_borrow,
        borrows::return_borrow,
        borrows::renew_borrow,
        borrows::get_user_borrows,
        borrows::process_overdue,
        borrows::send_reminders,
        // Reservations
        reservations::create_reservation,
        reservations::cancel_reservation,
        reservations::get_user_reservations,
        reservations::get_book_reservations,
        reservations::notify_next,
        reservations::expire_reservations,
        // Fines
        fines::list_fines,
        fines::get_fine,
        fines::pay_fine,
        fines::waive_fine,
        // Account requests
        account_requests::submit_account_request,
        account_requests::list_account_requests,
        account_requests::approve_account_request,
        account_requests::reject_account_request,
        // Dashboard
        dashboard::get_dashboard,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::BookAuthorRef,
            crate::models::book::BookSubjectRef,
            crate::models::book::BookCopy,
            crate::models::book::BookQuery,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book::CreateCopy,
            crate::models::book::UpdateCopy,
            // Users
            crate::models::user::User,
            crate::models::user::UserSummary,
            crate::models::user::Department,
            crate::models::user::UserQuery,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            // Catalog side entities
            crate::models::author::Author,
            crate::models::author::CreateAuthor,
            crate::models::author::UpdateAuthor,
            crate::models::publisher::Publisher,
            crate::models::publisher::CreatePublisher,
            crate::models::publisher::UpdatePublisher,
            crate::models::subject::Subject,
            crate::models::subject::CreateSubject,
            crate::models::subject::UpdateSubject,
            // Circulation
            crate::models::borrow::BorrowRequest,
            crate::models::borrow::BorrowDetails,
            crate::models::borrow::CreateBorrow,
            crate::models::borrow::BorrowQuery,
            borrows::RenewResponse,
            crate::services::overdue::OverdueReport,
            crate::services::overdue::ReminderReport,
            // Reservations
            crate::models::reservation::Reservation,
            crate::models::reservation::ReservationDetails,
            crate::models::reservation::CreateReservation,
            crate::services::reservations::NotifyNextOutcome,
            reservations::ExpireResponse,
            // Fines
            crate::models::fine::Fine,
            crate::models::fine::FineQuery,
            crate::models::fine::PayFine,
            crate::models::fine::WaiveFine,
            // Account requests
            crate::models::account_request::AccountRequest,
            crate::models::account_request::AccountRequestDetails,
            crate::models::account_request::AccountRequestQuery,
            crate::models::account_request::CreateAccountRequest,
            crate::models::account_request::ApproveAccountRequest,
            crate::models::account_request::RejectAccountRequest,
            // Notifications
            crate::models::notification::Notification,
            // Dashboard
            crate::services::dashboard::DashboardResponse,
            crate::services::dashboard::StatEntry,
            // Enums
            crate::models::enums::Role,
            crate::models::enums::AccountStatus,
            crate::models::enums::CopyStatus,
            crate::models::enums::CopyCondition,
            crate::models::enums::BorrowStatus,
            crate::models::enums::ReservationStatus,
            crate::models::enums::FineType,
            crate::models::enums::FineStatus,
            crate::models::enums::PaymentMethod,
            crate::models::enums::RequestStatus,
            crate::models::enums::NotificationType,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Book catalog and copies"),
        (name = "users", description = "User management"),
        (name = "catalog", description = "Authors, publishers, subjects"),
        (name = "circulation", description = "Borrow, return, renew, overdue processing"),
        (name = "reservations", description = "Reservation queues"),
        (name = "fines", description = "Fine management"),
        (name = "accounts", description = "Account requests"),
        (name = "dashboard", description = "Administrative dashboard")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
