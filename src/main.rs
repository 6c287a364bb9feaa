//! UniLib Server - University Library Management System

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unilib_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("unilib_server={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting UniLib Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(
        repository,
        config.auth.clone(),
        config.email.clone(),
        config.circulation.clone(),
    )
    .expect("Failed to create services");

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        // Books (catalog)
        .route("/books", get(api::books::list_books))
        .route("/books", post(api::books::create_book))
        .route("/books/:id", get(api::books::get_book))
        .route("/books/:id", put(api::books::update_book))
        .route("/books/:id", delete(api::books::delete_book))
        .route("/books/:id/copies", get(api::books::list_copies))
        .route("/books/:id/copies", post(api::books::create_copy))
        .route("/copies/:id", put(api::books::update_copy))
        .route("/copies/:id", delete(api::books::delete_copy))
        // Users
        .route("/users", get(api::users::list_users))
        .route("/users", post(api::users::create_user))
        .route("/users/:id", get(api::users::get_user))
        .route("/users/:id", put(api::users::update_user))
        .route("/users/:id", delete(api::users::delete_user))
        .route("/users/:id/borrows", get(api::borrows::get_user_borrows))
        .route("/users/:id/reservations", get(api::reservations::get_user_reservations))
        .route("/users/:id/notifications", get(api::users::list_notifications))
        .route("/notifications/:id/read", post(api::users::mark_notification_read))
        .route("/departments", get(api::users::list_departments))
        // Authors / publishers / subjects
        .route("/authors", get(api::authors::list_authors))
        .route("/authors", post(api::authors::create_author))
        .route("/authors/:id", get(api::authors::get_author))
        .route("/authors/:id", put(api::authors::update_author))
        .route("/authors/:id", delete(api::authors::delete_author))
        .route("/publishers", get(api::publishers::list_publishers))
        .route("/publishers", post(api::publishers::create_publisher))
        .route("/publishers/:id", get(api::publishers::get_publisher))
        .route("/publishers/:id", put(api::publishers::update_publisher))
        .route("/publishers/:id", delete(api::publishers::delete_publisher))
        .route("/subjects", get(api::subjects::list_subjects))
        .route("/subjects", post(api::subjects::create_subject))
        .route("/subjects/:id", get(api::subjects::get_subject))
        .route("/subjects/:id", put(api::subjects::update_subject))
        .route("/subjects/:id", delete(api::subjects::delete_subject))
        // Circulation
        .route("/borrows", get(api::borrows::list_borrows))
        .route("/borrows", post(api::borrows::create_borrow))
        .route("/borrows/:id", get(api::borrows::get_borrow))
        .route("/borrows/:id/return", post(api::borrows::return_borrow))
        .route("/borrows/:id/renew", post(api::borrows::renew_borrow))
        .route("/circulation/process-overdue", post(api::borrows::process_overdue))
        .route("/circulation/send-reminders", post(api::borrows::send_reminders))
        // Reservations
        .route("/reservations", post(api::reservations::create_reservation))
        .route("/reservations/:id/cancel", post(api::reservations::cancel_reservation))
        .route("/reservations/expire", post(api::reservations::expire_reservations))
        .route("/books/:id/reservations", get(api::reservations::get_book_reservations))
        .route("/books/:id/reservations/notify-next", post(api::reservations::notify_next))
        // Fines
        .route("/fines", get(api::fines::list_fines))
        .route("/fines/:id", get(api::fines::get_fine))
        .route("/fines/:id/pay", post(api::fines::pay_fine))
        .route("/fines/:id/waive", post(api::fines::waive_fine))
        // Account requests
        .route("/account-requests", post(api::account_requests::submit_account_request))
        .route("/account-requests", get(api::account_requests::list_account_requests))
        .route("/account-requests/:id/approve", post(api::account_requests::approve_account_request))
        .route("/account-requests/:id/reject", post(api::account_requests::reject_account_request))
        // Dashboard
        .route("/dashboard", get(api::dashboard::get_dashboard))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
