//! Publisher management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::publisher::{CreatePublisher, Publisher, PublisherQuery, UpdatePublisher},
    AppState,
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List publishers with name search
#[utoipa::path(
    get,
    path = "/publishers",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(PublisherQuery),
    responses(
        (status = 200, description = "Paginated publisher list", body = PaginatedResponse<Publisher>)
    )
)]
pub async fn list_publishers(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<PublisherQuery>,
) -> AppResult<Json<PaginatedResponse<Publisher>>> {
    let (publishers, total) = state.services.catalog.list_publishers(&query).await?;

    Ok(Json(PaginatedResponse {
        items: publishers,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// Get publisher by ID
#[utoipa::path(
    get,
    path = "/publishers/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Publisher ID")),
    responses(
        (status = 200, description = "Publisher details", body = Publisher),
        (status = 404, description = "Publisher not found")
    )
)]
pub async fn get_publisher(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Publisher>> {
    let publisher = state.services.catalog.get_publisher(id).await?;
    Ok(Json(publisher))
}

/// Create a new publisher
#[utoipa::path(
    post,
    path = "/publishers",
    tag = "catalog",
    security(("bearer_auth" = [])),
    request_body = CreatePublisher,
    responses(
        (status = 201, description = "Publisher created", body = Publisher),
        (status = 409, description = "Duplicate name")
    )
)]
pub async fn create_publisher(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(publisher): Json<CreatePublisher>,
) -> AppResult<(StatusCode, Json<Publisher>)> {
    claims.require_staff()?;
    publisher
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let created = state.services.catalog.create_publisher(publisher).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a publisher
#[utoipa::path(
    put,
    path = "/publishers/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Publisher ID")),
    request_body = UpdatePublisher,
    responses(
        (status = 200, description = "Publisher updated", body = Publisher),
        (status = 404, description = "Publisher not found"),
        (status = 409, description = "Duplicate name")
    )
)]
pub async fn update_publisher(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(publisher): Json<UpdatePublisher>,
) -> AppResult<Json<Publisher>> {
    claims.require_staff()?;

    let updated = state.services.catalog.update_publisher(id, publisher).await?;
    Ok(Json(updated))
}

/// Delete a publisher (refused while referenced by books)
#[utoipa::path(
    delete,
    path = "/publishers/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Publisher ID")),
    responses(
        (status = 204, description = "Publisher deleted"),
        (status = 404, description = "Publisher not found"),
        (status = 409, description = "Publisher referenced by books")
    )
)]
pub async fn delete_publisher(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;

    state.services.catalog.delete_publisher(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
