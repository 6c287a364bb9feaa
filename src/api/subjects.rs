//! Subject management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::subject::{CreateSubject, Subject, SubjectQuery, UpdateSubject},
    AppState,
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List subjects with name search
#[utoipa::path(
    get,
    path = "/subjects",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(SubjectQuery),
    responses(
        (status = 200, description = "Paginated subject list", body = PaginatedResponse<Subject>)
    )
)]
pub async fn list_subjects(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<SubjectQuery>,
) -> AppResult<Json<PaginatedResponse<Subject>>> {
    let (subjects, total) = state.services.catalog.list_subjects(&query).await?;

    Ok(Json(PaginatedResponse {
        items: subjects,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(50),
    }))
}

/// Get subject by ID
#[utoipa::path(
    get,
    path = "/subjects/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject details", body = Subject),
        (status = 404, description = "Subject not found")
    )
)]
pub async fn get_subject(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Subject>> {
    let subject = state.services.catalog.get_subject(id).await?;
    Ok(Json(subject))
}

/// Create a new subject
#[utoipa::path(
    post,
    path = "/subjects",
    tag = "catalog",
    security(("bearer_auth" = [])),
    request_body = CreateSubject,
    responses(
        (status = 201, description = "Subject created", body = Subject),
        (status = 409, description = "Duplicate name")
    )
)]
pub async fn create_subject(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(subject): Json<CreateSubject>,
) -> AppResult<(StatusCode, Json<Subject>)> {
    claims.require_staff()?;
    subject
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let created = state.services.catalog.create_subject(subject).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a subject
#[utoipa::path(
    put,
    path = "/subjects/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Subject ID")),
    request_body = UpdateSubject,
    responses(
        (status = 200, description = "Subject updated", body = Subject),
        (status = 404, description = "Subject not found"),
        (status = 409, description = "Duplicate name")
    )
)]
pub async fn update_subject(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(subject): Json<UpdateSubject>,
) -> AppResult<Json<Subject>> {
    claims.require_staff()?;

    let updated = state.services.catalog.update_subject(id, subject).await?;
    Ok(Json(updated))
}

/// Delete a subject (refused while referenced)
#[utoipa::path(
    delete,
    path = "/subjects/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Subject ID")),
    responses(
        (status = 204, description = "Subject deleted"),
        (status = 404, description = "Subject not found"),
        (status = 409, description = "Subject referenced by books or children")
    )
)]
pub async fn delete_subject(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;

    state.services.catalog.delete_subject(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
