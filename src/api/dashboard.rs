//! Administrative dashboard endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, services::dashboard::DashboardResponse, AppState};

use super::AuthenticatedUser;

/// Library-wide totals and recent activity (staff)
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard aggregates", body = DashboardResponse),
        (status = 403, description = "Not staff")
    )
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<DashboardResponse>> {
    claims.require_staff()?;

    let dashboard = state.services.dashboard.get().await?;
    Ok(Json(dashboard))
}
