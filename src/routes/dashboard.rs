use axum::{extract::State, Extension, Json};

use crate::{
    error::AppResult,
    middleware::{auth::AuthUser, request_id::RequestId},
    models::DashboardResponse,
    services::dashboard,
};

use super::AppState;

/// Handler for the dashboard endpoint
pub async fn fetch(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    user: AuthUser,
) -> AppResult<Json<DashboardResponse>> {
    tracing::info!(request_id = %request_id, user_id = %user.id, "Dashboard requested");

    let response =
        dashboard::build_dashboard(state.store.as_ref(), state.metadata.as_ref(), user.id).await?;

    Ok(Json(response))
}
