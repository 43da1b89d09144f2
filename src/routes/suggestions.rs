use axum::{extract::State, Extension, Json};

use crate::{
    error::AppResult,
    middleware::{auth::AuthUser, request_id::RequestId},
    models::SuggestionsResponse,
    services::suggestions,
};

use super::AppState;

/// Handler for the suggestions endpoint
pub async fn fetch(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    user: AuthUser,
) -> AppResult<Json<SuggestionsResponse>> {
    tracing::info!(request_id = %request_id, user_id = %user.id, "Suggestions requested");

    let response = suggestions::suggest_titles(
        state.store.as_ref(),
        state.metadata.as_ref(),
        state.completions.as_ref(),
        user.id,
    )
    .await?;

    Ok(Json(response))
}
