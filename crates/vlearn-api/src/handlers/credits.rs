//! Credit balance handler (§6).

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use vlearn_models::UserId;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    pub transcription_credits: u32,
    pub notes_credits: u32,
    pub role: vlearn_models::UserRole,
    pub has_unlimited: bool,
}

/// `GET /api/users/{id}/credits`
pub async fn get_credits(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<CreditsResponse>> {
    let user_id = UserId::from(user_id);
    let store = state.store();

    let user = store
        .users
        .get(&user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("user {user_id} not found")))?;

    Ok(Json(CreditsResponse {
        transcription_credits: user.transcription_credits,
        notes_credits: user.notes_credits,
        role: user.role,
        has_unlimited: user.has_unlimited(),
    }))
}
