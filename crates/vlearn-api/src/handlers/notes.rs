//! Study-notes generation handler (§6).

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use vlearn_core::{CreditLedger, NotesGenerator};
use vlearn_models::{CreditContext, CreditType, Notes, ProcessingStatus, VideoId};

use crate::error::{ApiError, ApiResult};
use crate::handlers::videos::resolve_user_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateNotesRequest {
    pub video_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateNotesResponse {
    pub notes: Notes,
}

/// `POST /api/notes/generate`
pub async fn generate(
    State(state): State<AppState>,
    auth: Option<crate::auth::AuthUser>,
    Json(req): Json<GenerateNotesRequest>,
) -> ApiResult<Json<GenerateNotesResponse>> {
    let user_id = resolve_user_id(auth, req.user_id.as_deref())?;
    let video_id = VideoId::from(req.video_id);

    let store = state.store();

    let video = store
        .videos
        .get(&video_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("video {video_id} not found")))?;

    if video.processing_status != ProcessingStatus::Completed {
        return Err(ApiError::bad_request("video has not finished processing"));
    }
    let Some(transcript) = video.transcript.as_ref() else {
        return Err(ApiError::bad_request("video has no transcript"));
    };

    let ledger = CreditLedger::new(&store.users, &store.credit_history);
    let user = ledger.get_user(&user_id).await.map_err(ApiError::Core)?;

    let cost = state.pipeline_config.notes_cost(transcript.full_text.len());
    let (has_enough, available) = ledger.has_credits(&user, CreditType::Notes, cost);
    if !has_enough {
        return Err(ApiError::InsufficientCredits { required: cost, available });
    }

    let generator = NotesGenerator::new(&store, &state.llm, &state.pipeline_config);
    let notes = generator
        .generate(&video_id, &transcript.full_text)
        .await
        .map_err(ApiError::Core)?;

    ledger
        .deduct(
            &user_id,
            CreditType::Notes,
            cost,
            CreditContext::new("notes generation").with_video_id(video_id),
        )
        .await
        .map_err(ApiError::Core)?;

    Ok(Json(GenerateNotesResponse { notes }))
}
