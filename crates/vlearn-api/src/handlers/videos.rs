//! Video intake, status, read, and delete handlers (§6).

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use vlearn_core::PipelineOrchestrator;
use vlearn_models::{ProjectId, Question, ProcessingStatus, Transcript, UserId, VideoId};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::security;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProcessVideoRequest {
    pub video_url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    /// Present for callers that don't carry an `X-User-Id` header, e.g.
    /// service-to-service submission on a user's behalf.
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProcessVideoResponse {
    pub video_id: String,
    pub title: String,
    pub duration: f64,
    pub url: String,
    pub processing_status: ProcessingStatus,
    pub message: String,
}

/// `POST /api/video/process-async`
pub async fn process_async(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Json(req): Json<ProcessVideoRequest>,
) -> ApiResult<Json<ProcessVideoResponse>> {
    let user_id = resolve_user_id(auth, req.user_id.as_deref())?;
    let project_id = req.project_id.map(ProjectId::from);
    let video_url = security::validate_video_url(&req.video_url)
        .into_result()
        .map_err(ApiError::bad_request)?;
    let title = req.title.as_deref().map(security::sanitize_title);

    let store = state.store();
    let orchestrator = PipelineOrchestrator::new(
        &store,
        &state.queue,
        &state.intake_config,
        &state.pipeline_config,
    )
    .with_progress(&state.progress);

    let result = orchestrator
        .submit(&user_id, &video_url, title.as_deref(), project_id)
        .await
        .map_err(ApiError::Core)?;

    let video = store
        .videos
        .get(&result.video_id)
        .await?
        .ok_or_else(|| ApiError::internal("video vanished immediately after submission"))?;

    let message = if result.already_processing {
        "video is already being processed".to_string()
    } else {
        crate::metrics::record_job_enqueued("process_video");
        "video submitted for processing".to_string()
    };

    Ok(Json(ProcessVideoResponse {
        video_id: video.id.to_string(),
        title: video.title,
        duration: video.duration,
        url: video.source_url,
        processing_status: video.processing_status,
        message,
    }))
}

#[derive(Debug, Serialize)]
pub struct VideoStatusResponse {
    pub processing_status: ProcessingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub has_transcript: bool,
    pub flashcard_count: usize,
    pub batch_current: u32,
    pub batch_total: u32,
}

/// `GET /api/video/{id}/status`
pub async fn get_status(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoStatusResponse>> {
    let video_id = VideoId::from(video_id);
    let store = state.store();

    let video = store
        .videos
        .get(&video_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("video {video_id} not found")))?;

    let flashcard_count = store.questions.list_flashcards(&video_id).await?.len();

    Ok(Json(VideoStatusResponse {
        processing_status: video.processing_status,
        error_message: video.error_message,
        has_transcript: video.transcript.is_some(),
        flashcard_count,
        batch_current: video.batch_current,
        batch_total: video.batch_total,
    }))
}

#[derive(Debug, Serialize)]
pub struct VideoDetailResponse {
    pub id: String,
    pub title: String,
    pub duration: f64,
    pub source_url: String,
    pub processing_status: ProcessingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Transcript>,
    pub questions: Vec<Question>,
}

/// `GET /api/video/{id}`
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoDetailResponse>> {
    let video_id = VideoId::from(video_id);
    let store = state.store();

    let video = store
        .videos
        .get(&video_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("video {video_id} not found")))?;

    let questions = store.questions.list_flashcards(&video_id).await?;

    Ok(Json(VideoDetailResponse {
        id: video.id.to_string(),
        title: video.title,
        duration: video.duration,
        source_url: video.source_url,
        processing_status: video.processing_status,
        error_message: video.error_message,
        transcript: video.transcript,
        questions,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DeleteVideoQuery {
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteVideoResponse {
    pub message: String,
    pub deleted_completely: bool,
}

/// `DELETE /api/video/{id}?project_id=…`
pub async fn delete_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<DeleteVideoQuery>,
) -> ApiResult<Json<DeleteVideoResponse>> {
    let video_id = VideoId::from(video_id);
    let project_id = query.project_id.map(ProjectId::from);

    let store = state.store();
    let orchestrator = PipelineOrchestrator::new(
        &store,
        &state.queue,
        &state.intake_config,
        &state.pipeline_config,
    );

    orchestrator
        .delete_video(&video_id, project_id.as_ref())
        .await
        .map_err(ApiError::Core)?;

    let deleted_completely = store.videos.get(&video_id).await?.is_none();

    Ok(Json(DeleteVideoResponse {
        message: "video unlinked".to_string(),
        deleted_completely,
    }))
}

/// Resolve the effective caller identity: the trusted auth header wins, the
/// request-body `user_id` is a fallback for unauthenticated or
/// service-to-service callers.
pub(crate) fn resolve_user_id(auth: Option<AuthUser>, body_user_id: Option<&str>) -> ApiResult<UserId> {
    if let Some(AuthUser(user_id)) = auth {
        return Ok(user_id);
    }
    body_user_id
        .filter(|s| !s.is_empty())
        .map(UserId::from)
        .ok_or_else(|| ApiError::unauthorized("no user identity provided"))
}
