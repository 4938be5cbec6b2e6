//! Per-attempt grading log and learning-report handlers (§6).

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use vlearn_core::ReportGenerator;
use vlearn_models::{Attempt, QuestionId, QuestionType, QuizId, Report, VideoId};

use crate::error::{ApiError, ApiResult};
use crate::handlers::videos::resolve_user_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecordAttemptRequest {
    pub video_id: String,
    pub question_id: String,
    pub question_type: QuestionType,
    pub selected_answer: u8,
    #[serde(default)]
    pub quiz_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordAttemptResponse {
    pub success: bool,
    pub is_correct: bool,
    pub attempt_number: u32,
}

/// `POST /api/reports/attempt`
///
/// Records a single graded answer against a flashcard or quiz question,
/// independent of the bulk quiz-submission flow, so inline flashcard
/// attempts (graded one at a time during playback) share the same
/// append-only log as quiz attempts.
pub async fn record_attempt(
    State(state): State<AppState>,
    auth: Option<crate::auth::AuthUser>,
    Json(req): Json<RecordAttemptRequest>,
) -> ApiResult<Json<RecordAttemptResponse>> {
    let user_id = resolve_user_id(auth, req.user_id.as_deref())?;
    let video_id = VideoId::from(req.video_id);
    let question_id = QuestionId::from(req.question_id);

    let store = state.store();
    let question = store
        .questions
        .get(&video_id, &question_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("question {question_id} not found")))?;

    let attempt_number = store.attempts.count_prior(&user_id, &question_id).await? + 1;
    let quiz_id = req.quiz_id.map(QuizId::from);
    let attempt = Attempt::new(
        user_id,
        video_id,
        question_id,
        req.question_type,
        req.selected_answer,
        question.correct_answer,
        attempt_number,
        quiz_id,
    );
    let is_correct = attempt.is_correct;
    store.attempts.record(&attempt).await?;

    Ok(Json(RecordAttemptResponse { success: true, is_correct, attempt_number }))
}

#[derive(Debug, Deserialize)]
pub struct GenerateReportRequest {
    pub user_id: String,
    pub video_id: String,
    pub quiz_id: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateReportResponse {
    pub report_id: String,
    pub report: Report,
}

/// `POST /api/reports/generate`
pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateReportRequest>,
) -> ApiResult<Json<GenerateReportResponse>> {
    let user_id = crate::handlers::videos::resolve_user_id(None, Some(&req.user_id))?;
    let video_id = VideoId::from(req.video_id);
    let quiz_id = QuizId::from(req.quiz_id);

    let store = state.store();
    let video = store
        .videos
        .get(&video_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("video {video_id} not found")))?;
    let full_text = video.transcript.as_ref().map(|t| t.full_text.as_str()).unwrap_or("");

    let generator = ReportGenerator::new(&store, &state.llm, &state.pipeline_config);
    let report = generator
        .generate(&user_id, &video_id, &quiz_id, full_text)
        .await
        .map_err(ApiError::Core)?;

    Ok(Json(GenerateReportResponse { report_id: report.id.to_string(), report }))
}
