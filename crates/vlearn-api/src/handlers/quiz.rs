//! Quiz generation and submission handlers (§6).

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use vlearn_core::CreditLedger;
use vlearn_models::{
    Attempt, CreditContext, CreditType, Question, QuestionId, QuestionType, QuizId, VideoId,
};

use crate::error::{ApiError, ApiResult};
use crate::handlers::videos::resolve_user_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateQuizRequest {
    pub video_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateQuizResponse {
    pub quiz_id: String,
    pub questions: Vec<Question>,
    pub total_questions: usize,
}

/// `POST /api/quiz/generate`
pub async fn generate(
    State(state): State<AppState>,
    auth: Option<crate::auth::AuthUser>,
    Json(req): Json<GenerateQuizRequest>,
) -> ApiResult<Json<GenerateQuizResponse>> {
    let user_id = resolve_user_id(auth, req.user_id.as_deref())?;
    let video_id = VideoId::from(req.video_id);

    let store = state.store();
    let ledger = CreditLedger::new(&store.users, &store.credit_history);
    let user = ledger.get_user(&user_id).await.map_err(ApiError::Core)?;

    let cost = state.pipeline_config.quiz_generation_cost;
    let (has_enough, available) = ledger.has_credits(&user, CreditType::Notes, cost);
    if !has_enough {
        return Err(ApiError::InsufficientCredits { required: cost, available });
    }

    let planner = vlearn_core::QuizPlanner::new(&store, &state.pipeline_config, &state.llm);
    let quiz = planner.plan(&user_id, &video_id).await.map_err(ApiError::Core)?;

    ledger
        .deduct(
            &user_id,
            CreditType::Notes,
            cost,
            CreditContext::new("quiz generation").with_video_id(video_id.clone()),
        )
        .await
        .map_err(ApiError::Core)?;

    Ok(Json(GenerateQuizResponse {
        quiz_id: quiz.id.to_string(),
        total_questions: quiz.questions.len(),
        questions: quiz.questions,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswer {
    pub question_id: String,
    pub selected_answer: u8,
}

#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub quiz_id: String,
    pub video_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub answers: Vec<SubmitAnswer>,
}

#[derive(Debug, Serialize)]
pub struct GradedAnswer {
    pub question_id: String,
    pub selected_answer: u8,
    pub correct_answer: u8,
    pub is_correct: bool,
    pub explanation: String,
}

#[derive(Debug, Serialize)]
pub struct QuizResult {
    pub quiz_id: String,
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub graded: Vec<GradedAnswer>,
}

/// `POST /api/quiz/submit`
///
/// Grades each submitted answer against the persisted question, records one
/// append-only `Attempt` per answer (§3's attempt_number invariant), and
/// returns the aggregate result. The `answers` payload identifies each
/// question by id; an answer referencing an id not found is skipped rather
/// than failing the whole submission, since the quiz itself is immutable.
pub async fn submit(
    State(state): State<AppState>,
    auth: Option<crate::auth::AuthUser>,
    Json(req): Json<SubmitQuizRequest>,
) -> ApiResult<Json<QuizResult>> {
    let user_id = resolve_user_id(auth, req.user_id.as_deref())?;
    let video_id = VideoId::from(req.video_id);
    let quiz_id = QuizId::from(req.quiz_id.clone());

    let store = state.store();
    let quiz = store
        .quizzes
        .get(&video_id, &quiz_id, &store.questions)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("quiz {quiz_id} not found")))?;

    let mut graded = Vec::with_capacity(req.answers.len());
    let mut correct = 0usize;

    for answer in &req.answers {
        let question_id = QuestionId::from(answer.question_id.clone());
        let Some(question) = quiz.questions.iter().find(|q| q.id == question_id) else {
            continue;
        };

        let is_correct = answer.selected_answer == question.correct_answer;
        if is_correct {
            correct += 1;
        }

        let attempt_number = store.attempts.count_prior(&user_id, &question_id).await? + 1;
        let attempt = Attempt::new(
            user_id.clone(),
            video_id.clone(),
            question_id.clone(),
            QuestionType::Quiz,
            answer.selected_answer,
            question.correct_answer,
            attempt_number,
            Some(quiz_id.clone()),
        );
        store.attempts.record(&attempt).await?;

        graded.push(GradedAnswer {
            question_id: question.id.to_string(),
            selected_answer: answer.selected_answer,
            correct_answer: question.correct_answer,
            is_correct,
            explanation: question.explanation.clone(),
        });
    }

    let total = graded.len();
    let accuracy = if total == 0 { 0.0 } else { correct as f64 / total as f64 };

    Ok(Json(QuizResult {
        quiz_id: quiz_id.to_string(),
        total,
        correct,
        accuracy,
        graded,
    }))
}
