//! Persistence for the per-question grading log.
//!
//! Attempts are rooted under the user, not the video: `users/{uid}/attempts`.
//! They are append-only and queried back by (video_id, question_id) to
//! derive `attempt_number` and by (video_id, quiz_id) for report aggregation.

use std::collections::HashMap;

use vlearn_models::{Attempt, QuestionId, QuestionType, QuizId, UserId, VideoId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, ToFirestoreValue, Value};

pub struct AttemptRepository {
    client: FirestoreClient,
}

impl AttemptRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    fn collection(&self, user_id: &UserId) -> String {
        format!("users/{}/attempts", user_id.as_str())
    }

    pub async fn record(&self, attempt: &Attempt) -> FirestoreResult<()> {
        let fields = attempt_to_fields(attempt);
        self.client
            .create_document(&self.collection(&attempt.user_id), &attempt.id, fields)
            .await?;
        Ok(())
    }

    /// Count prior attempts by this user on this question, used to compute
    /// the next `attempt_number` before recording a new one.
    pub async fn count_prior(&self, user_id: &UserId, question_id: &QuestionId) -> FirestoreResult<u32> {
        let all = self.list_for_user(user_id).await?;
        Ok(all.iter().filter(|a| &a.question_id == question_id).count() as u32)
    }

    pub async fn list_for_user(&self, user_id: &UserId) -> FirestoreResult<Vec<Attempt>> {
        let mut out = Vec::new();
        let mut page_token = None;
        loop {
            let resp = self
                .client
                .list_documents(&self.collection(user_id), Some(300), page_token.as_deref())
                .await?;
            for doc in resp.documents.unwrap_or_default() {
                out.push(document_to_attempt(&doc, user_id)?);
            }
            page_token = resp.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
        Ok(out)
    }

    /// All attempts a user made for a given video, optionally scoped to one
    /// quiz session (used when assembling a report for that quiz).
    pub async fn list_for_video(
        &self,
        user_id: &UserId,
        video_id: &VideoId,
        quiz_id: Option<&QuizId>,
    ) -> FirestoreResult<Vec<Attempt>> {
        let all = self.list_for_user(user_id).await?;
        Ok(all
            .into_iter()
            .filter(|a| &a.video_id == video_id)
            .filter(|a| quiz_id.map_or(true, |q| a.quiz_id.as_ref() == Some(q)))
            .collect())
    }
}

fn attempt_to_fields(attempt: &Attempt) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("video_id".to_string(), attempt.video_id.to_string().to_firestore_value());
    fields.insert("question_id".to_string(), attempt.question_id.to_string().to_firestore_value());
    fields.insert(
        "question_type".to_string(),
        match attempt.question_type {
            QuestionType::Flashcard => "flashcard",
            QuestionType::Quiz => "quiz",
        }
        .to_firestore_value(),
    );
    fields.insert("selected_answer".to_string(), (attempt.selected_answer as u32).to_firestore_value());
    fields.insert("correct_answer".to_string(), (attempt.correct_answer as u32).to_firestore_value());
    fields.insert("is_correct".to_string(), attempt.is_correct.to_firestore_value());
    fields.insert("attempt_number".to_string(), attempt.attempt_number.to_firestore_value());
    fields.insert("timestamp".to_string(), attempt.timestamp.to_firestore_value());
    if let Some(quiz_id) = &attempt.quiz_id {
        fields.insert("quiz_id".to_string(), quiz_id.to_string().to_firestore_value());
    }
    fields.insert("created_at".to_string(), attempt.created_at.to_firestore_value());
    fields
}

fn document_to_attempt(doc: &Document, user_id: &UserId) -> FirestoreResult<Attempt> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::InvalidResponse("attempt document has no fields".to_string()))?;
    let get_string = |key: &str| fields.get(key).and_then(String::from_firestore_value).unwrap_or_default();

    let id = doc
        .name
        .as_ref()
        .and_then(|n| n.rsplit('/').next())
        .map(str::to_string)
        .ok_or_else(|| FirestoreError::InvalidResponse("attempt document has no name".to_string()))?;

    let question_type = match get_string("question_type").as_str() {
        "quiz" => QuestionType::Quiz,
        _ => QuestionType::Flashcard,
    };

    Ok(Attempt {
        id,
        user_id: user_id.clone(),
        video_id: get_string("video_id").into(),
        question_id: get_string("question_id").into(),
        question_type,
        selected_answer: fields.get("selected_answer").and_then(u32::from_firestore_value).unwrap_or(0) as u8,
        correct_answer: fields.get("correct_answer").and_then(u32::from_firestore_value).unwrap_or(0) as u8,
        is_correct: fields.get("is_correct").and_then(bool::from_firestore_value).unwrap_or(false),
        attempt_number: fields.get("attempt_number").and_then(u32::from_firestore_value).unwrap_or(1),
        timestamp: fields
            .get("timestamp")
            .and_then(chrono::DateTime::from_firestore_value)
            .unwrap_or_else(chrono::Utc::now),
        quiz_id: fields.get("quiz_id").and_then(String::from_firestore_value).map(Into::into),
        created_at: fields
            .get("created_at")
            .and_then(chrono::DateTime::from_firestore_value)
            .unwrap_or_else(chrono::Utc::now),
    })
}
