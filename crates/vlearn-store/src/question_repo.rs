//! Persistence for generated questions and assembled quizzes.
//!
//! Questions and quizzes are stored as subcollections of their video, since
//! they never outlive it and are always fetched in that scope.

use std::collections::HashMap;

use vlearn_models::{Difficulty, Question, Quiz, QuestionId, QuizId, TranscriptSegment, VideoId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, ToFirestoreValue, Value};

pub struct QuestionRepository {
    client: FirestoreClient,
}

impl QuestionRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    fn collection(&self, video_id: &VideoId) -> String {
        format!("videos/{}/questions", video_id.as_str())
    }

    pub async fn create(&self, question: &Question) -> FirestoreResult<()> {
        let fields = question_to_fields(question);
        self.client
            .create_document(&self.collection(&question.video_id), question.id.as_str(), fields)
            .await?;
        Ok(())
    }

    pub async fn create_many(&self, questions: &[Question]) -> FirestoreResult<()> {
        for question in questions {
            self.create(question).await?;
        }
        Ok(())
    }

    pub async fn get(&self, video_id: &VideoId, question_id: &QuestionId) -> FirestoreResult<Option<Question>> {
        let doc = self
            .client
            .get_document(&self.collection(video_id), question_id.as_str())
            .await?;
        doc.as_ref()
            .map(|d| document_to_question(d, video_id, question_id))
            .transpose()
    }

    /// All flashcard-eligible questions for a video, in segment order. Used
    /// to reconstruct the inline-flashcard stream during playback.
    pub async fn list_flashcards(&self, video_id: &VideoId) -> FirestoreResult<Vec<Question>> {
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let resp = self
                .client
                .list_documents(&self.collection(video_id), Some(200), page_token.as_deref())
                .await?;
            for doc in resp.documents.unwrap_or_default() {
                let id = QuestionId::from_string(doc_id(&doc)?);
                let question = document_to_question(&doc, video_id, &id)?;
                if question.show_at_timestamp.is_some() {
                    out.push(question);
                }
            }
            page_token = resp.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
        out.sort_by(|a, b| a.show_at_timestamp.partial_cmp(&b.show_at_timestamp).unwrap());
        Ok(out)
    }
}

pub struct QuizRepository {
    client: FirestoreClient,
}

impl QuizRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    fn collection(&self, video_id: &VideoId) -> String {
        format!("videos/{}/quizzes", video_id.as_str())
    }

    pub async fn create(&self, quiz: &Quiz) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        let question_ids: Vec<String> = quiz.questions.iter().map(|q| q.id.to_string()).collect();
        fields.insert("question_ids".to_string(), question_ids.to_firestore_value());
        self.client
            .create_document(&self.collection(&quiz.video_id), quiz.id.as_str(), fields)
            .await?;
        Ok(())
    }

    /// Reassemble a quiz from its stored question-id ordering plus the
    /// questions subcollection, which holds the full question bodies.
    pub async fn get(
        &self,
        video_id: &VideoId,
        quiz_id: &QuizId,
        questions: &QuestionRepository,
    ) -> FirestoreResult<Option<Quiz>> {
        let doc = self.client.get_document(&self.collection(video_id), quiz_id.as_str()).await?;
        let Some(doc) = doc else { return Ok(None) };
        let fields = doc
            .fields
            .as_ref()
            .ok_or_else(|| FirestoreError::InvalidResponse("quiz document has no fields".to_string()))?;
        let ids: Vec<String> = fields
            .get("question_ids")
            .and_then(array_of_strings)
            .unwrap_or_default();

        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            let qid = QuestionId::from_string(id);
            if let Some(q) = questions.get(video_id, &qid).await? {
                resolved.push(q);
            }
        }
        Ok(Some(Quiz::new(quiz_id.clone(), video_id.clone(), resolved)))
    }
}

fn array_of_strings(v: &Value) -> Option<Vec<String>> {
    match v {
        Value::ArrayValue(a) => Some(
            a.values
                .clone()
                .unwrap_or_default()
                .iter()
                .filter_map(String::from_firestore_value)
                .collect(),
        ),
        _ => None,
    }
}

fn doc_id(doc: &Document) -> FirestoreResult<String> {
    doc.name
        .as_ref()
        .and_then(|n| n.rsplit('/').next())
        .map(str::to_string)
        .ok_or_else(|| FirestoreError::InvalidResponse("document has no name".to_string()))
}

fn question_to_fields(question: &Question) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("question_text".to_string(), question.question_text.to_firestore_value());
    fields.insert(
        "options".to_string(),
        question.options.to_vec().to_firestore_value(),
    );
    fields.insert("correct_answer".to_string(), (question.correct_answer as u32).to_firestore_value());
    fields.insert("explanation".to_string(), question.explanation.to_firestore_value());
    fields.insert("difficulty".to_string(), question.difficulty.as_str().to_firestore_value());
    fields.insert("segment_start".to_string(), question.source_segment.start_time.to_firestore_value());
    fields.insert("segment_end".to_string(), question.source_segment.end_time.to_firestore_value());
    fields.insert("segment_text".to_string(), question.source_segment.text.to_firestore_value());
    fields.insert("show_at_timestamp".to_string(), question.show_at_timestamp.to_firestore_value());
    fields
}

fn document_to_question(doc: &Document, video_id: &VideoId, question_id: &QuestionId) -> FirestoreResult<Question> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::InvalidResponse("question document has no fields".to_string()))?;

    let get_string = |key: &str| fields.get(key).and_then(String::from_firestore_value).unwrap_or_default();
    let options_vec = fields.get("options").and_then(array_of_strings).unwrap_or_default();
    let options: [String; 4] = options_vec
        .try_into()
        .map_err(|_| FirestoreError::InvalidResponse("question must have exactly 4 options".to_string()))?;

    let difficulty = match get_string("difficulty").as_str() {
        "easy" => Difficulty::Easy,
        "hard" => Difficulty::Hard,
        _ => Difficulty::Medium,
    };

    Ok(Question {
        id: question_id.clone(),
        video_id: video_id.clone(),
        question_text: get_string("question_text"),
        options,
        correct_answer: fields.get("correct_answer").and_then(u32::from_firestore_value).unwrap_or(0) as u8,
        explanation: get_string("explanation"),
        difficulty,
        source_segment: TranscriptSegment::new(
            fields.get("segment_start").and_then(f64::from_firestore_value).unwrap_or(0.0),
            fields.get("segment_end").and_then(f64::from_firestore_value).unwrap_or(0.0),
            get_string("segment_text"),
        ),
        show_at_timestamp: fields.get("show_at_timestamp").and_then(f64::from_firestore_value),
    })
}
