//! Persistence for `videos` documents.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use vlearn_models::{ProcessingStatus, Transcript, Video, VideoId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{FromFirestoreValue, ToFirestoreValue, Value};

/// Repository for video documents, rooted at the top-level `videos`
/// collection (a video is not owned by a user — a user reaches it only
/// through a project↔video link or by id).
pub struct VideoRepository {
    client: FirestoreClient,
}

impl VideoRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    fn collection(&self) -> &'static str {
        "videos"
    }

    pub async fn get(&self, video_id: &VideoId) -> FirestoreResult<Option<Video>> {
        let doc = self.client.get_document(self.collection(), video_id.as_str()).await?;
        doc.as_ref().map(|d| document_to_video(d, video_id)).transpose()
    }

    pub async fn create(&self, video: &Video) -> FirestoreResult<()> {
        let fields = video_to_fields(video);
        self.client
            .create_document(self.collection(), video.id.as_str(), fields)
            .await?;
        info!(video_id = %video.id, "Created video record");
        Ok(())
    }

    pub async fn update_status(&self, video_id: &VideoId, status: ProcessingStatus) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("processing_status".to_string(), status.as_str().to_firestore_value());
        self.client
            .update_document(
                self.collection(),
                video_id.as_str(),
                fields,
                Some(vec!["processing_status".to_string()]),
            )
            .await?;
        Ok(())
    }

    /// Update the running batch counters while in a batch phase.
    pub async fn update_batch_progress(
        &self,
        video_id: &VideoId,
        status: ProcessingStatus,
        batch_current: u32,
        batch_total: u32,
    ) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("processing_status".to_string(), status.as_str().to_firestore_value());
        fields.insert("batch_current".to_string(), batch_current.to_firestore_value());
        fields.insert("batch_total".to_string(), batch_total.to_firestore_value());
        self.client
            .update_document(
                self.collection(),
                video_id.as_str(),
                fields,
                Some(vec![
                    "processing_status".to_string(),
                    "batch_current".to_string(),
                    "batch_total".to_string(),
                ]),
            )
            .await?;
        Ok(())
    }

    /// Finalize the transcript, mark completed, and reset batch counters.
    pub async fn complete(&self, video_id: &VideoId, transcript: &Transcript) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("processing_status".to_string(), ProcessingStatus::Completed.as_str().to_firestore_value());
        fields.insert("transcript".to_string(), transcript_to_value(transcript));
        fields.insert("batch_current".to_string(), 0u32.to_firestore_value());
        fields.insert("batch_total".to_string(), 0u32.to_firestore_value());
        self.client
            .update_document(
                self.collection(),
                video_id.as_str(),
                fields,
                Some(vec![
                    "processing_status".to_string(),
                    "transcript".to_string(),
                    "batch_current".to_string(),
                    "batch_total".to_string(),
                ]),
            )
            .await?;
        info!(video_id = %video_id, "Video transcript finalized");
        Ok(())
    }

    pub async fn fail(&self, video_id: &VideoId, error: &str) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("processing_status".to_string(), ProcessingStatus::Failed.as_str().to_firestore_value());
        fields.insert("error_message".to_string(), error.to_firestore_value());
        self.client
            .update_document(
                self.collection(),
                video_id.as_str(),
                fields,
                Some(vec!["processing_status".to_string(), "error_message".to_string()]),
            )
            .await?;
        Ok(())
    }

    pub async fn delete(&self, video_id: &VideoId) -> FirestoreResult<()> {
        self.client.delete_document(self.collection(), video_id.as_str()).await
    }
}

fn video_to_fields(video: &Video) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("title".to_string(), video.title.to_firestore_value());
    fields.insert("duration".to_string(), video.duration.to_firestore_value());
    fields.insert("source_url".to_string(), video.source_url.to_firestore_value());
    fields.insert("processing_status".to_string(), video.processing_status.as_str().to_firestore_value());
    if let Some(err) = &video.error_message {
        fields.insert("error_message".to_string(), err.to_firestore_value());
    }
    fields.insert("batch_current".to_string(), video.batch_current.to_firestore_value());
    fields.insert("batch_total".to_string(), video.batch_total.to_firestore_value());
    fields.insert("created_at".to_string(), video.created_at.to_firestore_value());
    if let Some(transcript) = &video.transcript {
        fields.insert("transcript".to_string(), transcript_to_value(transcript));
    }
    fields
}

fn transcript_to_value(transcript: &Transcript) -> Value {
    serde_json::to_value(transcript)
        .ok()
        .map(json_to_firestore_value)
        .unwrap_or(Value::NullValue(()))
}

/// Firestore's document model has no native "arbitrary JSON blob" value, so
/// a nested structure like a transcript is mapped to nested Map/Array
/// values directly from its `serde_json::Value` form.
fn json_to_firestore_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::NullValue(()),
        serde_json::Value::Bool(b) => Value::BooleanValue(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::IntegerValue(i.to_string())
            } else {
                Value::DoubleValue(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Value::StringValue(s),
        serde_json::Value::Array(arr) => Value::ArrayValue(crate::types::ArrayValue {
            values: Some(arr.into_iter().map(json_to_firestore_value).collect()),
        }),
        serde_json::Value::Object(map) => Value::MapValue(crate::types::MapValue {
            fields: Some(
                map.into_iter()
                    .map(|(k, v)| (k, json_to_firestore_value(v)))
                    .collect(),
            ),
        }),
    }
}

fn firestore_value_to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::NullValue(()) => serde_json::Value::Null,
        Value::BooleanValue(b) => serde_json::Value::Bool(*b),
        Value::IntegerValue(s) => s
            .parse::<i64>()
            .map(serde_json::Value::from)
            .unwrap_or(serde_json::Value::Null),
        Value::DoubleValue(d) => serde_json::Value::from(*d),
        Value::StringValue(s) => serde_json::Value::String(s.clone()),
        Value::TimestampValue(t) => serde_json::Value::String(t.clone()),
        Value::ArrayValue(a) => serde_json::Value::Array(
            a.values.clone().unwrap_or_default().iter().map(firestore_value_to_json).collect(),
        ),
        Value::MapValue(m) => serde_json::Value::Object(
            m.fields
                .clone()
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, firestore_value_to_json(&v)))
                .collect(),
        ),
        _ => serde_json::Value::Null,
    }
}

fn document_to_video(doc: &crate::types::Document, video_id: &VideoId) -> FirestoreResult<Video> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::InvalidResponse("document has no fields".to_string()))?;

    let get_string = |key: &str| -> String {
        fields.get(key).and_then(String::from_firestore_value).unwrap_or_default()
    };

    let transcript = fields
        .get("transcript")
        .filter(|v| !matches!(v, Value::NullValue(())))
        .map(firestore_value_to_json)
        .and_then(|json| serde_json::from_value::<Transcript>(json).ok());

    let processing_status = match get_string("processing_status").as_str() {
        "transcribing" => ProcessingStatus::Transcribing,
        "transcribing_batch" => ProcessingStatus::TranscribingBatch,
        "generating_flashcards" => ProcessingStatus::GeneratingFlashcards,
        "generating_flashcards_batch" => ProcessingStatus::GeneratingFlashcardsBatch,
        "completed" => ProcessingStatus::Completed,
        "failed" => ProcessingStatus::Failed,
        _ => ProcessingStatus::Processing,
    };

    Ok(Video {
        id: video_id.clone(),
        title: get_string("title"),
        duration: fields.get("duration").and_then(f64::from_firestore_value).unwrap_or(0.0),
        source_url: get_string("source_url"),
        transcript,
        processing_status,
        error_message: fields.get("error_message").and_then(String::from_firestore_value),
        batch_current: fields.get("batch_current").and_then(u32::from_firestore_value).unwrap_or(0),
        batch_total: fields.get("batch_total").and_then(u32::from_firestore_value).unwrap_or(0),
        created_at: fields
            .get("created_at")
            .and_then(chrono::DateTime::from_firestore_value)
            .unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vlearn_models::TranscriptSegment;

    #[test]
    fn json_roundtrip_preserves_transcript_shape() {
        let transcript = Transcript::new(vec![TranscriptSegment::new(0.0, 120.0, "hello")], 120.0);
        let value = transcript_to_value(&transcript);
        let json = firestore_value_to_json(&value);
        let back: Transcript = serde_json::from_value(json).unwrap();
        assert_eq!(back.full_text, transcript.full_text);
        assert_eq!(back.segments.len(), 1);
    }
}
