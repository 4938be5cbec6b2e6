//! Persistence for generated study notes.

use std::collections::HashMap;

use vlearn_models::{Notes, NotesId, VideoId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, ToFirestoreValue, Value};

pub struct NotesRepository {
    client: FirestoreClient,
}

impl NotesRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    fn collection(&self, video_id: &VideoId) -> String {
        format!("videos/{}/notes", video_id.as_str())
    }

    pub async fn create(&self, notes: &Notes) -> FirestoreResult<()> {
        let fields = notes_to_fields(notes)?;
        self.client
            .create_document(&self.collection(&notes.video_id), notes.id.as_str(), fields)
            .await?;
        Ok(())
    }

    pub async fn get(&self, video_id: &VideoId, notes_id: &NotesId) -> FirestoreResult<Option<Notes>> {
        let doc = self.client.get_document(&self.collection(video_id), notes_id.as_str()).await?;
        doc.as_ref().map(|d| document_to_notes(d, video_id, notes_id)).transpose()
    }

    /// Full replace (title + sections). Notes are regenerated wholesale, not
    /// patched field by field.
    pub async fn replace(&self, notes: &Notes) -> FirestoreResult<()> {
        let fields = notes_to_fields(notes)?;
        self.client
            .update_document(&self.collection(&notes.video_id), notes.id.as_str(), fields, None)
            .await?;
        Ok(())
    }
}

fn notes_to_fields(notes: &Notes) -> FirestoreResult<HashMap<String, Value>> {
    let mut fields = HashMap::new();
    fields.insert("title".to_string(), notes.title.to_firestore_value());
    let sections_json = serde_json::to_value(&notes.sections)
        .map_err(|e| FirestoreError::SerializationError(e.to_string()))?;
    fields.insert("sections".to_string(), json_to_value(sections_json));
    Ok(fields)
}

fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::NullValue(()),
        serde_json::Value::Bool(b) => Value::BooleanValue(b),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(|i| Value::IntegerValue(i.to_string()))
            .unwrap_or_else(|| Value::DoubleValue(n.as_f64().unwrap_or(0.0))),
        serde_json::Value::String(s) => Value::StringValue(s),
        serde_json::Value::Array(a) => Value::ArrayValue(crate::types::ArrayValue {
            values: Some(a.into_iter().map(json_to_value).collect()),
        }),
        serde_json::Value::Object(m) => Value::MapValue(crate::types::MapValue {
            fields: Some(m.into_iter().map(|(k, v)| (k, json_to_value(v))).collect()),
        }),
    }
}

fn value_to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::NullValue(()) => serde_json::Value::Null,
        Value::BooleanValue(b) => serde_json::Value::Bool(*b),
        Value::IntegerValue(s) => s.parse::<i64>().map(serde_json::Value::from).unwrap_or(serde_json::Value::Null),
        Value::DoubleValue(d) => serde_json::Value::from(*d),
        Value::StringValue(s) => serde_json::Value::String(s.clone()),
        Value::TimestampValue(t) => serde_json::Value::String(t.clone()),
        Value::ArrayValue(a) => serde_json::Value::Array(
            a.values.clone().unwrap_or_default().iter().map(value_to_json).collect(),
        ),
        Value::MapValue(m) => serde_json::Value::Object(
            m.fields.clone().unwrap_or_default().into_iter().map(|(k, v)| (k, value_to_json(&v))).collect(),
        ),
        _ => serde_json::Value::Null,
    }
}

fn document_to_notes(doc: &Document, video_id: &VideoId, notes_id: &NotesId) -> FirestoreResult<Notes> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::InvalidResponse("notes document has no fields".to_string()))?;
    let title = fields.get("title").and_then(String::from_firestore_value).unwrap_or_default();
    let sections = fields
        .get("sections")
        .map(value_to_json)
        .and_then(|j| serde_json::from_value(j).ok())
        .unwrap_or_default();
    Ok(Notes::new(notes_id.clone(), video_id.clone(), title, sections))
}
