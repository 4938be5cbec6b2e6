//! Persistence for generated learning reports.

use std::collections::HashMap;

use vlearn_models::{Report, ReportId, UserId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, ToFirestoreValue, Value};

pub struct ReportRepository {
    client: FirestoreClient,
}

impl ReportRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    fn collection(&self, user_id: &UserId) -> String {
        format!("users/{}/reports", user_id.as_str())
    }

    pub async fn create(&self, report: &Report) -> FirestoreResult<()> {
        let fields = report_to_fields(report)?;
        self.client
            .create_document(&self.collection(&report.user_id), report.id.as_str(), fields)
            .await?;
        Ok(())
    }

    pub async fn get(&self, user_id: &UserId, report_id: &ReportId) -> FirestoreResult<Option<Report>> {
        let doc = self.client.get_document(&self.collection(user_id), report_id.as_str()).await?;
        doc.as_ref().map(|d| document_to_report(d, user_id, report_id)).transpose()
    }
}

/// The nested analysis structures have no natural flat Firestore field
/// mapping, so they ride as JSON blobs the same way a transcript does.
fn report_to_fields(report: &Report) -> FirestoreResult<HashMap<String, Value>> {
    let mut fields = HashMap::new();
    fields.insert("video_id".to_string(), report.video_id.to_string().to_firestore_value());
    fields.insert("quiz_id".to_string(), report.quiz_id.to_string().to_firestore_value());
    fields.insert("video_type".to_string(), report.video_type.to_firestore_value());
    fields.insert("domain".to_string(), report.domain.to_firestore_value());
    fields.insert("main_topics".to_string(), report.main_topics.clone().to_firestore_value());
    fields.insert("key_takeaways".to_string(), report.key_takeaways.clone().to_firestore_value());
    fields.insert("created_at".to_string(), report.created_at.to_firestore_value());
    fields.insert("word_frequency".to_string(), json_blob(&report.word_frequency)?);
    fields.insert("performance_stats".to_string(), json_blob(&report.performance_stats)?);
    fields.insert("attempt_breakdown".to_string(), json_blob(&report.attempt_breakdown)?);
    fields.insert("weak_areas".to_string(), json_blob(&report.weak_areas)?);
    fields.insert("mastery_analysis".to_string(), json_blob(&report.mastery_analysis)?);
    fields.insert("learning_path".to_string(), json_blob(&report.learning_path)?);
    fields.insert("video_recommendations".to_string(), json_blob(&report.video_recommendations)?);
    Ok(fields)
}

fn json_blob<T: serde::Serialize>(value: &T) -> FirestoreResult<Value> {
    let json = serde_json::to_value(value).map_err(|e| FirestoreError::SerializationError(e.to_string()))?;
    Ok(json_to_value(json))
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

fn blob<T: serde::de::DeserializeOwned + Default>(fields: &HashMap<String, Value>, key: &str) -> T {
    fields
        .get(key)
        .map(value_to_json)
        .and_then(|j| serde_json::from_value(j).ok())
        .unwrap_or_default()
}

fn document_to_report(doc: &Document, user_id: &UserId, report_id: &ReportId) -> FirestoreResult<Report> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::InvalidResponse("report document has no fields".to_string()))?;
    let get_string = |key: &str| fields.get(key).and_then(String::from_firestore_value).unwrap_or_default();
    let get_strings = |key: &str| -> Vec<String> {
        match fields.get(key) {
            Some(Value::ArrayValue(a)) => a
                .values
                .clone()
                .unwrap_or_default()
                .iter()
                .filter_map(String::from_firestore_value)
                .collect(),
            _ => Vec::new(),
        }
    };

    Ok(Report {
        id: report_id.clone(),
        user_id: user_id.clone(),
        video_id: get_string("video_id").into(),
        quiz_id: get_string("quiz_id").into(),
        word_frequency: blob(fields, "word_frequency"),
        performance_stats: blob(fields, "performance_stats"),
        attempt_breakdown: blob(fields, "attempt_breakdown"),
        weak_areas: blob(fields, "weak_areas"),
        mastery_analysis: blob(fields, "mastery_analysis"),
        learning_path: blob(fields, "learning_path"),
        video_recommendations: blob(fields, "video_recommendations"),
        key_takeaways: get_strings("key_takeaways"),
        video_type: get_string("video_type"),
        domain: get_string("domain"),
        main_topics: get_strings("main_topics"),
        created_at: fields
            .get("created_at")
            .and_then(chrono::DateTime::from_firestore_value)
            .unwrap_or_else(chrono::Utc::now),
    })
}
