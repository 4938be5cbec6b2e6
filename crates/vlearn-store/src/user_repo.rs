//! Persistence for user profiles and the credit-history audit log.
//!
//! Balance mutation (`UserRepository`) and audit append
//! (`CreditHistoryRepository`) are kept as separate repositories: the
//! balance lives on the user document, the history rows are an independent
//! append-only subcollection, and the two are never written through a
//! single call so the caller controls ordering (balance write, then history
//! append) under the ledger's read-verify-write contract.

use std::collections::HashMap;

use vlearn_models::{CreditHistoryEntry, CreditOperation, CreditType, User, UserId, UserRole};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, ToFirestoreValue, Value};

pub struct UserRepository {
    client: FirestoreClient,
}

impl UserRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    fn collection(&self) -> &'static str {
        "users"
    }

    pub async fn get(&self, user_id: &UserId) -> FirestoreResult<Option<User>> {
        let doc = self.client.get_document(self.collection(), user_id.as_str()).await?;
        doc.as_ref().map(|d| document_to_user(d, user_id)).transpose()
    }

    pub async fn create(&self, user: &User) -> FirestoreResult<()> {
        let fields = user_to_fields(user);
        self.client.create_document(self.collection(), user.id.as_str(), fields).await?;
        Ok(())
    }

    /// Write both balances unconditionally. Used by `add` (never contended
    /// against a read-verify-write race the way `deduct` is, since adding
    /// credits can never drive a balance negative).
    pub async fn set_balances(
        &self,
        user_id: &UserId,
        transcription_credits: u32,
        notes_credits: u32,
    ) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("transcription_credits".to_string(), transcription_credits.to_firestore_value());
        fields.insert("notes_credits".to_string(), notes_credits.to_firestore_value());
        self.client
            .update_document(self.collection(), user_id.as_str(), fields, None)
            .await?;
        Ok(())
    }

    /// Fetch a user alongside its `updateTime`, for callers that need to
    /// gate a follow-up write on the document not having changed since.
    pub async fn get_with_version(&self, user_id: &UserId) -> FirestoreResult<Option<(User, Option<String>)>> {
        let doc = self.client.get_document(self.collection(), user_id.as_str()).await?;
        match doc {
            Some(d) => {
                let update_time = d.update_time.clone();
                let user = document_to_user(&d, user_id)?;
                Ok(Some((user, update_time)))
            }
            None => Ok(None),
        }
    }

    /// Write both balances, failing with [`FirestoreError::PreconditionFailed`]
    /// if the document has been modified since `expected_update_time` was
    /// read. This is what lets `deduct` retry on contention instead of
    /// silently clobbering a concurrent writer's balance.
    pub async fn set_balances_with_precondition(
        &self,
        user_id: &UserId,
        transcription_credits: u32,
        notes_credits: u32,
        expected_update_time: Option<&str>,
    ) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("transcription_credits".to_string(), transcription_credits.to_firestore_value());
        fields.insert("notes_credits".to_string(), notes_credits.to_firestore_value());
        self.client
            .update_document_with_precondition(
                self.collection(),
                user_id.as_str(),
                fields,
                Some(vec!["transcription_credits".to_string(), "notes_credits".to_string()]),
                expected_update_time,
            )
            .await?;
        Ok(())
    }
}

pub struct CreditHistoryRepository {
    client: FirestoreClient,
}

impl CreditHistoryRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    fn collection(&self, user_id: &UserId) -> String {
        format!("users/{}/credit_history", user_id.as_str())
    }

    pub async fn append(&self, entry: &CreditHistoryEntry) -> FirestoreResult<()> {
        let fields = entry_to_fields(entry);
        self.client
            .create_document(&self.collection(&entry.user_id), &entry.id, fields)
            .await?;
        Ok(())
    }

    /// Paginated read, newest first, backing `GET
    /// /api/users/{id}/credits/history`.
    pub async fn list(
        &self,
        user_id: &UserId,
        page_size: u32,
        page_token: Option<&str>,
    ) -> FirestoreResult<(Vec<CreditHistoryEntry>, Option<String>)> {
        let resp = self
            .client
            .list_documents(&self.collection(user_id), Some(page_size), page_token)
            .await?;
        let mut entries = resp
            .documents
            .unwrap_or_default()
            .iter()
            .map(|d| document_to_entry(d, user_id))
            .collect::<FirestoreResult<Vec<_>>>()?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok((entries, resp.next_page_token))
    }
}

fn user_to_fields(user: &User) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert(
        "role".to_string(),
        match user.role {
            UserRole::Developer => "developer",
            UserRole::Standard => "standard",
        }
        .to_firestore_value(),
    );
    fields.insert("transcription_credits".to_string(), user.transcription_credits.to_firestore_value());
    fields.insert("notes_credits".to_string(), user.notes_credits.to_firestore_value());
    if let Some(name) = &user.display_name {
        fields.insert("display_name".to_string(), name.to_firestore_value());
    }
    if let Some(email) = &user.email {
        fields.insert("email".to_string(), email.to_firestore_value());
    }
    fields
}

fn document_to_user(doc: &Document, user_id: &UserId) -> FirestoreResult<User> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::InvalidResponse("user document has no fields".to_string()))?;
    let get_string = |key: &str| fields.get(key).and_then(String::from_firestore_value);

    let role = match get_string("role").as_deref() {
        Some("developer") => UserRole::Developer,
        _ => UserRole::Standard,
    };

    Ok(User {
        id: user_id.clone(),
        role,
        transcription_credits: fields
            .get("transcription_credits")
            .and_then(u32::from_firestore_value)
            .unwrap_or(0),
        notes_credits: fields.get("notes_credits").and_then(u32::from_firestore_value).unwrap_or(0),
        display_name: get_string("display_name"),
        email: get_string("email"),
    })
}

fn entry_to_fields(entry: &CreditHistoryEntry) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    if let Some(video_id) = &entry.video_id {
        fields.insert("video_id".to_string(), video_id.to_string().to_firestore_value());
    }
    if let Some(project_id) = &entry.project_id {
        fields.insert("project_id".to_string(), project_id.to_string().to_firestore_value());
    }
    fields.insert("credit_type".to_string(), entry.credit_type.as_str().to_firestore_value());
    fields.insert("amount".to_string(), entry.amount.to_firestore_value());
    fields.insert(
        "operation".to_string(),
        match entry.operation {
            CreditOperation::Add => "add",
            CreditOperation::Deduct => "deduct",
        }
        .to_firestore_value(),
    );
    fields.insert("balance_before".to_string(), entry.balance_before.to_firestore_value());
    fields.insert("balance_after".to_string(), entry.balance_after.to_firestore_value());
    fields.insert("description".to_string(), entry.description.to_firestore_value());
    fields.insert("created_at".to_string(), entry.created_at.to_firestore_value());
    if let Some(metadata) = &entry.metadata {
        for (k, v) in metadata {
            fields.insert(format!("metadata.{k}"), v.to_firestore_value());
        }
    }
    fields
}

fn document_to_entry(doc: &Document, user_id: &UserId) -> FirestoreResult<CreditHistoryEntry> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::InvalidResponse("credit_history document has no fields".to_string()))?;
    let get_string = |key: &str| fields.get(key).and_then(String::from_firestore_value).unwrap_or_default();

    let id = doc
        .name
        .as_ref()
        .and_then(|n| n.rsplit('/').next())
        .map(str::to_string)
        .ok_or_else(|| FirestoreError::InvalidResponse("credit_history document has no name".to_string()))?;

    let credit_type = match get_string("credit_type").as_str() {
        "notes" => CreditType::Notes,
        _ => CreditType::Transcription,
    };
    let operation = match get_string("operation").as_str() {
        "add" => CreditOperation::Add,
        _ => CreditOperation::Deduct,
    };

    Ok(CreditHistoryEntry {
        id,
        user_id: user_id.clone(),
        video_id: fields.get("video_id").and_then(String::from_firestore_value).map(Into::into),
        project_id: fields.get("project_id").and_then(String::from_firestore_value).map(Into::into),
        credit_type,
        amount: fields.get("amount").and_then(u32::from_firestore_value).unwrap_or(0),
        operation,
        balance_before: fields.get("balance_before").and_then(u32::from_firestore_value).unwrap_or(0),
        balance_after: fields.get("balance_after").and_then(u32::from_firestore_value).unwrap_or(0),
        description: get_string("description"),
        metadata: None,
        created_at: fields
            .get("created_at")
            .and_then(chrono::DateTime::from_firestore_value)
            .unwrap_or_else(chrono::Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_fields() {
        let user = User::new(UserId::from("u1"), UserRole::Developer, 10, 20);
        let fields = user_to_fields(&user);
        assert_eq!(fields.get("role").and_then(String::from_firestore_value), Some("developer".to_string()));
    }
}
