//! Credit ledger types: balances live on `User`; every balance-modifying
//! operation appends an immutable `CreditHistoryEntry`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{ProjectId, UserId, VideoId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CreditType {
    Transcription,
    Notes,
}

impl CreditType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcription => "transcription",
            Self::Notes => "notes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CreditOperation {
    Add,
    Deduct,
}

/// Append-only audit row. Never updated or deleted; the row itself is the
/// idempotency anchor for a credit-consuming operation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreditHistoryEntry {
    pub id: String,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<VideoId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    pub credit_type: CreditType,
    pub amount: u32,
    pub operation: CreditOperation,
    pub balance_before: u32,
    pub balance_after: u32,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
    pub created_at: DateTime<Utc>,
}

impl CreditHistoryEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: UserId,
        credit_type: CreditType,
        amount: u32,
        operation: CreditOperation,
        balance_before: u32,
        balance_after: u32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            video_id: None,
            project_id: None,
            credit_type,
            amount,
            operation,
            balance_before,
            balance_after,
            description: description.into(),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_video_id(mut self, video_id: VideoId) -> Self {
        self.video_id = Some(video_id);
        self
    }

    pub fn with_project_id(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Carries the context a credit-consuming operation needs to describe
/// itself, independent of the balance arithmetic.
#[derive(Debug, Clone)]
pub struct CreditContext {
    pub description: String,
    pub video_id: Option<VideoId>,
    pub project_id: Option<ProjectId>,
    pub metadata: Option<HashMap<String, String>>,
}

impl CreditContext {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            video_id: None,
            project_id: None,
            metadata: None,
        }
    }

    pub fn with_video_id(mut self, video_id: VideoId) -> Self {
        self.video_id = Some(video_id);
        self
    }

    pub fn with_project_id(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_entry_captures_before_after() {
        let entry = CreditHistoryEntry::new(
            UserId::from("u1"),
            CreditType::Transcription,
            5,
            CreditOperation::Deduct,
            100,
            95,
            "transcribed a 300s video",
        );
        assert_eq!(entry.balance_before - entry.balance_after, entry.amount);
    }
}
