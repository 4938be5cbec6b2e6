//! Persistence for projects and the project↔video junction.
//!
//! The junction is authoritative: a legacy scalar `video.project_id` field
//! (if ever seen on read from an older writer) is ignored, per the
//! project's adopted resolution of the source's two conflicting models.

use std::collections::HashMap;

use vlearn_models::{Project, ProjectId, ProjectVideoLink, VideoId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, ToFirestoreValue, Value};

pub struct ProjectRepository {
    client: FirestoreClient,
}

impl ProjectRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    fn collection(&self) -> &'static str {
        "projects"
    }

    pub async fn get(&self, project_id: &ProjectId) -> FirestoreResult<Option<Project>> {
        let doc = self.client.get_document(self.collection(), project_id.as_str()).await?;
        doc.as_ref().map(|d| document_to_project(d, project_id)).transpose()
    }

    pub async fn create(&self, project: &Project) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("owner_id".to_string(), project.owner_id.to_string().to_firestore_value());
        fields.insert("name".to_string(), project.name.to_firestore_value());
        fields.insert("created_at".to_string(), project.created_at.to_firestore_value());
        self.client.create_document(self.collection(), project.id.as_str(), fields).await?;
        Ok(())
    }
}

fn document_to_project(doc: &Document, project_id: &ProjectId) -> FirestoreResult<Project> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::InvalidResponse("project document has no fields".to_string()))?;
    Ok(Project {
        id: project_id.clone(),
        owner_id: fields.get("owner_id").and_then(String::from_firestore_value).unwrap_or_default().into(),
        name: fields.get("name").and_then(String::from_firestore_value).unwrap_or_default(),
        created_at: fields
            .get("created_at")
            .and_then(chrono::DateTime::from_firestore_value)
            .unwrap_or_else(chrono::Utc::now),
    })
}

/// The many-to-many junction. Rows are stored twice-indexed (once under the
/// project, once under the video) so both "videos in this project" and
/// "projects this video belongs to" are single-collection list reads rather
/// than a cross-collection scan.
pub struct ProjectVideoLinkRepository {
    client: FirestoreClient,
}

impl ProjectVideoLinkRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    fn by_project(&self, project_id: &ProjectId) -> String {
        format!("projects/{}/videos", project_id.as_str())
    }

    fn by_video(&self, video_id: &VideoId) -> String {
        format!("videos/{}/projects", video_id.as_str())
    }

    pub async fn link(&self, link: &ProjectVideoLink) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("created_at".to_string(), link.created_at.to_firestore_value());

        self.client
            .create_document(&self.by_project(&link.project_id), link.video_id.as_str(), fields.clone())
            .await
            .or_else(ignore_already_exists)?;
        self.client
            .create_document(&self.by_video(&link.video_id), link.project_id.as_str(), fields)
            .await
            .or_else(ignore_already_exists)?;
        Ok(())
    }

    pub async fn unlink(&self, project_id: &ProjectId, video_id: &VideoId) -> FirestoreResult<()> {
        self.client
            .delete_document(&self.by_project(project_id), video_id.as_str())
            .await?;
        self.client
            .delete_document(&self.by_video(video_id), project_id.as_str())
            .await?;
        Ok(())
    }

    /// True if any project still references this video. Drives the
    /// orchestrator's "unlink vs. cascade delete" decision.
    pub async fn has_any_links(&self, video_id: &VideoId) -> FirestoreResult<bool> {
        let resp = self.client.list_documents(&self.by_video(video_id), Some(1), None).await?;
        Ok(resp.documents.unwrap_or_default().iter().next().is_some())
    }

    pub async fn list_project_ids_for_video(&self, video_id: &VideoId) -> FirestoreResult<Vec<ProjectId>> {
        let resp = self.client.list_documents(&self.by_video(video_id), Some(200), None).await?;
        Ok(resp
            .documents
            .unwrap_or_default()
            .iter()
            .filter_map(|d| d.name.as_ref()?.rsplit('/').next().map(ProjectId::from_string))
            .collect())
    }

    pub async fn list_video_ids_for_project(&self, project_id: &ProjectId) -> FirestoreResult<Vec<VideoId>> {
        let resp = self.client.list_documents(&self.by_project(project_id), Some(200), None).await?;
        Ok(resp
            .documents
            .unwrap_or_default()
            .iter()
            .filter_map(|d| d.name.as_ref()?.rsplit('/').next().map(VideoId::from_string))
            .collect())
    }
}

fn ignore_already_exists(err: FirestoreError) -> FirestoreResult<Document> {
    match err {
        FirestoreError::AlreadyExists(_) => Ok(Document::new(HashMap::new())),
        other => Err(other),
    }
}
