//! Project↔Video many-to-many linkage.
//!
//! A video exists independently of any project. A project shares videos;
//! the junction row owns the link, not either side.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{ProjectId, UserId, VideoId};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Project {
    pub id: ProjectId,
    pub owner_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProjectVideoLink {
    pub project_id: ProjectId,
    pub video_id: VideoId,
    pub created_at: DateTime<Utc>,
}

impl ProjectVideoLink {
    pub fn new(project_id: ProjectId, video_id: VideoId) -> Self {
        Self {
            project_id,
            video_id,
            created_at: Utc::now(),
        }
    }
}
