//! Environment-derived configuration for video intake limits.

#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Videos longer than this are rejected by `validate`.
    pub max_video_duration_secs: f64,
    /// Target segment length for the 120s re-chunking policy (§4.2/§4.3).
    pub segment_target_secs: f64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self { max_video_duration_secs: 7200.0, segment_target_secs: 120.0 }
    }
}

impl IntakeConfig {
    pub fn from_env() -> Self {
        let max_video_duration_secs = std::env::var("MAX_VIDEO_DURATION_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7200.0);
        let segment_target_secs =
            std::env::var("SEGMENT_TARGET_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(120.0);
        Self { max_video_duration_secs, segment_target_secs }
    }
}
