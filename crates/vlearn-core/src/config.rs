//! Pipeline-wide constants: windowing (§4.3), costing (§4.9), and quiz
//! sizing (§4.5), collected the way the donor collects its
//! `ApiConfig`/`WorkerConfig` environment-derived structs.

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Batch window size in seconds; videos at or under this use the
    /// single-pass path (§4.3).
    pub batch_threshold_secs: f64,
    /// Target flashcard question count, one per segment.
    pub final_quiz_questions: u32,
    /// Weak-question accuracy threshold (§4.5, GLOSSARY).
    pub weak_question_threshold: f64,
    /// Adaptive/review split for quiz planning (§4.5).
    pub adaptive_share: f64,
    /// Notes generation input window, in characters (§4.6).
    pub notes_input_chars: usize,
    /// Growth-area analysis transcript excerpt length, in characters (§4.7).
    pub growth_analysis_transcript_chars: usize,
    /// Flat cost of quiz generation in notes credits (§4.9).
    pub quiz_generation_cost: u32,
    /// Divisor for the notes credit cost formula (§4.9).
    pub notes_cost_chars_per_credit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_threshold_secs: 600.0,
            final_quiz_questions: 10,
            weak_question_threshold: 0.70,
            adaptive_share: 0.6,
            notes_input_chars: 10_000,
            growth_analysis_transcript_chars: 1_500,
            quiz_generation_cost: 5,
            notes_cost_chars_per_credit: 50_000,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            batch_threshold_secs: env_f64("BATCH_THRESHOLD_SECS", default.batch_threshold_secs),
            final_quiz_questions: env_u32("FINAL_QUIZ_QUESTIONS", default.final_quiz_questions),
            weak_question_threshold: env_f64("WEAK_QUESTION_THRESHOLD", default.weak_question_threshold),
            adaptive_share: env_f64("QUIZ_ADAPTIVE_SHARE", default.adaptive_share),
            notes_input_chars: env_usize("NOTES_INPUT_CHARS", default.notes_input_chars),
            growth_analysis_transcript_chars: env_usize(
                "GROWTH_ANALYSIS_TRANSCRIPT_CHARS",
                default.growth_analysis_transcript_chars,
            ),
            quiz_generation_cost: env_u32("QUIZ_GENERATION_COST", default.quiz_generation_cost),
            notes_cost_chars_per_credit: env_usize("NOTES_COST_CHARS_PER_CREDIT", default.notes_cost_chars_per_credit),
        }
    }

    /// Transcription cost: one credit per started minute (§4.9).
    pub fn transcription_cost(&self, duration_secs: f64) -> u32 {
        (duration_secs / 60.0).ceil().max(0.0) as u32
    }

    /// Notes generation cost, keyed off the full transcript length (§4.9).
    pub fn notes_cost(&self, full_text_len: usize) -> u32 {
        ((full_text_len as f64) / (self.notes_cost_chars_per_credit as f64)).ceil() as u32
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcription_cost_rounds_up_to_whole_minutes() {
        let config = PipelineConfig::default();
        assert_eq!(config.transcription_cost(300.0), 5);
        assert_eq!(config.transcription_cost(301.0), 6);
        assert_eq!(config.transcription_cost(1500.0), 25);
    }

    #[test]
    fn notes_cost_rounds_up_to_whole_chunks() {
        let config = PipelineConfig::default();
        assert_eq!(config.notes_cost(0), 0);
        assert_eq!(config.notes_cost(50_000), 1);
        assert_eq!(config.notes_cost(50_001), 2);
    }
}
