//! Structured study notes with embedded diagrams.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{NotesId, VideoId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiagramType {
    Flow,
    Pie,
    State,
    Sequence,
    Class,
    Gantt,
    Mindmap,
    Git,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Diagram {
    pub diagram_type: DiagramType,
    /// Source in the target diagram DSL.
    pub source: String,
    pub title: String,
    pub purpose: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotesSection {
    pub heading: String,
    /// Markdown content.
    pub content: String,
    pub key_concepts: Vec<String>,
    pub diagrams: Vec<Diagram>,
}

/// Mutable only via an explicit replace-title-and-sections operation;
/// diagrams travel with their owning section.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Notes {
    pub id: NotesId,
    pub video_id: VideoId,
    pub title: String,
    pub sections: Vec<NotesSection>,
}

impl Notes {
    pub fn new(id: NotesId, video_id: VideoId, title: impl Into<String>, sections: Vec<NotesSection>) -> Self {
        Self {
            id,
            video_id,
            title: title.into(),
            sections,
        }
    }

    /// Replace title and sections wholesale, as the spec's update operation
    /// requires (diagrams travel with sections, so nothing else to carry).
    pub fn replace(&mut self, title: impl Into<String>, sections: Vec<NotesSection>) {
        self.title = title.into();
        self.sections = sections;
    }

    /// Count of distinct diagram types used across all sections, used to
    /// enforce the "at least two distinct diagram types" generation rule.
    pub fn distinct_diagram_types(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        for section in &self.sections {
            for diagram in &section.diagrams {
                seen.insert(diagram.diagram_type);
            }
        }
        seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_section(dtype: DiagramType) -> NotesSection {
        NotesSection {
            heading: "Intro".into(),
            content: "content".into(),
            key_concepts: vec!["concept".into()],
            diagrams: vec![Diagram {
                diagram_type: dtype,
                source: "graph TD; A-->B".into(),
                title: "Flow".into(),
                purpose: "illustrate".into(),
            }],
        }
    }

    #[test]
    fn replace_swaps_title_and_sections() {
        let mut notes = Notes::new(
            NotesId::new(),
            VideoId::from("v1"),
            "Old title",
            vec![sample_section(DiagramType::Flow)],
        );
        notes.replace("New title", vec![sample_section(DiagramType::Pie)]);
        assert_eq!(notes.title, "New title");
        assert_eq!(notes.sections.len(), 1);
    }

    #[test]
    fn distinct_diagram_types_counts_unique_kinds() {
        let notes = Notes::new(
            NotesId::new(),
            VideoId::from("v1"),
            "Title",
            vec![sample_section(DiagramType::Flow), sample_section(DiagramType::Flow), sample_section(DiagramType::Pie)],
        );
        assert_eq!(notes.distinct_diagram_types(), 2);
    }
}
