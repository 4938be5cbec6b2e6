//! Structured study notes generator (§4.6).
//!
//! A single LLM call over roughly the first 10,000 characters of the
//! transcript, asked for 3-5 sections and 2-4 diagrams spanning at least
//! two distinct diagram types. `Notes::replace` is used for regeneration,
//! since notes are produced wholesale rather than patched incrementally.

use serde::Deserialize;
use tracing::warn;

use vlearn_models::{Diagram, DiagramType, Notes, NotesId, NotesSection, VideoId};
use vlearn_llm::LlmClient;

use crate::config::PipelineConfig;
use crate::error::{CoreError, CoreResult};
use crate::store::Store;

pub struct NotesGenerator<'a> {
    store: &'a Store,
    llm: &'a LlmClient,
    config: &'a PipelineConfig,
}

#[derive(Debug, Deserialize)]
struct GeneratedNotes {
    title: String,
    sections: Vec<GeneratedSection>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSection {
    heading: String,
    content: String,
    key_concepts: Vec<String>,
    #[serde(default)]
    diagrams: Vec<GeneratedDiagram>,
}

#[derive(Debug, Deserialize)]
struct GeneratedDiagram {
    diagram_type: DiagramType,
    source: String,
    title: String,
    purpose: String,
}

impl<'a> NotesGenerator<'a> {
    pub fn new(store: &'a Store, llm: &'a LlmClient, config: &'a PipelineConfig) -> Self {
        Self { store, llm, config }
    }

    pub async fn generate(&self, video_id: &VideoId, full_text: &str) -> CoreResult<Notes> {
        let excerpt: String = full_text.chars().take(self.config.notes_input_chars).collect();
        let prompt = build_prompt(&excerpt);
        let generated: GeneratedNotes = self.llm.generate_json(&prompt, 0.3).await?;

        let sections: Vec<NotesSection> = generated
            .sections
            .into_iter()
            .map(|s| NotesSection {
                heading: s.heading,
                content: s.content,
                key_concepts: s.key_concepts,
                diagrams: s
                    .diagrams
                    .into_iter()
                    .map(|d| Diagram { diagram_type: d.diagram_type, source: d.source, title: d.title, purpose: d.purpose })
                    .collect(),
            })
            .collect();

        if sections.is_empty() {
            return Err(CoreError::LlmSynthesisFailed("notes generation returned no sections".to_string()));
        }

        let notes = Notes::new(NotesId::new(), video_id.clone(), generated.title, sections);
        if notes.distinct_diagram_types() < 2 {
            warn!(video_id = %video_id, "generated notes have fewer than 2 distinct diagram types");
        }

        self.store.notes.create(&notes).await?;
        Ok(notes)
    }

    /// Regenerate notes wholesale for an existing document.
    pub async fn regenerate(&self, notes: &mut Notes, full_text: &str) -> CoreResult<()> {
        let excerpt: String = full_text.chars().take(self.config.notes_input_chars).collect();
        let prompt = build_prompt(&excerpt);
        let generated: GeneratedNotes = self.llm.generate_json(&prompt, 0.3).await?;

        let sections: Vec<NotesSection> = generated
            .sections
            .into_iter()
            .map(|s| NotesSection {
                heading: s.heading,
                content: s.content,
                key_concepts: s.key_concepts,
                diagrams: s
                    .diagrams
                    .into_iter()
                    .map(|d| Diagram { diagram_type: d.diagram_type, source: d.source, title: d.title, purpose: d.purpose })
                    .collect(),
            })
            .collect();

        notes.replace(generated.title, sections);
        self.store.notes.replace(notes).await?;
        Ok(())
    }
}

fn build_prompt(excerpt: &str) -> String {
    format!(
        "Produce structured study notes from this video transcript excerpt. Write 3 to 5 sections, \
         each with a heading, markdown content, a list of key concepts, and 0 or more diagrams. Across \
         all sections together, include between 2 and 4 diagrams total, and use at least 2 distinct \
         diagram types drawn from: flow, pie, state, sequence, class, gantt, mindmap, git. Each diagram's \
         \"source\" field must be valid Mermaid syntax for its type.\n\n\
         Transcript excerpt:\n{excerpt}\n\n\
         Return JSON with fields: title (string), sections (array of objects with heading, content, \
         key_concepts (array of strings), diagrams (array of objects with diagram_type, source, title, \
         purpose))."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_excerpt() {
        let prompt = build_prompt("the mitochondria is the powerhouse of the cell");
        assert!(prompt.contains("mitochondria"));
        assert!(prompt.contains("2 and 4 diagrams"));
    }
}
