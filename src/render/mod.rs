// ABOUTME: Shared rendering input, renderer trait, and format selection
// ABOUTME: Holds the cross-format rules for notes, speakers, and attendees

pub mod docx;
pub mod markdown;
pub mod text;

use crate::config::ExportFormat;
use crate::markup::ContentElement;
use crate::model::{Attendee, TranscriptTurn};
use crate::storage::write_atomic;
use crate::{Error, Result};
use std::path::Path;

pub use docx::DocxRenderer;
pub use markdown::MarkdownRenderer;
pub use text::TextRenderer;

/// Everything a renderer needs for one meeting.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub doc_id: &'a str,
    pub title: &'a str,
    pub created_at: &'a str,
    pub attendees: &'a [Attendee],
    pub elements: &'a [ContentElement],
    pub notes: &'a str,
    pub transcript: &'a [TranscriptTurn],
}

impl<'a> RenderInput<'a> {
    pub fn has_notes(&self) -> bool {
        !self.notes.trim().is_empty()
    }

    /// Turns with something to say, in capture order.
    pub fn spoken_turns(&self) -> impl Iterator<Item = &'a TranscriptTurn> {
        let transcript: &'a [TranscriptTurn] = self.transcript;
        transcript.iter().filter(|t| t.is_spoken())
    }

    pub fn has_transcript(&self) -> bool {
        self.spoken_turns().next().is_some()
    }

    pub fn attendee_names(&self) -> Option<String> {
        if self.attendees.is_empty() {
            return None;
        }
        Some(
            self.attendees
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

pub trait Renderer {
    fn format(&self) -> ExportFormat;

    fn render(&self, input: &RenderInput<'_>) -> Result<Vec<u8>>;

    fn render_to(&self, path: &Path, input: &RenderInput<'_>) -> Result<()> {
        let bytes = self.render(input)?;
        write_atomic(path, &bytes)
            .map_err(|e| Error::Render(format!("{}: {}", path.display(), e)))
    }
}

pub fn renderer_for(format: ExportFormat) -> Box<dyn Renderer> {
    match format {
        ExportFormat::Docx => Box::new(DocxRenderer),
        ExportFormat::Md => Box::new(MarkdownRenderer),
        ExportFormat::Txt => Box::new(TextRenderer),
    }
}

/// One interpreted line of the user's own meeting notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteLine<'a> {
    Heading(&'a str),
    Subheading(&'a str),
    Bullet(&'a str),
    Text(&'a str),
}

/// Reads notes line by line, understanding only `# `, `## `, `- ` and `* `.
pub fn note_lines(notes: &str) -> impl Iterator<Item = NoteLine<'_>> {
    notes.lines().filter_map(|line| {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        Some(if let Some(rest) = line.strip_prefix("## ") {
            NoteLine::Subheading(rest.trim())
        } else if let Some(rest) = line.strip_prefix("# ") {
            NoteLine::Heading(rest.trim())
        } else if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            NoteLine::Bullet(rest.trim())
        } else {
            NoteLine::Text(line)
        })
    })
}

/// The microphone is the local user; every other channel is the far side.
pub fn speaker_label(turn: &TranscriptTurn) -> &'static str {
    if turn.is_microphone() {
        "You"
    } else {
        "Other"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_lines() {
        let notes = "# Agenda\n\n## Budget\n- first\n* second\nplain words\n   \n#hashtag";
        let lines: Vec<_> = note_lines(notes).collect();
        assert_eq!(
            lines,
            vec![
                NoteLine::Heading("Agenda"),
                NoteLine::Subheading("Budget"),
                NoteLine::Bullet("first"),
                NoteLine::Bullet("second"),
                NoteLine::Text("plain words"),
                NoteLine::Text("#hashtag"),
            ]
        );
    }

    #[test]
    fn test_speaker_labels() {
        let mic = TranscriptTurn {
            source: "microphone".into(),
            ..Default::default()
        };
        let system = TranscriptTurn {
            source: "system".into(),
            ..Default::default()
        };
        let unknown = TranscriptTurn::default();
        assert_eq!(speaker_label(&mic), "You");
        assert_eq!(speaker_label(&system), "Other");
        assert_eq!(speaker_label(&unknown), "Other");
    }

    #[test]
    fn test_input_helpers() {
        let attendees = vec![
            Attendee {
                name: "Alice".into(),
                email: String::new(),
            },
            Attendee {
                name: "Bob".into(),
                email: String::new(),
            },
        ];
        let transcript = vec![
            TranscriptTurn {
                text: "   ".into(),
                ..Default::default()
            },
            TranscriptTurn {
                text: "hi".into(),
                ..Default::default()
            },
        ];
        let input = RenderInput {
            doc_id: "d",
            title: "t",
            created_at: "",
            attendees: &attendees,
            elements: &[],
            notes: " \n ",
            transcript: &transcript,
        };
        assert_eq!(input.attendee_names().as_deref(), Some("Alice, Bob"));
        assert!(!input.has_notes());
        assert_eq!(input.spoken_turns().count(), 1);
        assert!(input.has_transcript());
    }

    #[test]
    fn test_renderer_for_format() {
        for format in [ExportFormat::Docx, ExportFormat::Md, ExportFormat::Txt] {
            assert_eq!(renderer_for(format).format(), format);
        }
    }
}
