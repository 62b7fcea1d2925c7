// ABOUTME: Markdown meeting renderer with YAML frontmatter
// ABOUTME: Summary, notes, and transcript become standard Markdown blocks

use super::{note_lines, speaker_label, NoteLine, RenderInput, Renderer};
use crate::config::ExportFormat;
use crate::markup::ContentElement;
use crate::model::Frontmatter;
use crate::util::{clock_label, long_date};
use crate::{Error, Result};

const DATE_PATTERN: &str = "%B %d, %Y at %I:%M %p";

pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Md
    }

    fn render(&self, input: &RenderInput<'_>) -> Result<Vec<u8>> {
        let frontmatter = Frontmatter {
            doc_id: input.doc_id.to_string(),
            source: "granola".into(),
            title: input.title.to_string(),
            created_at: input.created_at.to_string(),
            attendees: input.attendees.iter().map(|a| a.name.clone()).collect(),
            generator: concat!("granola-export ", env!("CARGO_PKG_VERSION")).into(),
        };
        let yaml = serde_yaml::to_string(&frontmatter)
            .map_err(|e| Error::Render(format!("Failed to serialize frontmatter: {}", e)))?;

        Ok(format!("---\n{}---\n\n{}", yaml, to_markdown_body(input)).into_bytes())
    }
}

pub fn to_markdown_body(input: &RenderInput<'_>) -> String {
    let mut out: Vec<String> = vec![format!("# {}", input.title), String::new()];

    if !input.created_at.is_empty() {
        out.push(format!(
            "**Date:** {}",
            long_date(input.created_at, DATE_PATTERN)
        ));
        out.push(String::new());
    }
    if let Some(names) = input.attendee_names() {
        out.push(format!("**Attendees:** {}", names));
        out.push(String::new());
    }

    if !input.elements.is_empty() {
        section(&mut out, "Summary");
        for element in input.elements {
            match element {
                ContentElement::Heading { text, level } => {
                    block(&mut out, format!("{} {}", "#".repeat(summary_heading_depth(*level)), text))
                }
                ContentElement::Bullet { text, depth } => bullet(&mut out, text, *depth),
                ContentElement::Paragraph { text } => block(&mut out, hard_breaks(text)),
            }
        }
    }

    if input.has_notes() {
        section(&mut out, "Notes");
        for line in note_lines(input.notes) {
            match line {
                NoteLine::Heading(text) => block(&mut out, format!("### {}", text)),
                NoteLine::Subheading(text) => block(&mut out, format!("#### {}", text)),
                NoteLine::Bullet(text) => bullet(&mut out, text, 1),
                NoteLine::Text(text) => block(&mut out, text.to_string()),
            }
        }
    }

    if input.has_transcript() {
        section(&mut out, "Transcript");
        for turn in input.spoken_turns() {
            block(
                &mut out,
                format!(
                    "**[{}] {}:** {}",
                    clock_label(turn.start_timestamp.as_deref(), false, "--:--"),
                    speaker_label(turn),
                    turn.text.trim()
                ),
            );
        }
    }

    while out.last().map_or(false, |line| line.is_empty()) {
        out.pop();
    }
    let mut body = out.join("\n");
    body.push('\n');
    body
}

/// Summary headings sit below the document's own `##` sections.
fn summary_heading_depth(level: u8) -> usize {
    (usize::from(level) + 2).min(6)
}

fn hard_breaks(text: &str) -> String {
    text.replace('\n', "  \n")
}

fn blank(out: &mut Vec<String>) {
    if out.last().map_or(false, |line| !line.is_empty()) {
        out.push(String::new());
    }
}

fn section(out: &mut Vec<String>, name: &str) {
    blank(out);
    out.push("---".into());
    out.push(String::new());
    out.push(format!("## {}", name));
    out.push(String::new());
}

fn block(out: &mut Vec<String>, text: String) {
    blank(out);
    out.push(text);
    out.push(String::new());
}

fn bullet(out: &mut Vec<String>, text: &str, depth: usize) {
    let indent = "  ".repeat(depth.saturating_sub(1));
    let continuation = format!("  \n{}  ", indent);
    out.push(format!("{}- {}", indent, text.replace('\n', &continuation)));
}
