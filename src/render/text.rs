// ABOUTME: Plain-text meeting renderer
// ABOUTME: Underlined section titles, indented bullets, one transcript turn per line

use super::{note_lines, speaker_label, NoteLine, RenderInput, Renderer};
use crate::config::ExportFormat;
use crate::markup::ContentElement;
use crate::util::{clock_label, long_date};
use crate::Result;

const DATE_PATTERN: &str = "%B %d, %Y at %I:%M %p";
const DIVIDER_WIDTH: usize = 40;

pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Txt
    }

    fn render(&self, input: &RenderInput<'_>) -> Result<Vec<u8>> {
        Ok(to_text(input).into_bytes())
    }
}

pub fn to_text(input: &RenderInput<'_>) -> String {
    let mut out: Vec<String> = vec![
        input.title.to_string(),
        "=".repeat(input.title.chars().count()),
        String::new(),
    ];

    if !input.created_at.is_empty() {
        out.push(format!("Date: {}", long_date(input.created_at, DATE_PATTERN)));
    }
    if let Some(names) = input.attendee_names() {
        out.push(format!("Attendees: {}", names));
    }

    if !input.elements.is_empty() {
        section(&mut out, "SUMMARY");
        for element in input.elements {
            match element {
                ContentElement::Heading { text, .. } => heading(&mut out, text),
                ContentElement::Bullet { text, depth } => bullet(&mut out, text, *depth),
                ContentElement::Paragraph { text } => paragraph(&mut out, text),
            }
        }
    }

    if input.has_notes() {
        section(&mut out, "NOTES");
        for line in note_lines(input.notes) {
            match line {
                NoteLine::Heading(text) | NoteLine::Subheading(text) => heading(&mut out, text),
                NoteLine::Bullet(text) => bullet(&mut out, text, 1),
                NoteLine::Text(text) => paragraph(&mut out, text),
            }
        }
    }

    if input.has_transcript() {
        section(&mut out, "TRANSCRIPT");
        for turn in input.spoken_turns() {
            out.push(format!(
                "[{}] {}: {}",
                clock_label(turn.start_timestamp.as_deref(), false, "--:--"),
                speaker_label(turn),
                turn.text.trim()
            ));
        }
    }

    while out.last().map_or(false, |line| line.is_empty()) {
        out.pop();
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn blank(out: &mut Vec<String>) {
    if out.last().map_or(false, |line| !line.is_empty()) {
        out.push(String::new());
    }
}

fn section(out: &mut Vec<String>, name: &str) {
    blank(out);
    out.push("-".repeat(DIVIDER_WIDTH));
    out.push(String::new());
    out.push(name.to_string());
    out.push("-".repeat(name.chars().count()));
    out.push(String::new());
}

fn heading(out: &mut Vec<String>, text: &str) {
    blank(out);
    out.push(text.to_string());
    out.push("~".repeat(text.chars().count()));
}

fn bullet(out: &mut Vec<String>, text: &str, depth: usize) {
    let indent = "  ".repeat(depth);
    let continuation = format!("\n{}  ", indent);
    out.push(format!("{}- {}", indent, text.replace('\n', &continuation)));
}

fn paragraph(out: &mut Vec<String>, text: &str) {
    blank(out);
    out.push(text.to_string());
    out.push(String::new());
}
