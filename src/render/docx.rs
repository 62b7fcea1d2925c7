// ABOUTME: Styled .docx meeting renderer built from raw WordprocessingML parts
// ABOUTME: Zips document, styles, and bullet numbering into an OOXML package

use super::{note_lines, speaker_label, NoteLine, RenderInput, Renderer};
use crate::config::ExportFormat;
use crate::markup::ContentElement;
use crate::util::{clock_label, long_date};
use crate::{Error, Result};
use std::io::{Cursor, Write};
use zip::result::ZipResult;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const DATE_PATTERN: &str = "%A, %B %d, %Y  |  %I:%M %p";
const MAX_LIST_LEVEL: usize = 8;
const MIC_COLOR: &str = "1A73E8";
const OTHER_COLOR: &str = "5F6368";

pub struct DocxRenderer;

impl Renderer for DocxRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Docx
    }

    fn render(&self, input: &RenderInput<'_>) -> Result<Vec<u8>> {
        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            ("_rels/.rels", PACKAGE_RELS.to_string()),
            ("docProps/core.xml", core_properties(input.title)),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
            ("word/styles.xml", STYLES.to_string()),
            ("word/numbering.xml", numbering()),
            ("word/document.xml", document_xml(input)),
        ];
        package(&parts).map_err(|e| Error::Render(format!("docx packaging failed: {}", e)))
    }
}

fn package(parts: &[(&str, String)]) -> ZipResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, body) in parts {
        zip.start_file(*name, options)?;
        zip.write_all(body.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

pub fn document_xml(input: &RenderInput<'_>) -> String {
    let mut body = Body::default();

    body.styled("Title", &run(input.title, ""));

    if !input.created_at.is_empty() {
        let date = long_date(input.created_at, DATE_PATTERN);
        body.plain(&run(&date, "<w:i/><w:color w:val=\"666666\"/>"));
    }

    if let Some(names) = input.attendee_names() {
        body.plain(&format!("{}{}", run("Attendees:  ", "<w:b/>"), run(&names, "")));
    }

    body.divider();

    if !input.elements.is_empty() {
        body.styled("Heading1", &run("Meeting Summary", ""));
        for element in input.elements {
            match element {
                ContentElement::Heading { text, .. } => body.styled("Heading2", &run(text, "")),
                ContentElement::Bullet { text, depth } => body.bullet(text, *depth),
                ContentElement::Paragraph { text } => body.plain(&run(text, "")),
            }
        }
    }

    if input.has_notes() {
        body.divider();
        body.styled("Heading1", &run("Notes", ""));
        for line in note_lines(input.notes) {
            match line {
                NoteLine::Heading(text) => body.styled("Heading2", &run(text, "")),
                NoteLine::Subheading(text) => body.styled("Heading3", &run(text, "")),
                NoteLine::Bullet(text) => body.bullet(text, 1),
                NoteLine::Text(text) => body.plain(&run(text, "")),
            }
        }
    }

    if input.has_transcript() {
        body.page_break();
        body.styled("Heading1", &run("Full Transcript", ""));
        for turn in input.spoken_turns() {
            let time = clock_label(turn.start_timestamp.as_deref(), true, "??:??:??");
            let color = if turn.is_microphone() { MIC_COLOR } else { OTHER_COLOR };
            let runs = format!(
                "{}{}{}",
                run(&format!("{}  ", time), "<w:color w:val=\"999999\"/><w:sz w:val=\"16\"/>"),
                run(
                    &format!("[{}]  ", speaker_label(turn)),
                    &format!("<w:b/><w:color w:val=\"{}\"/><w:sz w:val=\"18\"/>", color)
                ),
                run(turn.text.trim(), "<w:sz w:val=\"19\"/>"),
            );
            body.raw(
                "<w:pPr><w:spacing w:before=\"20\" w:after=\"20\"/></w:pPr>",
                &runs,
            );
        }
    }

    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
            "<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">",
            "<w:body>{}",
            "<w:sectPr><w:pgSz w:w=\"12240\" w:h=\"15840\"/>",
            "<w:pgMar w:top=\"1440\" w:right=\"1440\" w:bottom=\"1440\" w:left=\"1440\" ",
            "w:header=\"720\" w:footer=\"720\" w:gutter=\"0\"/></w:sectPr>",
            "</w:body></w:document>"
        ),
        body.xml
    )
}

#[derive(Default)]
struct Body {
    xml: String,
}

impl Body {
    fn raw(&mut self, properties: &str, runs: &str) {
        self.xml.push_str("<w:p>");
        self.xml.push_str(properties);
        self.xml.push_str(runs);
        self.xml.push_str("</w:p>");
    }

    fn plain(&mut self, runs: &str) {
        self.raw("", runs);
    }

    fn styled(&mut self, style: &str, runs: &str) {
        self.raw(&format!("<w:pPr><w:pStyle w:val=\"{}\"/></w:pPr>", style), runs);
    }

    fn bullet(&mut self, text: &str, depth: usize) {
        let level = depth.saturating_sub(1).min(MAX_LIST_LEVEL);
        self.raw(
            &format!(
                "<w:pPr><w:pStyle w:val=\"ListBullet\"/><w:numPr><w:ilvl w:val=\"{}\"/><w:numId w:val=\"1\"/></w:numPr></w:pPr>",
                level
            ),
            &run(text, ""),
        );
    }

    fn divider(&mut self) {
        self.raw(
            concat!(
                "<w:pPr><w:pBdr><w:bottom w:val=\"single\" w:sz=\"6\" w:space=\"1\" w:color=\"CCCCCC\"/></w:pBdr>",
                "<w:spacing w:before=\"160\" w:after=\"160\"/></w:pPr>"
            ),
            "",
        );
    }

    fn page_break(&mut self) {
        self.plain("<w:r><w:br w:type=\"page\"/></w:r>");
    }
}

/// One run; embedded newlines become line breaks.
fn run(text: &str, properties: &str) -> String {
    let mut out = String::from("<w:r>");
    if !properties.is_empty() {
        out.push_str("<w:rPr>");
        out.push_str(properties);
        out.push_str("</w:rPr>");
    }
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<w:br/>");
        }
        out.push_str("<w:t xml:space=\"preserve\">");
        out.push_str(&escape_xml(line));
        out.push_str("</w:t>");
    }
    out.push_str("</w:r>");
    out
}

/// Escapes markup characters and drops code points XML 1.0 forbids.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

fn core_properties(title: &str) -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
            "<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" ",
            "xmlns:dc=\"http://purl.org/dc/elements/1.1/\">",
            "<dc:title>{}</dc:title><dc:creator>granola-export</dc:creator>",
            "</cp:coreProperties>"
        ),
        escape_xml(title)
    )
}

fn numbering() -> String {
    let levels: String = (0..=MAX_LIST_LEVEL)
        .map(|level| {
            let glyph = if level % 2 == 0 { "•" } else { "◦" };
            format!(
                concat!(
                    "<w:lvl w:ilvl=\"{lvl}\"><w:start w:val=\"1\"/><w:numFmt w:val=\"bullet\"/>",
                    "<w:lvlText w:val=\"{glyph}\"/><w:lvlJc w:val=\"left\"/>",
                    "<w:pPr><w:ind w:left=\"{left}\" w:hanging=\"360\"/></w:pPr></w:lvl>"
                ),
                lvl = level,
                glyph = glyph,
                left = 360 * (level + 1),
            )
        })
        .collect();

    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
            "<w:numbering xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">",
            "<w:abstractNum w:abstractNumId=\"0\"><w:multiLevelType w:val=\"hybridMultilevel\"/>{}</w:abstractNum>",
            "<w:num w:numId=\"1\"><w:abstractNumId w:val=\"0\"/></w:num>",
            "</w:numbering>"
        ),
        levels
    )
}

const CONTENT_TYPES: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
    "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
    "<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>",
    "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
    "<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>",
    "<Override PartName=\"/word/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml\"/>",
    "<Override PartName=\"/word/numbering.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml\"/>",
    "<Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>",
    "</Types>"
);

const PACKAGE_RELS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>",
    "<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>",
    "</Relationships>"
);

const DOCUMENT_RELS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>",
    "<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering\" Target=\"numbering.xml\"/>",
    "</Relationships>"
);

// Sizes are in half-points: 22 = 11pt
const STYLES: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
    "<w:styles xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">",
    "<w:docDefaults><w:rPrDefault><w:rPr>",
    "<w:rFonts w:ascii=\"Calibri\" w:hAnsi=\"Calibri\" w:eastAsia=\"Calibri\" w:cs=\"Calibri\"/>",
    "<w:sz w:val=\"22\"/><w:szCs w:val=\"22\"/>",
    "</w:rPr></w:rPrDefault>",
    "<w:pPrDefault><w:pPr><w:spacing w:before=\"0\" w:after=\"80\"/></w:pPr></w:pPrDefault>",
    "</w:docDefaults>",
    "<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\"><w:name w:val=\"Normal\"/></w:style>",
    "<w:style w:type=\"paragraph\" w:styleId=\"Title\"><w:name w:val=\"Title\"/><w:basedOn w:val=\"Normal\"/>",
    "<w:next w:val=\"Normal\"/><w:pPr><w:spacing w:after=\"120\"/></w:pPr>",
    "<w:rPr><w:b/><w:color w:val=\"1A1A2E\"/><w:sz w:val=\"44\"/><w:szCs w:val=\"44\"/></w:rPr></w:style>",
    "<w:style w:type=\"paragraph\" w:styleId=\"Heading1\"><w:name w:val=\"heading 1\"/><w:basedOn w:val=\"Normal\"/>",
    "<w:next w:val=\"Normal\"/><w:pPr><w:keepNext/><w:spacing w:before=\"240\" w:after=\"80\"/><w:outlineLvl w:val=\"0\"/></w:pPr>",
    "<w:rPr><w:b/><w:color w:val=\"333333\"/><w:sz w:val=\"32\"/><w:szCs w:val=\"32\"/></w:rPr></w:style>",
    "<w:style w:type=\"paragraph\" w:styleId=\"Heading2\"><w:name w:val=\"heading 2\"/><w:basedOn w:val=\"Normal\"/>",
    "<w:next w:val=\"Normal\"/><w:pPr><w:keepNext/><w:spacing w:before=\"200\" w:after=\"60\"/><w:outlineLvl w:val=\"1\"/></w:pPr>",
    "<w:rPr><w:b/><w:color w:val=\"444444\"/><w:sz w:val=\"26\"/><w:szCs w:val=\"26\"/></w:rPr></w:style>",
    "<w:style w:type=\"paragraph\" w:styleId=\"Heading3\"><w:name w:val=\"heading 3\"/><w:basedOn w:val=\"Normal\"/>",
    "<w:next w:val=\"Normal\"/><w:pPr><w:keepNext/><w:spacing w:before=\"160\" w:after=\"40\"/><w:outlineLvl w:val=\"2\"/></w:pPr>",
    "<w:rPr><w:b/><w:color w:val=\"555555\"/><w:sz w:val=\"24\"/><w:szCs w:val=\"24\"/></w:rPr></w:style>",
    "<w:style w:type=\"paragraph\" w:styleId=\"ListBullet\"><w:name w:val=\"List Bullet\"/><w:basedOn w:val=\"Normal\"/></w:style>",
    "</w:styles>"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attendee, TranscriptTurn};
    use std::io::Read;
    use zip::ZipArchive;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\" 'd'>"), "a&lt;b &amp; &quot;c&quot; &apos;d&apos;&gt;");
        assert_eq!(escape_xml("bell\u{7}tab\t"), "belltab\t");
    }

    #[test]
    fn test_package_contains_all_parts() {
        let input = RenderInput {
            doc_id: "doc1",
            title: "R&D Sync",
            created_at: "2025-10-28T15:04:05Z",
            attendees: &[],
            elements: &[],
            notes: "",
            transcript: &[],
        };
        let bytes = DocxRenderer.render(&input).unwrap();

        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<_> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "word/numbering.xml",
            "word/document.xml",
        ] {
            assert!(names.contains(&part), "missing {}", part);
        }

        assert!(read_part(&bytes, "docProps/core.xml").contains("<dc:title>R&amp;D Sync</dc:title>"));
        let document = read_part(&bytes, "word/document.xml");
        assert!(document.contains("R&amp;D Sync"));
        assert!(document.contains("Tuesday, October 28, 2025  |  03:04 PM"));
    }

    #[test]
    fn test_document_sections() {
        let attendees = vec![Attendee {
            name: "Alice".into(),
            email: String::new(),
        }];
        let elements = vec![
            ContentElement::Heading {
                text: "Decisions".into(),
                level: 1,
            },
            ContentElement::Bullet {
                text: "Nested".into(),
                depth: 2,
            },
            ContentElement::Paragraph {
                text: "line one\nline two".into(),
            },
        ];
        let transcript = vec![
            TranscriptTurn {
                source: "microphone".into(),
                text: "Hello".into(),
                start_timestamp: Some("2025-10-28T15:05:07Z".into()),
            },
            TranscriptTurn {
                source: "system".into(),
                text: "Hey".into(),
                start_timestamp: None,
            },
        ];
        let input = RenderInput {
            doc_id: "doc1",
            title: "Weekly",
            created_at: "whenever",
            attendees: &attendees,
            elements: &elements,
            notes: "## Budget\n- item",
            transcript: &transcript,
        };

        let xml = document_xml(&input);
        assert!(xml.contains("whenever"));
        assert!(xml.contains("Attendees:  "));
        assert!(xml.contains("Meeting Summary"));
        assert!(xml.contains("<w:pStyle w:val=\"Heading2\"/></w:pPr><w:r><w:t xml:space=\"preserve\">Decisions"));
        assert!(xml.contains("<w:ilvl w:val=\"1\"/>"));
        assert!(xml.contains("line one</w:t><w:br/><w:t xml:space=\"preserve\">line two"));
        assert!(xml.contains("<w:pStyle w:val=\"Heading3\"/></w:pPr><w:r><w:t xml:space=\"preserve\">Budget"));
        assert!(xml.contains("<w:br w:type=\"page\"/>"));
        assert!(xml.contains("15:05:07  "));
        assert!(xml.contains("??:??:??  "));
        assert!(xml.contains("[You]  "));
        assert!(xml.contains("[Other]  "));

        // Page break comes right before the transcript heading
        let page_break = xml.find("<w:br w:type=\"page\"/>").unwrap();
        let heading = xml.find("Full Transcript").unwrap();
        assert!(page_break < heading);
    }

    #[test]
    fn test_empty_sections_omitted() {
        let input = RenderInput {
            doc_id: "doc1",
            title: "Bare",
            created_at: "",
            attendees: &[],
            elements: &[],
            notes: "",
            transcript: &[],
        };
        let xml = document_xml(&input);
        assert!(!xml.contains("Meeting Summary"));
        assert!(!xml.contains("Attendees"));
        assert!(!xml.contains("Full Transcript"));
        assert!(!xml.contains(">Notes<"));
    }
}
