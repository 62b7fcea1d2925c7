// ABOUTME: Single-pass scanner turning Granola summary HTML into content elements
// ABOUTME: Tolerates malformed markup; unknown tags are transparent

use serde::Serialize;
use std::borrow::Cow;

/// Text Granola appends to generated summaries; never exported.
const BOILERPLATE_PREFIX: &str = "Chat with meeting transcript";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentElement {
    Heading { text: String, level: u8 },
    Bullet { text: String, depth: usize },
    Paragraph { text: String },
}

impl ContentElement {
    pub fn text(&self) -> &str {
        match self {
            ContentElement::Heading { text, .. }
            | ContentElement::Bullet { text, .. }
            | ContentElement::Paragraph { text } => text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Heading(u8),
    ListItem,
    Paragraph,
}

/// Scanner state: the open block, text gathered since the last boundary,
/// current `<ul>` nesting, and `<li>` elements not yet closed.
#[derive(Debug, Default)]
struct MarkupParser {
    elements: Vec<ContentElement>,
    pending: String,
    current: Option<Block>,
    depth: usize,
    open_items: usize,
}

pub fn parse(markup: &str) -> Vec<ContentElement> {
    let mut parser = MarkupParser::default();
    parser.feed(markup);
    parser.flush();
    parser.elements
}

impl MarkupParser {
    fn feed(&mut self, markup: &str) {
        let mut rest = markup;

        while let Some(start) = rest.find('<') {
            self.push_text(&rest[..start]);
            let tag = &rest[start..];

            if tag.starts_with("<!--") {
                rest = match tag.find("-->") {
                    Some(end) => &tag[end + 3..],
                    None => "",
                };
                continue;
            }

            let opens_tag = tag[1..]
                .chars()
                .next()
                .map_or(false, |c| c.is_ascii_alphabetic() || c == '/' || c == '!');
            if !opens_tag {
                self.pending.push('<');
                rest = &tag[1..];
                continue;
            }

            match tag.find('>') {
                Some(end) => {
                    self.handle_tag(&tag[1..end]);
                    rest = &tag[end + 1..];
                }
                None => {
                    // Unterminated tag: keep it as text
                    self.push_text(tag);
                    rest = "";
                }
            }
        }

        self.push_text(rest);
    }

    fn handle_tag(&mut self, inner: &str) {
        let inner = inner.trim();
        let (closing, body) = match inner.strip_prefix('/') {
            Some(body) => (true, body.trim_start()),
            None => (false, inner),
        };
        let name = body
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        if closing {
            self.close(&name);
        } else {
            self.open(&name);
        }
    }

    fn open(&mut self, name: &str) {
        if let Some(level) = heading_level(name) {
            self.flush();
            self.current = Some(Block::Heading(level));
            return;
        }
        match name {
            "ul" => {
                self.flush();
                self.depth += 1;
            }
            "li" => {
                self.flush();
                self.open_items += 1;
                self.current = Some(Block::ListItem);
            }
            "p" => {
                self.flush();
                self.current = Some(if self.in_list_item() {
                    Block::ListItem
                } else {
                    Block::Paragraph
                });
            }
            "br" => self.pending.push('\n'),
            _ => {}
        }
    }

    fn close(&mut self, name: &str) {
        if heading_level(name).is_some() {
            self.flush();
            return;
        }
        match name {
            "ul" => {
                self.flush();
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    self.open_items = 0;
                }
            }
            "li" => {
                self.flush();
                self.open_items = self.open_items.saturating_sub(1);
            }
            "p" => self.flush(),
            _ => {}
        }
    }

    fn in_list_item(&self) -> bool {
        self.open_items > 0 && self.depth > 0
    }

    fn push_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.pending.push_str(&decode_entities(text));
        }
    }

    fn flush(&mut self) {
        let text = self.pending.trim();
        if !text.is_empty() && !text.starts_with(BOILERPLATE_PREFIX) {
            let text = text.to_string();
            let element = match self.current {
                Some(Block::Heading(level)) => ContentElement::Heading { text, level },
                Some(Block::ListItem) => ContentElement::Bullet {
                    text,
                    depth: self.depth.max(1),
                },
                Some(Block::Paragraph) => ContentElement::Paragraph { text },
                None if self.in_list_item() => ContentElement::Bullet {
                    text,
                    depth: self.depth,
                },
                None => ContentElement::Paragraph { text },
            };
            self.elements.push(element);
        }
        self.pending.clear();
        self.current = None;
    }
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        _ => None,
    }
}

fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| entity(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(|c| c == 'x' || c == 'X') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
