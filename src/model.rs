// ABOUTME: Serde data models for Granola cache entities and API payloads
// ABOUTME: Tolerant parsing: wrong-typed or missing fields become defaults

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const UNTITLED: &str = "Untitled Meeting";
pub const SUMMARY_PANEL_TITLE: &str = "Summary";
pub const MICROPHONE_SOURCE: &str = "microphone";

/// Accepts any JSON value, keeping it only when it is a string.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub notes_markdown: Option<String>,
}

impl Document {
    pub fn title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => UNTITLED,
        }
    }

    pub fn created_at(&self) -> &str {
        self.created_at.as_deref().unwrap_or("")
    }

    pub fn notes(&self) -> &str {
        self.notes_markdown.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TranscriptTurn {
    #[serde(default, deserialize_with = "lenient_text")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_timestamp: Option<String>,
}

impl TranscriptTurn {
    pub fn is_microphone(&self) -> bool {
        self.source == MICROPHONE_SOURCE
    }

    /// False for turns whose text is blank; those are never rendered.
    pub fn is_spoken(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Panel {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub original_content: Option<String>,
}

impl Panel {
    /// Returns the markup when this is a non-empty summary panel.
    pub fn summary_markup(&self) -> Option<&str> {
        if self.title.as_deref() != Some(SUMMARY_PANEL_TITLE) {
            return None;
        }
        self.original_content.as_deref().filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeetingMetadata {
    pub creator: Option<Attendee>,
    pub attendees: Vec<Attendee>,
}

impl MeetingMetadata {
    /// Reads the loosely shaped metadata object; anything unrecognised is dropped.
    pub fn from_value(value: &Value) -> Self {
        let creator = value.get("creator").filter(|c| c.is_object()).and_then(|c| {
            let name = full_name(c)
                .or_else(|| c.get("name").and_then(Value::as_str))
                .unwrap_or("");
            if name.is_empty() {
                return None;
            }
            Some(Attendee {
                name: name.to_string(),
                email: email_of(c).to_string(),
            })
        });

        let attendees = value
            .get("attendees")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter(|a| a.is_object())
                    .map(|a| {
                        let email = email_of(a);
                        let name = full_name(a)
                            .or(Some(email).filter(|e| !e.is_empty()))
                            .unwrap_or("Unknown");
                        Attendee {
                            name: name.to_string(),
                            email: email.to_string(),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        MeetingMetadata { creator, attendees }
    }

    /// Creator first, then invitees in listed order.
    pub fn all_attendees(&self) -> Vec<Attendee> {
        self.creator
            .iter()
            .cloned()
            .chain(self.attendees.iter().cloned())
            .collect()
    }
}

fn full_name(person: &Value) -> Option<&str> {
    person
        .pointer("/details/person/name/fullName")
        .and_then(Value::as_str)
}

fn email_of(person: &Value) -> &str {
    person.get("email").and_then(Value::as_str).unwrap_or("")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frontmatter {
    pub doc_id: String,
    pub source: String,
    pub title: String,
    pub created_at: String,
    #[serde(default)]
    pub attendees: Vec<String>,
    pub generator: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_deserialize_minimal() {
        let doc: Document = serde_json::from_str("{}").unwrap();
        assert_eq!(doc.title(), UNTITLED);
        assert_eq!(doc.created_at(), "");
        assert_eq!(doc.notes(), "");
    }

    #[test]
    fn test_document_tolerates_wrong_types() {
        let json = r#"{
            "title": null,
            "created_at": 12345,
            "notes_markdown": {"type": "doc"},
            "extra_field": "ignored"
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.title(), UNTITLED);
        assert!(doc.created_at.is_none());
        assert!(doc.notes_markdown.is_none());
    }

    #[test]
    fn test_transcript_turn_defaults() {
        let turn: TranscriptTurn = serde_json::from_str(r#"{"text": "Hello"}"#).unwrap();
        assert_eq!(turn.text, "Hello");
        assert_eq!(turn.source, "");
        assert!(!turn.is_microphone());
        assert!(turn.start_timestamp.is_none());
        assert!(turn.is_spoken());

        let blank = TranscriptTurn {
            text: " \t\n".into(),
            ..Default::default()
        };
        assert!(!blank.is_spoken());
    }

    #[test]
    fn test_panel_summary_markup() {
        let summary = Panel {
            title: Some("Summary".into()),
            original_content: Some("<p>Hi</p>".into()),
        };
        assert_eq!(summary.summary_markup(), Some("<p>Hi</p>"));

        let empty = Panel {
            title: Some("Summary".into()),
            original_content: Some(String::new()),
        };
        assert!(empty.summary_markup().is_none());

        let other = Panel {
            title: Some("Action Items".into()),
            original_content: Some("<p>Hi</p>".into()),
        };
        assert!(other.summary_markup().is_none());
    }

    #[test]
    fn test_metadata_attendees() {
        let meta = MeetingMetadata::from_value(&json!({
            "creator": {
                "name": "fallback",
                "email": "alice@example.com",
                "details": {"person": {"name": {"fullName": "Alice Smith"}}}
            },
            "attendees": [
                {"email": "bob@example.com", "details": {"person": {"name": {"fullName": "Bob Jones"}}}},
                {"email": "carol@example.com"},
                {}
            ]
        }));

        let names: Vec<_> = meta.all_attendees().into_iter().map(|a| a.name).collect();
        assert_eq!(
            names,
            vec!["Alice Smith", "Bob Jones", "carol@example.com", "Unknown"]
        );
        assert_eq!(meta.creator.unwrap().email, "alice@example.com");
    }

    #[test]
    fn test_metadata_creator_without_name_is_dropped() {
        let meta = MeetingMetadata::from_value(&json!({"creator": {"email": "x@y.z"}}));
        assert!(meta.creator.is_none());
        assert!(meta.all_attendees().is_empty());
    }
}
