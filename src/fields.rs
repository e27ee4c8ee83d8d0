//! Defaulting lookups into loosely-typed Notion records.
//!
//! Notion returns every property as a nested JSON object whose shape depends
//! on the property type, and any level may be missing. A [`FieldPath`] names
//! the nested value once so call sites read a value or fall back to a default
//! without repeating the chain of lookups.

use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

/// Path to a nested value, e.g. `Food.title[0].text.content`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path rooted at a page property.
    pub fn property(name: &str) -> Self {
        Self::new().key(name)
    }

    pub fn key(mut self, key: &str) -> Self {
        self.segments.push(Segment::from(key));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(Segment::Index(index));
        self
    }

    /// Walk the path. Returns `None` as soon as a segment is missing or the
    /// value at that level has the wrong shape.
    pub fn resolve<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(record, |current, segment| match segment {
                Segment::Key(key) => current.as_object()?.get(key.as_str()),
                Segment::Index(index) => current.as_array()?.get(*index),
            })
    }

    /// Non-empty string at the path.
    pub fn text<'a>(&self, record: &'a Value) -> Option<&'a str> {
        self.resolve(record)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn number(&self, record: &Value) -> Option<f64> {
        self.resolve(record).and_then(Value::as_f64)
    }

    /// String or number at the path rendered as text.
    pub fn scalar(&self, record: &Value) -> Option<String> {
        match self.resolve(record)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// First text fragment of a `title` or `rich_text` property.
pub fn first_text(record: &Value, property: &str, kind: &str) -> Option<String> {
    let fragment = FieldPath::property(property).key(kind).index(0);
    fragment
        .clone()
        .key("text")
        .key("content")
        .text(record)
        .or_else(|| fragment.key("plain_text").text(record))
        .map(str::to_string)
}

/// Result of a `formula` property: the string value, or a numeric result
/// rendered as text. Empty strings count as missing.
pub fn formula_text(record: &Value, property: &str) -> Option<String> {
    let formula = FieldPath::property(property).key("formula");
    formula
        .clone()
        .key("string")
        .text(record)
        .map(str::to_string)
        .or_else(|| formula.key("number").scalar(record))
}

/// Name of the selected option of a `select` property.
pub fn select_name(record: &Value, property: &str) -> Option<String> {
    FieldPath::property(property)
        .key("select")
        .key("name")
        .text(record)
        .map(str::to_string)
}

/// URL of the first file of a `files` property, external or Notion-hosted.
pub fn first_file_url(record: &Value, property: &str) -> Option<String> {
    let file = FieldPath::property(property).key("files").index(0);
    file.clone()
        .key("external")
        .key("url")
        .text(record)
        .or_else(|| file.key("file").key("url").text(record))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_walks_keys_and_indices() {
        let record = json!({ "Food": { "title": [ { "text": { "content": "Soup" } } ] } });
        let path = FieldPath::property("Food")
            .key("title")
            .index(0)
            .key("text")
            .key("content");
        assert_eq!(path.text(&record), Some("Soup"));
        assert_eq!(path.to_string(), "Food.title[0].text.content");
    }

    #[test]
    fn resolve_stops_on_wrong_shape() {
        let record = json!({ "Food": { "title": "not-a-list" } });
        let path = FieldPath::property("Food").key("title").index(0);
        assert!(path.resolve(&record).is_none());

        let record = json!([1, 2, 3]);
        assert!(FieldPath::property("Food").resolve(&record).is_none());
    }

    #[test]
    fn keys_with_slashes_are_plain_keys() {
        let record = json!({ "Cost/Unit": { "number": 3 } });
        let path = FieldPath::property("Cost/Unit").key("number");
        assert_eq!(path.number(&record), Some(3.0));
    }

    #[test]
    fn text_treats_empty_as_missing() {
        let record = json!({ "Notes": "" });
        assert_eq!(FieldPath::property("Notes").text(&record), None);
    }

    #[test]
    fn scalar_renders_numbers() {
        let record = json!({ "a": 2, "b": 2.5, "c": "x", "d": true });
        assert_eq!(FieldPath::property("a").scalar(&record).as_deref(), Some("2"));
        assert_eq!(FieldPath::property("b").scalar(&record).as_deref(), Some("2.5"));
        assert_eq!(FieldPath::property("c").scalar(&record).as_deref(), Some("x"));
        assert_eq!(FieldPath::property("d").scalar(&record), None);
    }

    #[test]
    fn first_text_falls_back_to_plain_text() {
        let record = json!({ "Food": { "title": [ { "plain_text": "Rice" } ] } });
        assert_eq!(first_text(&record, "Food", "title").as_deref(), Some("Rice"));
        assert_eq!(first_text(&record, "Notes", "rich_text"), None);
    }

    #[test]
    fn formula_text_reads_string_or_number() {
        let record = json!({
            "Days Left": { "formula": { "type": "number", "number": 3 } },
            "Status": { "formula": { "type": "string", "string": "Fresh" } },
            "Blank": { "formula": { "type": "string", "string": "" } },
        });
        assert_eq!(formula_text(&record, "Days Left").as_deref(), Some("3"));
        assert_eq!(formula_text(&record, "Status").as_deref(), Some("Fresh"));
        assert_eq!(formula_text(&record, "Blank"), None);
        assert_eq!(formula_text(&record, "Missing"), None);
    }

    #[test]
    fn first_file_url_reads_external_and_hosted() {
        let external = json!({ "Photo": { "files": [ { "external": { "url": "https://x/a.jpg" } } ] } });
        let hosted = json!({ "Photo": { "files": [ { "file": { "url": "https://s3/b.jpg" } } ] } });
        let empty = json!({ "Photo": { "files": [] } });
        assert_eq!(first_file_url(&external, "Photo").as_deref(), Some("https://x/a.jpg"));
        assert_eq!(first_file_url(&hosted, "Photo").as_deref(), Some("https://s3/b.jpg"));
        assert_eq!(first_file_url(&empty, "Photo"), None);
    }
}
