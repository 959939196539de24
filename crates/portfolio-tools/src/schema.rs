//! Input field schemas and usage docs that front-ends render for each tool.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Widget a front-end should render for a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Url,
    Number,
    Range,
    Checkbox,
    Select,
}

/// One input field of a tool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub placeholder: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub options: Option<Vec<Value>>,
    pub required: bool,
}

impl FieldSchema {
    pub fn new(key: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            field_type,
            placeholder: String::new(),
            default: None,
            min: None,
            max: None,
            options: None,
            required: false,
        }
    }

    pub fn placeholder(mut self, text: &str) -> Self {
        self.placeholder = text.to_string();
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocStep {
    pub title: String,
    pub desc: String,
}

/// Usage documentation shown on a tool's public page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolDocs {
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub steps: Vec<DocStep>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub examples: Vec<String>,
}

impl ToolDocs {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            ..Default::default()
        }
    }

    pub fn step(mut self, title: &str, desc: &str) -> Self {
        self.steps.push(DocStep {
            title: title.to_string(),
            desc: desc.to_string(),
        });
        self
    }

    pub fn note(mut self, note: &str) -> Self {
        self.notes.push(note.to_string());
        self
    }

    pub fn example(mut self, example: &str) -> Self {
        self.examples.push(example.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_schema_serializes_type_key() {
        let field = FieldSchema::new("text", "Text", FieldType::Textarea)
            .placeholder("Text to hash...")
            .required();
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "textarea");
        assert_eq!(json["required"], true);
        assert!(json.get("min").is_none());
        assert!(json.get("default").is_none());
    }

    #[test]
    fn test_range_field_carries_bounds() {
        let field = FieldSchema::new("length", "Length", FieldType::Range)
            .default_value(16)
            .range(4, 128);
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["min"], 4);
        assert_eq!(json["max"], 128);
        assert_eq!(json["default"], 16);
    }

    #[test]
    fn test_docs_builder_skips_empty_lists() {
        let docs = ToolDocs::new("Reverse text").example("abc -> cba");
        let json = serde_json::to_value(&docs).unwrap();
        assert!(json.get("steps").is_none());
        assert_eq!(json["examples"][0], "abc -> cba");
    }
}
