//! Plain text utilities.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::args::ToolArgs;
use crate::error::ToolError;
use crate::handler::ToolHandler;
use crate::schema::{FieldSchema, FieldType, ToolDocs};

/// Word, character and line counts. Characters are Unicode scalar values.
pub struct WordCounter;

#[derive(Debug, PartialEq, Eq)]
pub struct TextCounts {
    pub words: usize,
    pub characters: usize,
    pub characters_no_space: usize,
    pub lines: usize,
}

pub fn count_text(text: &str) -> TextCounts {
    TextCounts {
        words: text.split_whitespace().count(),
        characters: text.chars().count(),
        characters_no_space: text.chars().filter(|c| *c != ' ' && *c != '\t').count(),
        lines: if text.is_empty() {
            0
        } else {
            text.split('\n').count()
        },
    }
}

#[async_trait]
impl ToolHandler for WordCounter {
    fn slug(&self) -> &'static str {
        "word-counter"
    }

    fn name(&self) -> &'static str {
        "Word Counter"
    }

    fn input_schema(&self) -> Vec<FieldSchema> {
        vec![FieldSchema::new("text", "Text", FieldType::Textarea)
            .placeholder("Paste your text here...")
            .required()]
    }

    fn docs(&self) -> Option<ToolDocs> {
        Some(
            ToolDocs::new("Count the words, characters and lines of a text.")
                .note("Words are separated by whitespace")
                .note("Characters without spaces ignore spaces and tabs")
                .note("Each line break starts a new line"),
        )
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let counts = count_text(&args.string("text"));
        Ok(json!({
            "words": counts.words,
            "characters": counts.characters,
            "characters_no_space": counts.characters_no_space,
            "lines": counts.lines,
        }))
    }
}

/// Reverses text by character, so multi-byte characters survive.
pub struct TextReverse;

#[async_trait]
impl ToolHandler for TextReverse {
    fn slug(&self) -> &'static str {
        "text-reverse"
    }

    fn name(&self) -> &'static str {
        "Text Reverse"
    }

    fn input_schema(&self) -> Vec<FieldSchema> {
        vec![FieldSchema::new("text", "Text", FieldType::Textarea)
            .placeholder("Text to reverse...")
            .required()]
    }

    fn docs(&self) -> Option<ToolDocs> {
        Some(
            ToolDocs::new("Reverse the characters of a text, including non-ASCII characters.")
                .example("Input: Hello World -> Output: dlroW olleH"),
        )
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let text = args.string("text");
        let result: String = text.chars().rev().collect();
        Ok(json!({ "input": text, "result": result }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_text() {
        let counts = count_text("hello world\nsecond line");
        assert_eq!(
            counts,
            TextCounts {
                words: 4,
                characters: 23,
                characters_no_space: 21,
                lines: 2
            }
        );
    }

    #[test]
    fn test_count_empty_text() {
        let counts = count_text("");
        assert_eq!(counts.words, 0);
        assert_eq!(counts.lines, 0);
        assert_eq!(counts.characters, 0);
    }

    #[test]
    fn test_count_multibyte_characters() {
        let counts = count_text("héllo 日本");
        assert_eq!(counts.characters, 8);
        assert_eq!(counts.words, 2);
    }

    #[tokio::test]
    async fn test_reverse_unicode() {
        let args = ToolArgs::from_value(json!({ "text": "abc日本" }));
        let out = TextReverse.execute(&args).await.unwrap();
        assert_eq!(out["result"], "本日cba");
    }
}
