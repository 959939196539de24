//! Base64 encode and decode.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};

use crate::args::ToolArgs;
use crate::error::ToolError;
use crate::handler::ToolHandler;
use crate::schema::{FieldSchema, FieldType, ToolDocs};

pub struct Base64Encode;

#[async_trait]
impl ToolHandler for Base64Encode {
    fn slug(&self) -> &'static str {
        "base64-encode"
    }

    fn name(&self) -> &'static str {
        "Base64 Encode"
    }

    fn input_schema(&self) -> Vec<FieldSchema> {
        vec![FieldSchema::new("text", "Text", FieldType::Textarea)
            .placeholder("Text to encode...")
            .required()]
    }

    fn docs(&self) -> Option<ToolDocs> {
        Some(
            ToolDocs::new("Encode text as Base64, the ASCII-safe form of binary data.")
                .note("Base64 is not encryption; anyone can decode it")
                .note("Output is about a third larger than the input")
                .example("Input: Hello World -> Output: SGVsbG8gV29ybGQ="),
        )
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let text = args.string("text");
        let result = STANDARD.encode(text.as_bytes());
        Ok(json!({ "input": text, "result": result }))
    }
}

pub struct Base64Decode;

#[async_trait]
impl ToolHandler for Base64Decode {
    fn slug(&self) -> &'static str {
        "base64-decode"
    }

    fn name(&self) -> &'static str {
        "Base64 Decode"
    }

    fn input_schema(&self) -> Vec<FieldSchema> {
        vec![FieldSchema::new("text", "Base64 String", FieldType::Textarea)
            .placeholder("Base64 string to decode...")
            .required()]
    }

    fn docs(&self) -> Option<ToolDocs> {
        Some(
            ToolDocs::new("Decode a Base64 string back to its original text.")
                .step(
                    "Paste the Base64 string",
                    "Only A-Z, a-z, 0-9, +, / and = padding are valid.",
                )
                .example("Input: SGVsbG8gV29ybGQ= -> Output: Hello World"),
        )
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let text = args.string("text");
        let decoded = STANDARD
            .decode(text.trim().as_bytes())
            .map_err(|_| ToolError::InvalidInput("invalid base64 string".into()))?;
        Ok(json!({
            "input": text,
            "result": String::from_utf8_lossy(&decoded),
        }))
    }
}
