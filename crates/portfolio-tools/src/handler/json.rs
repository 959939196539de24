//! JSON pretty-printing and minifying.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::args::ToolArgs;
use crate::error::ToolError;
use crate::handler::ToolHandler;
use crate::schema::{FieldSchema, FieldType, ToolDocs};

fn parse(args: &ToolArgs) -> Result<Value, ToolError> {
    serde_json::from_str(&args.string("text"))
        .map_err(|_| ToolError::InvalidInput("invalid JSON".into()))
}

fn json_field() -> Vec<FieldSchema> {
    vec![FieldSchema::new("text", "JSON", FieldType::Textarea)
        .placeholder("{\"key\": \"value\"}")
        .required()]
}

pub struct JsonFormatter;

#[async_trait]
impl ToolHandler for JsonFormatter {
    fn slug(&self) -> &'static str {
        "json-formatter"
    }

    fn name(&self) -> &'static str {
        "JSON Formatter"
    }

    fn input_schema(&self) -> Vec<FieldSchema> {
        json_field()
    }

    fn docs(&self) -> Option<ToolDocs> {
        Some(
            ToolDocs::new("Pretty-print JSON with two-space indentation.")
                .note("Input must be valid JSON"),
        )
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let parsed = parse(args)?;
        let result = serde_json::to_string_pretty(&parsed)
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        Ok(json!({ "result": result }))
    }
}

pub struct JsonMinifier;

#[async_trait]
impl ToolHandler for JsonMinifier {
    fn slug(&self) -> &'static str {
        "json-minifier"
    }

    fn name(&self) -> &'static str {
        "JSON Minifier"
    }

    fn input_schema(&self) -> Vec<FieldSchema> {
        json_field()
    }

    fn docs(&self) -> Option<ToolDocs> {
        Some(
            ToolDocs::new("Strip all insignificant whitespace from JSON.")
                .note("Input must be valid JSON"),
        )
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let parsed = parse(args)?;
        Ok(json!({ "result": parsed.to_string() }))
    }
}
