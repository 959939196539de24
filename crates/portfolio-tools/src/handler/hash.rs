//! Digest tools: MD5, SHA-1 and SHA-256 of a text input.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use sha2::Digest;

use crate::args::ToolArgs;
use crate::error::ToolError;
use crate::handler::ToolHandler;
use crate::schema::{FieldSchema, FieldType, ToolDocs};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Md5,
    Sha1,
    Sha256,
}

impl Algorithm {
    /// Lowercase hex digest of `input`.
    pub fn hex_digest(self, input: &[u8]) -> String {
        match self {
            Algorithm::Md5 => hex::encode(md5::Md5::digest(input)),
            Algorithm::Sha1 => hex::encode(sha1::Sha1::digest(input)),
            Algorithm::Sha256 => hex::encode(sha2::Sha256::digest(input)),
        }
    }
}

/// Hash tool for one algorithm.
pub struct HashTool {
    algorithm: Algorithm,
}

pub(crate) fn handlers() -> Vec<Arc<dyn ToolHandler>> {
    [Algorithm::Md5, Algorithm::Sha1, Algorithm::Sha256]
        .into_iter()
        .map(|algorithm| Arc::new(HashTool { algorithm }) as Arc<dyn ToolHandler>)
        .collect()
}

#[async_trait]
impl ToolHandler for HashTool {
    fn slug(&self) -> &'static str {
        match self.algorithm {
            Algorithm::Md5 => "md5",
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha256 => "sha256",
        }
    }

    fn name(&self) -> &'static str {
        match self.algorithm {
            Algorithm::Md5 => "MD5 Hash Generator",
            Algorithm::Sha1 => "SHA-1 Hash Generator",
            Algorithm::Sha256 => "SHA-256 Hash Generator",
        }
    }

    fn input_schema(&self) -> Vec<FieldSchema> {
        vec![FieldSchema::new("text", "Text", FieldType::Textarea)
            .placeholder("Text to hash...")
            .required()]
    }

    fn docs(&self) -> Option<ToolDocs> {
        let docs = match self.algorithm {
            Algorithm::Md5 => ToolDocs::new(
                "Generate the MD5 hash of a text: 128 bits, 32 hex characters. Fine for checksums, not for passwords.",
            )
            .note("Use argon2 or bcrypt for passwords")
            .example("Input: hello -> Output: 5d41402abc4b2a76b9719d911017c592"),
            Algorithm::Sha1 => ToolDocs::new(
                "Generate the SHA-1 hash of a text: 160 bits, 40 hex characters.",
            )
            .note("SHA-1 is considered weak for cryptographic use")
            .example("Input: hello -> Output: aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"),
            Algorithm::Sha256 => ToolDocs::new(
                "Generate the SHA-256 hash of a text: 256 bits, 64 hex characters.",
            )
            .example(
                "Input: hello -> Output: 2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
            ),
        };
        Some(
            docs.step("Enter text", "Type or paste the text to hash.")
                .step("Run", "The digest appears below."),
        )
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let text = args.string("text");
        let result = self.algorithm.hex_digest(text.as_bytes());
        Ok(json!({ "input": text, "result": result }))
    }
}
