//! Random value generators.

use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Value};

use crate::args::ToolArgs;
use crate::error::ToolError;
use crate::handler::ToolHandler;
use crate::schema::{FieldSchema, FieldType, ToolDocs};

const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const NUMBERS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

const MIN_LENGTH: i64 = 4;
const MAX_LENGTH: i64 = 128;

pub struct UuidGenerator;

#[async_trait]
impl ToolHandler for UuidGenerator {
    fn slug(&self) -> &'static str {
        "uuid-generator"
    }

    fn name(&self) -> &'static str {
        "UUID Generator"
    }

    fn input_schema(&self) -> Vec<FieldSchema> {
        Vec::new()
    }

    fn docs(&self) -> Option<ToolDocs> {
        Some(
            ToolDocs::new("Generate a random version 4 UUID.")
                .note("Format: xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx")
                .example("550e8400-e29b-41d4-a716-446655440000"),
        )
    }

    async fn execute(&self, _args: &ToolArgs) -> Result<Value, ToolError> {
        Ok(json!({ "result": uuid::Uuid::new_v4().to_string() }))
    }
}

/// Options for [`generate_password`].
#[derive(Clone, Copy, Debug)]
pub struct PasswordOptions {
    pub length: i64,
    pub uppercase: bool,
    pub lowercase: bool,
    pub numbers: bool,
    pub symbols: bool,
}

impl PasswordOptions {
    fn from_args(args: &ToolArgs) -> Self {
        Self {
            length: args.int("length", 12),
            uppercase: args.bool("uppercase", true),
            lowercase: args.bool("lowercase", true),
            numbers: args.bool("numbers", true),
            symbols: args.bool("symbols", false),
        }
    }

    fn alphabet(&self) -> Vec<char> {
        let mut chars = String::new();
        for (enabled, set) in [
            (self.uppercase, UPPERCASE),
            (self.lowercase, LOWERCASE),
            (self.numbers, NUMBERS),
            (self.symbols, SYMBOLS),
        ] {
            if enabled {
                chars.push_str(set);
            }
        }
        if chars.is_empty() {
            chars.push_str(LOWERCASE);
        }
        chars.chars().collect()
    }
}

pub fn generate_password(options: &PasswordOptions) -> Result<String, ToolError> {
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&options.length) {
        return Err(ToolError::InvalidInput(format!(
            "length must be between {} and {}",
            MIN_LENGTH, MAX_LENGTH
        )));
    }
    let alphabet = options.alphabet();
    let mut rng = rand::rng();
    Ok((0..options.length)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())])
        .collect())
}

pub struct PasswordGenerator;

#[async_trait]
impl ToolHandler for PasswordGenerator {
    fn slug(&self) -> &'static str {
        "password-generator"
    }

    fn name(&self) -> &'static str {
        "Password Generator"
    }

    fn input_schema(&self) -> Vec<FieldSchema> {
        vec![
            FieldSchema::new("length", "Length", FieldType::Range)
                .default_value(16)
                .range(MIN_LENGTH, MAX_LENGTH),
            FieldSchema::new("uppercase", "Uppercase (A-Z)", FieldType::Checkbox)
                .default_value(true),
            FieldSchema::new("lowercase", "Lowercase (a-z)", FieldType::Checkbox)
                .default_value(true),
            FieldSchema::new("numbers", "Numbers (0-9)", FieldType::Checkbox).default_value(true),
            FieldSchema::new("symbols", "Symbols (!@#...)", FieldType::Checkbox)
                .default_value(false),
        ]
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let options = PasswordOptions::from_args(args);
        let password = generate_password(&options)?;
        Ok(json!({ "result": password, "length": options.length }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_uuid_is_v4() {
        let out = UuidGenerator.execute(&ToolArgs::default()).await.unwrap();
        let parsed = uuid::Uuid::parse_str(out["result"].as_str().unwrap()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[tokio::test]
    async fn test_password_defaults() {
        let out = PasswordGenerator.execute(&ToolArgs::default()).await.unwrap();
        let password = out["result"].as_str().unwrap();
        assert_eq!(password.len(), 12);
        assert_eq!(out["length"], 12);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn test_password_only_numbers_from_query_strings() {
        let args = ToolArgs::from_pairs([
            ("length", "32"),
            ("uppercase", "false"),
            ("lowercase", "0"),
            ("numbers", "true"),
        ]);
        let out = PasswordGenerator.execute(&args).await.unwrap();
        let password = out["result"].as_str().unwrap();
        assert_eq!(password.len(), 32);
        assert!(password.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_password_no_sets_falls_back_to_lowercase() {
        let options = PasswordOptions {
            length: 20,
            uppercase: false,
            lowercase: false,
            numbers: false,
            symbols: false,
        };
        let password = generate_password(&options).unwrap();
        assert!(password.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_password_symbols_only() {
        let options = PasswordOptions {
            length: 64,
            uppercase: false,
            lowercase: false,
            numbers: false,
            symbols: true,
        };
        let password = generate_password(&options).unwrap();
        assert!(password.chars().all(|c| SYMBOLS.contains(c)));
    }

    #[tokio::test]
    async fn test_password_length_bounds() {
        for length in [3, 129] {
            let args = ToolArgs::from_value(json!({ "length": length }));
            let err = PasswordGenerator.execute(&args).await.unwrap_err();
            assert_eq!(err.to_string(), "length must be between 4 and 128");
        }
    }
}
