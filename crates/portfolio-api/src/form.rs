//! Buffered multipart form extractor.
//!
//! Admin write endpoints take `multipart/form-data` so that text fields and
//! files arrive together. [`FormData`] reads the whole body up front; file
//! parts with an empty file name (an untouched file input) are dropped.

use std::collections::HashMap;

use axum::extract::{FromRequest, Multipart, Request};

use crate::error::ApiError;

#[derive(Clone, Debug)]
pub struct FilePart {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<FilePart>>,
}

impl FormData {
    pub fn push_field(&mut self, name: &str, value: &str) {
        self.fields
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }

    pub fn push_file(&mut self, name: &str, file: FilePart) {
        self.files.entry(name.to_string()).or_default().push(file);
    }

    /// First value of a text field, trimmed. Missing is `""`.
    pub fn text(&self, name: &str) -> String {
        self.get(name).map(|v| v.trim().to_string()).unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value of a repeatable field.
    pub fn all(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `true`, `1` and `on` are true.
    pub fn flag(&self, name: &str) -> bool {
        matches!(
            self.text(name).to_ascii_lowercase().as_str(),
            "true" | "1" | "on"
        )
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.text(name).parse().ok()
    }

    /// Comma-separated and repeated values, trimmed, empty ones dropped.
    pub fn list(&self, name: &str) -> Vec<String> {
        self.all(name)
            .iter()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn file(&self, name: &str) -> Option<&FilePart> {
        self.files.get(name).and_then(|files| files.first())
    }

    pub fn files(&self, name: &str) -> &[FilePart] {
        self.files.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn take_file(&mut self, name: &str) -> Option<FilePart> {
        let files = self.files.get_mut(name)?;
        if files.is_empty() {
            None
        } else {
            Some(files.remove(0))
        }
    }

    pub fn take_files(&mut self, name: &str) -> Vec<FilePart> {
        self.files.remove(name).unwrap_or_default()
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::field("body", rejection.body_text()))?;

        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await?;
                    if file_name.is_empty() || bytes.is_empty() {
                        continue;
                    }
                    form.push_file(
                        &name,
                        FilePart {
                            file_name,
                            bytes: bytes.to_vec(),
                        },
                    );
                }
                None => {
                    let value = field.text().await?;
                    form.push_field(&name, &value);
                }
            }
        }
        Ok(form)
    }
}
