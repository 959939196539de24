//! Request field validation that collects one message per field.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{ApiError, FieldErrors};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Parse `YYYY-MM-DD`. Anything else is `None`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Accumulates field errors. The first failure for a field wins.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, field: &str, ok: bool, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors
                .entry(field.to_string())
                .or_insert_with(|| message.into());
        }
        self
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(
            field,
            !value.trim().is_empty(),
            format!("{} is required", field),
        )
    }

    /// Required, and `min..=max` characters long.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        self.required(field, value);
        let len = value.trim().chars().count();
        self.check(
            field,
            (min..=max).contains(&len),
            format!("{} must be between {} and {} characters", field, min, max),
        )
    }

    pub fn min_length(&mut self, field: &str, value: &str, min: usize) -> &mut Self {
        self.check(
            field,
            value.chars().count() >= min,
            format!("{} must be at least {} characters", field, min),
        )
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        self.required(field, value);
        self.check(
            field,
            is_email(value.trim()),
            format!("{} must be a valid email", field),
        )
    }

    /// Required, and one of the values `T` parses from.
    pub fn one_of<T>(&mut self, field: &str, value: &str) -> Option<T>
    where
        T: std::str::FromStr<Err = String>,
    {
        if value.trim().is_empty() {
            self.required(field, value);
            return None;
        }
        match value.trim().parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(msg) => {
                self.check(field, false, format!("{} {}", field, msg));
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}
