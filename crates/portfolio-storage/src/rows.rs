//! Row conversion helpers shared by the repositories.

use std::str::FromStr;

use chrono::{NaiveDate, TimeZone, Utc};
use rusqlite::types::Type;

use portfolio_core::error::PortfolioError;
use portfolio_core::types::Timestamp;

/// Map any rusqlite error to a storage error.
pub(crate) fn storage_err(e: rusqlite::Error) -> PortfolioError {
    PortfolioError::Storage(e.to_string())
}

/// Map a write error, turning UNIQUE violations into a conflict with `message`.
pub(crate) fn write_err(e: rusqlite::Error, message: &str) -> PortfolioError {
    if let rusqlite::Error::SqliteFailure(ref err, _) = e {
        if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        {
            return PortfolioError::Conflict(message.to_string());
        }
    }
    PortfolioError::Storage(e.to_string())
}

pub(crate) fn now_secs() -> i64 {
    Utc::now().timestamp()
}

pub(crate) fn to_ts(secs: i64) -> Timestamp {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

pub(crate) fn opt_ts(secs: Option<i64>) -> Option<Timestamp> {
    secs.map(to_ts)
}

pub(crate) fn date_to_sql(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

pub(crate) fn date_from_sql(text: Option<String>) -> Option<NaiveDate> {
    text.and_then(|t| NaiveDate::parse_from_str(&t, "%Y-%m-%d").ok())
}

/// Read a text column and parse it into one of the domain enums.
pub(crate) fn enum_col<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|msg| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, msg)),
        )
    })
}

/// Escape a user search term for use in a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29);
        assert_eq!(date_from_sql(date_to_sql(date)), date);
        assert_eq!(date_from_sql(Some("not a date".into())), None);
    }

    #[test]
    fn test_to_ts() {
        assert_eq!(to_ts(0).timestamp(), 0);
        assert_eq!(to_ts(1_700_000_000).timestamp(), 1_700_000_000);
    }
}
