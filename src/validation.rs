//! Input validators for the parent flow: submission dates and child names.
//!
//! Both validators return typed values on success so that a `Submission`
//! can only be assembled from input that already passed validation.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;

use crate::error::{DateError, NameError};

/// Wire/storage format for submission dates.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Minimum child name length, in characters, after trimming.
pub const NAME_MIN_CHARS: usize = 2;

/// Maximum child name length, in characters, after trimming.
pub const NAME_MAX_CHARS: usize = 100;

static NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Zа-яА-ЯёЁ\s\-]+$").expect("valid name regex"));

/// A calendar date that is not in the future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubmissionDate(NaiveDate);

impl SubmissionDate {
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Canonical `dd.mm.yyyy` form used for storage and lookups.
    pub fn to_storage_string(&self) -> String {
        self.0.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for SubmissionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

/// A trimmed child name made of Latin/Cyrillic letters, spaces and hyphens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildName(String);

impl ChildName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChildName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a `dd.mm.yyyy` date against the local calendar date.
pub fn validate_date(text: &str) -> Result<SubmissionDate, DateError> {
    validate_date_at(text, Local::now().date_naive())
}

/// Validate a `dd.mm.yyyy` date against an explicit "today". Surrounding
/// whitespace is a format error.
pub fn validate_date_at(text: &str, today: NaiveDate) -> Result<SubmissionDate, DateError> {
    if text.chars().any(char::is_whitespace) {
        return Err(DateError::Format);
    }
    let date = NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| DateError::Format)?;
    if date > today {
        return Err(DateError::Future);
    }
    Ok(SubmissionDate(date))
}

/// Validate a child name, returning the trimmed value.
pub fn validate_name(text: &str) -> Result<ChildName, NameError> {
    let name = text.trim();
    if name.is_empty() {
        return Err(NameError::Empty);
    }

    let len = name.chars().count();
    if len < NAME_MIN_CHARS {
        return Err(NameError::TooShort {
            min: NAME_MIN_CHARS,
        });
    }
    if len > NAME_MAX_CHARS {
        return Err(NameError::TooLong {
            max: NAME_MAX_CHARS,
        });
    }

    if !NAME_CHARS.is_match(name) {
        return Err(NameError::InvalidChars);
    }

    Ok(ChildName(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_rejects_impossible_calendar_day() {
        assert_eq!(
            validate_date_at("31.02.2025", day(2026, 1, 1)),
            Err(DateError::Format)
        );
    }

    #[test]
    fn date_rejects_wrong_format() {
        let today = day(2026, 1, 1);
        assert_eq!(validate_date_at("2025-01-01", today), Err(DateError::Format));
        assert_eq!(validate_date_at("вчера", today), Err(DateError::Format));
        assert_eq!(validate_date_at("", today), Err(DateError::Format));
    }

    #[test]
    fn date_rejects_padding() {
        let today = day(2026, 1, 1);
        assert_eq!(validate_date_at(" 01.12.2024", today), Err(DateError::Format));
        assert_eq!(validate_date_at("01.12.2024 ", today), Err(DateError::Format));
        assert_eq!(validate_date_at("01. 12.2024", today), Err(DateError::Format));
    }

    #[test]
    fn date_rejects_tomorrow() {
        let tomorrow = Local::now().date_naive().succ_opt().unwrap();
        let text = tomorrow.format(DATE_FORMAT).to_string();
        assert_eq!(validate_date(&text), Err(DateError::Future));
    }

    #[test]
    fn date_accepts_today() {
        let today = Local::now().date_naive();
        let text = today.format(DATE_FORMAT).to_string();
        assert_eq!(validate_date(&text).unwrap().date(), today);
    }

    #[test]
    fn date_accepts_past_and_canonicalises() {
        let date = validate_date_at("1.12.2024", day(2026, 1, 1)).unwrap();
        assert_eq!(date.to_storage_string(), "01.12.2024");
        assert_eq!(date.to_string(), "01.12.2024");
    }

    #[test]
    fn name_rejects_empty_and_blank() {
        assert_eq!(validate_name(""), Err(NameError::Empty));
        assert_eq!(validate_name("   "), Err(NameError::Empty));
    }

    #[test]
    fn name_rejects_single_letter() {
        assert_eq!(validate_name("A"), Err(NameError::TooShort { min: 2 }));
        assert_eq!(validate_name("  Я "), Err(NameError::TooShort { min: 2 }));
    }

    #[test]
    fn name_rejects_too_long() {
        let long = "а".repeat(101);
        assert_eq!(validate_name(&long), Err(NameError::TooLong { max: 100 }));
        // Cyrillic letters are two bytes each; the limit counts characters.
        assert!(validate_name(&"а".repeat(100)).is_ok());
    }

    #[test]
    fn name_rejects_digits_and_symbols() {
        assert_eq!(validate_name("John123"), Err(NameError::InvalidChars));
        assert_eq!(validate_name("Ivan_Ivanov"), Err(NameError::InvalidChars));
        assert_eq!(validate_name("Иван!"), Err(NameError::InvalidChars));
    }

    #[test]
    fn name_accepts_cyrillic_latin_and_hyphen() {
        assert_eq!(validate_name("Иван-Петров").unwrap().as_str(), "Иван-Петров");
        assert_eq!(validate_name("  Ivan Ivanov ").unwrap().as_str(), "Ivan Ivanov");
        assert_eq!(validate_name("Алёна Ёлкина").unwrap().as_str(), "Алёна Ёлкина");
    }
}
