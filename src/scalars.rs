//! Custom GraphQL scalars.

use std::fmt;

use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, Value};
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[12]\d{3}-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12]\d|3[01])|Present)$")
        .expect("date pattern compiles")
});

/// A lesson date: `YYYY-MM-DD`, or the literal `Present` for ongoing
/// lessons.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonDate(pub String);

impl LessonDate {
    pub fn is_valid(value: &str) -> bool {
        DATE_RE.is_match(value)
    }
}

impl fmt::Display for LessonDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[Scalar(name = "DateScalar")]
impl ScalarType for LessonDate {
    fn parse(value: Value) -> InputValueResult<Self> {
        match value {
            Value::String(s) if LessonDate::is_valid(&s) => Ok(LessonDate(s)),
            Value::String(_) => Err(InputValueError::custom(
                "date must be formatted as Year-Month-Day (YYYY-MM-DD) or \"Present\"",
            )),
            other => Err(InputValueError::expected_type(other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_calendar_dates() {
        for value in ["2024-01-31", "1999-12-01", "2023-02-28"] {
            assert!(LessonDate::is_valid(value), "rejected {value}");
        }
    }

    #[test]
    fn test_accepts_present() {
        assert!(LessonDate::is_valid("Present"));
    }

    #[test]
    fn test_rejects_malformed_dates() {
        for value in ["2024-13-01", "2024-00-10", "24-01-01", "someday", "2024-01-32", ""] {
            assert!(!LessonDate::is_valid(value), "accepted {value}");
        }
    }

    #[test]
    fn test_parse_rejects_non_strings() {
        assert!(<LessonDate as ScalarType>::parse(Value::Number(7.into())).is_err());
    }

    #[test]
    fn test_parse_and_serialize() {
        let parsed =
            <LessonDate as ScalarType>::parse(Value::String("2024-05-06".to_string())).unwrap();
        assert_eq!(parsed, LessonDate("2024-05-06".to_string()));
        assert_eq!(parsed.to_value(), Value::String("2024-05-06".to_string()));
    }
}
