use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{FieldError, FieldErrorKind, Location};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$").expect("valid email regex"));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub limit: f64,
    pub inclusive: bool,
}

impl Bound {
    pub fn inclusive(limit: f64) -> Self {
        Self { limit, inclusive: true }
    }

    pub fn exclusive(limit: f64) -> Self {
        Self { limit, inclusive: false }
    }
}

#[derive(Debug, Clone)]
pub enum Format {
    Email,
    Pattern(Regex),
}

impl Format {
    fn matches(&self, s: &str) -> bool {
        match self {
            Format::Email => EMAIL.is_match(s),
            Format::Pattern(regex) => regex.is_match(s),
        }
    }

    fn describe(&self) -> String {
        match self {
            Format::Email => "value is not a valid email address".to_owned(),
            Format::Pattern(regex) => format!("string does not match pattern `{}`", regex.as_str()),
        }
    }
}

/// Constraints on an already coerced value, checked range first, then length, then format.
///
/// Range applies to numbers, length to strings (in characters) and lists, format to strings.
/// A constraint that does not apply to the value's type is skipped.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub(crate) min: Option<Bound>,
    pub(crate) max: Option<Bound>,
    pub(crate) min_length: Option<usize>,
    pub(crate) max_length: Option<usize>,
    pub(crate) format: Option<Format>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
            && self.max.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.format.is_none()
    }

    /// The first violated constraint, if any.
    pub(crate) fn check(&self, value: &Value, location: Location, field: &str) -> Option<FieldError> {
        self.check_range(value)
            .map(|message| (FieldErrorKind::Range, message))
            .or_else(|| self.check_length(value).map(|message| (FieldErrorKind::Length, message)))
            .or_else(|| self.check_format(value).map(|message| (FieldErrorKind::Pattern, message)))
            .map(|(kind, message)| FieldError::new(location, field, kind, message))
    }

    fn check_range(&self, value: &Value) -> Option<String> {
        let n = value.as_f64()?;
        if let Some(min) = self.min {
            if min.inclusive && n < min.limit {
                return Some(format!("ensure this value is greater than or equal to {}", min.limit));
            }
            if !min.inclusive && n <= min.limit {
                return Some(format!("ensure this value is greater than {}", min.limit));
            }
        }
        if let Some(max) = self.max {
            if max.inclusive && n > max.limit {
                return Some(format!("ensure this value is less than or equal to {}", max.limit));
            }
            if !max.inclusive && n >= max.limit {
                return Some(format!("ensure this value is less than {}", max.limit));
            }
        }
        None
    }

    fn check_length(&self, value: &Value) -> Option<String> {
        let (len, unit) = match value {
            Value::String(s) => (s.chars().count(), "characters"),
            Value::Array(items) => (items.len(), "items"),
            _ => return None,
        };
        if let Some(min) = self.min_length.filter(|min| len < *min) {
            return Some(format!("ensure this value has at least {min} {unit}"));
        }
        if let Some(max) = self.max_length.filter(|max| len > *max) {
            return Some(format!("ensure this value has at most {max} {unit}"));
        }
        None
    }

    fn check_format(&self, value: &Value) -> Option<String> {
        let format = self.format.as_ref()?;
        let s = value.as_str()?;
        (!format.matches(s)).then(|| format.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn constraints() -> Constraints {
        Constraints::default()
    }

    #[test]
    fn inclusive_and_exclusive_bounds() {
        let ge = Constraints { min: Some(Bound::inclusive(0.0)), ..constraints() };
        assert!(ge.check(&json!(0), Location::Query, "min_price").is_none());
        assert!(ge.check(&json!(-5), Location::Query, "min_price").is_some());

        let gt = Constraints { min: Some(Bound::exclusive(0.0)), ..constraints() };
        let error = gt.check(&json!(0.0), Location::Body, "price").expect("zero is not greater than zero");
        assert_eq!(error.kind(), FieldErrorKind::Range);
        assert_eq!(error.message(), "ensure this value is greater than 0");

        let le = Constraints { max: Some(Bound::inclusive(120.0)), ..constraints() };
        assert!(le.check(&json!(120), Location::Body, "age").is_none());
        assert!(le.check(&json!(121), Location::Body, "age").is_some());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let c = Constraints { min_length: Some(3), max_length: Some(4), ..constraints() };
        assert!(c.check(&json!("héé"), Location::Body, "username").is_none());
        let error = c.check(&json!("ab"), Location::Body, "username").expect("too short");
        assert_eq!(error.message(), "ensure this value has at least 3 characters");
        assert!(c.check(&json!(["a", "b", "c", "d", "e"]), Location::Body, "tags").is_some());
    }

    #[test]
    fn range_is_reported_before_length() {
        let c = Constraints { min: Some(Bound::inclusive(10.0)), min_length: Some(5), ..constraints() };
        let error = c.check(&json!(1), Location::Query, "limit").expect("out of range");
        assert_eq!(error.kind(), FieldErrorKind::Range);
    }

    #[test]
    fn email_format() {
        let c = Constraints { format: Some(Format::Email), ..constraints() };
        assert!(c.check(&json!("alice@example.com"), Location::Body, "email").is_none());
        assert!(c.check(&json!("alice.example.com"), Location::Body, "email").is_some());
        assert!(c.check(&json!("alice@localhost"), Location::Body, "email").is_some());
    }

    #[test]
    fn regex_pattern() {
        let c = Constraints { format: Some(Format::Pattern(Regex::new("^[a-z]+$").unwrap())), ..constraints() };
        assert!(c.check(&json!("electronics"), Location::Query, "category").is_none());
        let error = c.check(&json!("Electronics"), Location::Query, "category").expect("uppercase");
        assert_eq!(error.kind(), FieldErrorKind::Pattern);
    }

    #[test]
    fn inapplicable_constraints_are_skipped() {
        let c = Constraints { min: Some(Bound::inclusive(1.0)), format: Some(Format::Email), ..constraints() };
        assert!(c.check(&json!(true), Location::Query, "in_stock").is_none());
        assert!(constraints().is_empty());
    }
}
