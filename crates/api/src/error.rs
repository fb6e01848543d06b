//! Error types shared by every stage of the request pipeline.
//!
//! - [`ConfigError`] is returned by [`AppBuilder::build`](crate::AppBuilder::build) and never
//!   surfaces at request time.
//! - [`ValidationError`] collects every offending field of a request.
//! - [`ApiError`] is what handlers and providers return; each variant maps to one status code.

use std::fmt;

use http::StatusCode;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Where a request value was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Path,
    Query,
    Body,
}

impl Location {
    pub fn as_str(self) -> &'static str {
        match self {
            Location::Path => "path",
            Location::Query => "query",
            Location::Body => "body",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldErrorKind {
    Missing,
    WrongType,
    Range,
    Length,
    Pattern,
    JsonInvalid,
    Value,
}

impl FieldErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldErrorKind::Missing => "missing",
            FieldErrorKind::WrongType => "type_error",
            FieldErrorKind::Range => "range_error",
            FieldErrorKind::Length => "length_error",
            FieldErrorKind::Pattern => "pattern_mismatch",
            FieldErrorKind::JsonInvalid => "json_invalid",
            FieldErrorKind::Value => "value_error",
        }
    }
}

/// A single problem with a single input field.
///
/// `field` is a dotted path relative to `location` (`user.email`, `tags.2`); it is empty when the
/// error concerns the location as a whole, e.g. an unparsable body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    location: Location,
    field: String,
    kind: FieldErrorKind,
    message: String,
}

impl FieldError {
    pub fn new(location: Location, field: impl Into<String>, kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self { location, field: field.into(), kind, message: message.into() }
    }

    pub fn missing(location: Location, field: impl Into<String>) -> Self {
        Self::new(location, field, FieldErrorKind::Missing, "field required")
    }

    pub fn wrong_type(location: Location, field: impl Into<String>, expected: impl fmt::Display) -> Self {
        Self::new(location, field, FieldErrorKind::WrongType, format!("value is not a valid {expected}"))
    }

    pub fn json_invalid<S: ToString>(reason: S) -> Self {
        Self::new(Location::Body, "", FieldErrorKind::JsonInvalid, reason.to_string())
    }

    /// A domain-level rejection of an otherwise well-formed value, e.g. a username already taken.
    pub fn value<S: ToString>(location: Location, field: impl Into<String>, reason: S) -> Self {
        Self::new(location, field, FieldErrorKind::Value, reason.to_string())
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn kind(&self) -> FieldErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// `{"loc": ["body", "user", "email"], "msg": "...", "type": "..."}`
    pub fn to_json(&self) -> Value {
        let mut loc = vec![Value::from(self.location.as_str())];
        loc.extend(self.field.split('.').filter(|part| !part.is_empty()).map(Value::from));
        json!({ "loc": loc, "msg": self.message, "type": self.kind.as_str() })
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}: {}", self.location, self.message)
        } else {
            write!(f, "{}.{}: {}", self.location, self.field, self.message)
        }
    }
}

/// Every field error found while validating one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("request validation failed with {} error(s)", .errors.len())]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(error: FieldError) -> Self {
        Self { errors: vec![error] }
    }

    /// Records an error; an identical error reported twice (two providers reading the same query
    /// parameter) is kept once.
    pub fn push(&mut self, error: FieldError) {
        if !self.errors.contains(&error) {
            self.errors.push(error);
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns `value` when nothing was recorded, `self` otherwise.
    pub fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.errors.is_empty() { Ok(value) } else { Err(self) }
    }

    pub fn to_json(&self) -> Value {
        Value::Array(self.errors.iter().map(FieldError::to_json).collect())
    }
}

impl From<FieldError> for ValidationError {
    fn from(error: FieldError) -> Self {
        Self::single(error)
    }
}

/// Errors raised while a request is processed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("bad request: {detail}")]
    BadRequest { detail: String },

    #[error("unauthorized: {detail}")]
    Unauthorized { detail: String },

    #[error("forbidden: {detail}")]
    Forbidden { detail: String },

    #[error("not found: {detail}")]
    NotFound { detail: String },

    #[error("response does not match schema `{schema}`: {reason}")]
    ResponseMismatch { schema: String, reason: String },

    #[error("internal error: {detail}")]
    Internal { detail: String },
}

impl ApiError {
    pub fn bad_request<S: ToString>(detail: S) -> Self {
        Self::BadRequest { detail: detail.to_string() }
    }

    pub fn unauthorized<S: ToString>(detail: S) -> Self {
        Self::Unauthorized { detail: detail.to_string() }
    }

    pub fn forbidden<S: ToString>(detail: S) -> Self {
        Self::Forbidden { detail: detail.to_string() }
    }

    pub fn not_found<S: ToString>(detail: S) -> Self {
        Self::NotFound { detail: detail.to_string() }
    }

    pub fn response_mismatch<S: ToString, R: ToString>(schema: S, reason: R) -> Self {
        Self::ResponseMismatch { schema: schema.to_string(), reason: reason.to_string() }
    }

    pub fn internal<S: ToString>(detail: S) -> Self {
        Self::Internal { detail: detail.to_string() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::ResponseMismatch { .. } | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}

/// Application wiring mistakes, detected once when the [`App`](crate::App) is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("route `{method} {pattern}` is registered twice")]
    DuplicateRoute { method: String, pattern: String },

    #[error("invalid path pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("provider `{name}` is registered twice")]
    DuplicateProvider { name: String },

    #[error("`{required_by}` depends on unknown provider `{name}`")]
    UnknownDependency { name: String, required_by: String },

    #[error("dependency cycle: {cycle}")]
    DependencyCycle { cycle: String },

    #[error("`{owner}` declares parameter `{name}` more than once")]
    DuplicateParameter { name: String, owner: String },
}

impl ConfigError {
    pub fn invalid_pattern<P: ToString, R: ToString>(pattern: P, reason: R) -> Self {
        Self::InvalidPattern { pattern: pattern.to_string(), reason: reason.to_string() }
    }

    pub fn unknown_dependency<N: ToString, R: ToString>(name: N, required_by: R) -> Self {
        Self::UnknownDependency { name: name.to_string(), required_by: required_by.to_string() }
    }
}
