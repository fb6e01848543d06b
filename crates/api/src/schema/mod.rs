//! Declared, ordered field lists used both to validate input and to shape output.
//!
//! A [`Schema`] is flat: a schema that "inherits" from another one is built by copying the base
//! field list with [`Schema::extend`] and appending to it.
//!
//! ```
//! use micro_api::schema::{Field, Schema};
//!
//! let base = Schema::new("UserBase")
//!     .field(Field::string("username").min_length(3).max_length(50))
//!     .field(Field::string("email").email())
//!     .field(Field::boolean("is_active").with_default(true));
//!
//! let response = Schema::extend(&base, "UserResponse").field(Field::integer("id"));
//! assert_eq!(response.fields().len(), 4);
//! ```

mod coerce;
mod constraint;
mod validate;

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

pub use constraint::{Bound, Constraints, Format};

/// The type a raw value is coerced into.
#[derive(Debug, Clone)]
pub enum SemanticType {
    Integer,
    Float,
    Boolean,
    String,
    List(Box<SemanticType>),
    Object(Arc<Schema>),
}

impl SemanticType {
    pub fn list(item: SemanticType) -> Self {
        SemanticType::List(Box::new(item))
    }

    pub fn object(schema: impl Into<Arc<Schema>>) -> Self {
        SemanticType::Object(schema.into())
    }

    /// Structured types are read from the request body unless the route pattern claims the name.
    pub fn is_structured(&self) -> bool {
        matches!(self, SemanticType::Object(_))
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Integer => f.write_str("integer"),
            SemanticType::Float => f.write_str("number"),
            SemanticType::Boolean => f.write_str("boolean"),
            SemanticType::String => f.write_str("string"),
            SemanticType::List(_) => f.write_str("array"),
            SemanticType::Object(schema) => write!(f, "object `{}`", schema.name()),
        }
    }
}

impl From<Schema> for SemanticType {
    fn from(schema: Schema) -> Self {
        SemanticType::Object(Arc::new(schema))
    }
}

/// One named, typed field.
///
/// A field without a default is required. [`Field::optional`] declares `null` as the default,
/// which also allows an explicit `null` in the input.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    ty: SemanticType,
    default: Option<Value>,
    constraints: Constraints,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: SemanticType) -> Self {
        Self { name: name.into(), ty, default: None, constraints: Constraints::default() }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, SemanticType::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, SemanticType::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, SemanticType::Boolean)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, SemanticType::String)
    }

    pub fn list(name: impl Into<String>, item: SemanticType) -> Self {
        Self::new(name, SemanticType::list(item))
    }

    pub fn object(name: impl Into<String>, schema: impl Into<Arc<Schema>>) -> Self {
        Self::new(name, SemanticType::object(schema))
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn optional(self) -> Self {
        self.with_default(Value::Null)
    }

    #[must_use]
    pub fn ge(mut self, limit: f64) -> Self {
        self.constraints.min = Some(Bound::inclusive(limit));
        self
    }

    #[must_use]
    pub fn gt(mut self, limit: f64) -> Self {
        self.constraints.min = Some(Bound::exclusive(limit));
        self
    }

    #[must_use]
    pub fn le(mut self, limit: f64) -> Self {
        self.constraints.max = Some(Bound::inclusive(limit));
        self
    }

    #[must_use]
    pub fn lt(mut self, limit: f64) -> Self {
        self.constraints.max = Some(Bound::exclusive(limit));
        self
    }

    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        self.constraints.min_length = Some(len);
        self
    }

    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        self.constraints.max_length = Some(len);
        self
    }

    #[must_use]
    pub fn email(mut self) -> Self {
        self.constraints.format = Some(Format::Email);
        self
    }

    #[must_use]
    pub fn pattern(mut self, regex: Regex) -> Self {
        self.constraints.format = Some(Format::Pattern(regex));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &SemanticType {
        &self.ty
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }

    /// Starts a new schema from a copy of `base`'s fields.
    pub fn extend(base: &Schema, name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: base.fields.clone() }
    }

    /// Appends `field`, or replaces a field of the same name in place.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        match self.fields.iter_mut().find(|existing| existing.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    #[must_use]
    pub fn without(mut self, name: &str) -> Self {
        self.fields.retain(|field| field.name != name);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_named(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_base() -> Schema {
        Schema::new("UserBase")
            .field(Field::string("username").min_length(3))
            .field(Field::string("email").email())
            .field(Field::string("full_name").optional())
    }

    #[test]
    fn extend_copies_fields_in_order() {
        let response = Schema::extend(&user_base(), "UserResponse").field(Field::integer("id"));
        let names: Vec<_> = response.fields().iter().map(Field::name).collect();
        assert_eq!(names, ["username", "email", "full_name", "id"]);
        assert_eq!(response.name(), "UserResponse");
    }

    #[test]
    fn redeclared_field_replaces_the_inherited_one() {
        let schema = Schema::extend(&user_base(), "Strict").field(Field::string("full_name").min_length(1));
        assert_eq!(schema.fields().len(), 3);
        assert!(schema.field_named("full_name").is_some_and(Field::is_required));
    }

    #[test]
    fn without_drops_a_field() {
        let schema = user_base().without("email");
        assert!(schema.field_named("email").is_none());
    }

    #[test]
    fn only_objects_are_structured() {
        assert!(SemanticType::from(user_base()).is_structured());
        assert!(!SemanticType::list(SemanticType::String).is_structured());
        assert_eq!(SemanticType::Float.to_string(), "number");
    }
}
