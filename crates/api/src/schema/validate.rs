use serde_json::{Map, Value};

use super::coerce::coerce_scalar;
use super::{Field, Schema, SemanticType};
use crate::error::{FieldError, Location, ValidationError};

impl Schema {
    /// Validates `raw` against every field, collecting all field errors.
    ///
    /// The returned object holds the declared fields only, in declaration order, with defaults
    /// filled in for absent optional fields.
    pub fn validate(&self, raw: &Value, location: Location) -> Result<Value, ValidationError> {
        let mut errors = ValidationError::new();
        let value = self.validate_into(raw, location, "", &mut errors);
        errors.finish(value)
    }

    pub(crate) fn validate_into(
        &self,
        raw: &Value,
        location: Location,
        prefix: &str,
        errors: &mut ValidationError,
    ) -> Value {
        let Some(object) = raw.as_object() else {
            errors.push(FieldError::wrong_type(location, prefix, format_args!("object `{}`", self.name)));
            return Value::Null;
        };

        let mut out = Map::with_capacity(self.fields.len());
        for field in &self.fields {
            let path = join(prefix, field.name());
            let value = match object.get(field.name()) {
                Some(value) => field.check(value, location, &path, errors),
                None => field.absent(location, &path, errors),
            };
            if let Some(value) = value {
                out.insert(field.name().to_owned(), value);
            }
        }
        Value::Object(out)
    }
}

impl Field {
    /// Coerces `raw` and applies the constraints.
    ///
    /// Returns `None` when an error was recorded; a value that fails coercion is not checked
    /// against the constraints.
    pub(crate) fn check(
        &self,
        raw: &Value,
        location: Location,
        path: &str,
        errors: &mut ValidationError,
    ) -> Option<Value> {
        if raw.is_null() {
            if matches!(self.default, Some(Value::Null)) {
                return Some(Value::Null);
            }
            errors.push(FieldError::wrong_type(location, path, &self.ty));
            return None;
        }

        let value = coerce(raw, &self.ty, location, path, errors)?;
        match self.constraints.check(&value, location, path) {
            Some(error) => {
                errors.push(error);
                None
            }
            None => Some(value),
        }
    }

    /// The value of a field missing from the input: its default, or a `missing` error.
    pub(crate) fn absent(&self, location: Location, path: &str, errors: &mut ValidationError) -> Option<Value> {
        if self.default.is_none() {
            errors.push(FieldError::missing(location, path));
        }
        self.default.clone()
    }
}

fn coerce(
    raw: &Value,
    ty: &SemanticType,
    location: Location,
    path: &str,
    errors: &mut ValidationError,
) -> Option<Value> {
    match ty {
        SemanticType::Object(schema) => {
            let before = errors.len();
            let value = schema.validate_into(raw, location, path, errors);
            (errors.len() == before).then_some(value)
        }
        SemanticType::List(item) => {
            let Some(items) = raw.as_array() else {
                errors.push(FieldError::wrong_type(location, path, ty));
                return None;
            };
            let before = errors.len();
            let coerced: Vec<_> = items
                .iter()
                .enumerate()
                .filter_map(|(i, raw_item)| coerce(raw_item, item, location, &join(path, &i.to_string()), errors))
                .collect();
            (errors.len() == before).then_some(Value::Array(coerced))
        }
        scalar => coerce_scalar(raw, scalar).or_else(|| {
            errors.push(FieldError::wrong_type(location, path, scalar));
            None
        }),
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() { name.to_owned() } else { format!("{prefix}.{name}") }
}
