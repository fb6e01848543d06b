//! Parameter resolution: turning a raw request into named, typed handler inputs.
//!
//! Every declared [`ParamSpec`] is classified once, when the application is built:
//!
//! - **path** if its name is a variable segment of the route pattern,
//! - otherwise **body** if its type is a structured schema type (or it was declared with
//!   [`ParamSpec::body`]),
//! - otherwise **query**.
//!
//! # Example
//! ```
//! use micro_api::extract::ParamSpec;
//! use micro_api::schema::{Field, Schema};
//!
//! let user = Schema::new("User").field(Field::string("username"));
//!
//! // path, because the route is `/mixed/{user_id}`
//! let user_id: ParamSpec = Field::integer("user_id").into();
//! // body, because its type is a schema
//! let body: ParamSpec = Field::object("user", user).into();
//! // query, with a default
//! let token: ParamSpec = Field::string("token").with_default("default-token").into();
//! // a scalar read from the body document
//! let age = ParamSpec::body(Field::integer("age"));
//! # let _ = (user_id, body, token, age);
//! ```

mod body;
mod plan;
mod query;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::schema::Field;

pub use plan::ParamPlan;
pub use query::QueryParams;

/// A declared handler or provider input.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    field: Field,
    embed_in_body: bool,
}

impl ParamSpec {
    /// Declares a scalar that is read from the JSON body under its own name.
    pub fn body(field: Field) -> Self {
        Self { field, embed_in_body: true }
    }

    pub fn name(&self) -> &str {
        self.field.name()
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn is_body_override(&self) -> bool {
        self.embed_in_body
    }
}

impl From<Field> for ParamSpec {
    fn from(field: Field) -> Self {
        Self { field, embed_in_body: false }
    }
}

/// Resolved parameter values, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: Map<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Deserializes the parameter `name` into `T`.
    ///
    /// Fails with [`ApiError::Internal`] when the parameter was not declared or does not fit `T`:
    /// both mean the handler and its declaration disagree.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ApiError> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| ApiError::internal(format!("parameter `{name}` was not declared")))?;
        T::deserialize(value).map_err(|e| ApiError::internal(format!("parameter `{name}`: {e}")))
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }
}

impl FromIterator<(String, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}
