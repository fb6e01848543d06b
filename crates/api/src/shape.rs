//! Response shaping: projecting a handler's output onto its declared output schema.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::schema::{Schema, SemanticType};

/// The declared shape of a route's successful response.
#[derive(Debug, Clone)]
pub enum ResponseSchema {
    Object(Arc<Schema>),
    List(Arc<Schema>),
}

impl ResponseSchema {
    pub fn object(schema: impl Into<Arc<Schema>>) -> Self {
        Self::Object(schema.into())
    }

    /// Every element of the response array has the shape of `schema`.
    pub fn list(schema: impl Into<Arc<Schema>>) -> Self {
        Self::List(schema.into())
    }

    pub fn schema(&self) -> &Schema {
        match self {
            Self::Object(schema) | Self::List(schema) => schema,
        }
    }

    /// Keeps exactly the declared fields, in declared order, recursively.
    ///
    /// Undeclared fields are dropped. A declared field missing from `output` is an
    /// [`ApiError::ResponseMismatch`], whether or not the field is optional.
    pub fn shape(&self, output: Value) -> Result<Value, ApiError> {
        let shaped = match self {
            Self::Object(schema) => project(schema, &output, ""),
            Self::List(schema) => match &output {
                Value::Array(items) => items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| project(schema, item, &index.to_string()))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
                _ => Err("expected an array".to_owned()),
            },
        };
        shaped.map_err(|reason| ApiError::response_mismatch(self.schema().name(), reason))
    }
}

impl From<Schema> for ResponseSchema {
    fn from(schema: Schema) -> Self {
        Self::object(schema)
    }
}

fn project(schema: &Schema, value: &Value, path: &str) -> Result<Value, String> {
    let Value::Object(object) = value else {
        return Err(format!("expected an object at `{}`", display(path)));
    };

    let mut shaped = Map::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let path = join(path, field.name());
        let raw = object.get(field.name()).ok_or_else(|| format!("missing field `{path}`"))?;
        shaped.insert(field.name().to_owned(), project_type(field.ty(), raw, &path)?);
    }
    Ok(Value::Object(shaped))
}

fn project_type(ty: &SemanticType, value: &Value, path: &str) -> Result<Value, String> {
    match (ty, value) {
        (_, Value::Null) => Ok(Value::Null),
        (SemanticType::Object(schema), _) => project(schema, value, path),
        (SemanticType::List(item), Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, element)| project_type(item, element, &join(path, &index.to_string())))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (SemanticType::List(_), _) => Err(format!("expected an array at `{path}`")),
        _ => Ok(value.clone()),
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() { name.to_owned() } else { format!("{prefix}.{name}") }
}

fn display(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use serde_json::json;

    fn user_output() -> Schema {
        Schema::new("UserOutput")
            .field(Field::integer("id"))
            .field(Field::string("username"))
            .field(Field::string("email"))
            .field(Field::string("full_name").optional())
    }

    #[test]
    fn undeclared_fields_are_dropped() {
        let stored = json!({
            "password": "secret",
            "email": "alice@example.com",
            "id": 1,
            "username": "alice",
            "full_name": null,
        });
        let shaped = ResponseSchema::from(user_output()).shape(stored).unwrap();
        assert_eq!(shaped, json!({ "id": 1, "username": "alice", "email": "alice@example.com", "full_name": null }));
        assert!(shaped.get("password").is_none());

        let keys: Vec<_> = shaped.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["id", "username", "email", "full_name"]);
    }

    #[test]
    fn missing_declared_field_is_a_mismatch() {
        let error = ResponseSchema::from(user_output()).shape(json!({ "id": 1, "username": "alice" })).unwrap_err();
        let ApiError::ResponseMismatch { schema, reason } = error else { panic!("expected a mismatch") };
        assert_eq!(schema, "UserOutput");
        assert_eq!(reason, "missing field `email`");
    }

    #[test]
    fn list_shapes_each_element() {
        let users = json!([
            { "id": 1, "username": "a", "email": "a@x.io", "full_name": "A", "password": "p" },
            { "id": 2, "username": "b", "email": "b@x.io", "full_name": null, "is_active": true },
        ]);
        let shaped = ResponseSchema::list(user_output()).shape(users).unwrap();
        assert_eq!(
            shaped,
            json!([
                { "id": 1, "username": "a", "email": "a@x.io", "full_name": "A" },
                { "id": 2, "username": "b", "email": "b@x.io", "full_name": null },
            ])
        );

        let error = ResponseSchema::list(user_output()).shape(json!({ "id": 1 })).unwrap_err();
        assert!(matches!(error, ApiError::ResponseMismatch { .. }));
    }

    #[test]
    fn nested_objects_are_shaped_recursively() {
        let owner = Schema::new("Owner").field(Field::string("username"));
        let item = Schema::new("Item")
            .field(Field::string("name"))
            .field(Field::object("owner", owner))
            .field(Field::list("tags", SemanticType::String));

        let shaped = ResponseSchema::from(item.clone())
            .shape(json!({
                "name": "Laptop",
                "owner": { "username": "alice", "password": "secret" },
                "tags": ["tech"],
                "cost": 3,
            }))
            .unwrap();
        assert_eq!(shaped, json!({ "name": "Laptop", "owner": { "username": "alice" }, "tags": ["tech"] }));

        let error = ResponseSchema::from(item).shape(json!({ "name": "x", "owner": {}, "tags": [] })).unwrap_err();
        let ApiError::ResponseMismatch { reason, .. } = error else { panic!("expected a mismatch") };
        assert_eq!(reason, "missing field `owner.username`");
    }
}
