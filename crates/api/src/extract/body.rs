//! JSON request body extraction.

use mime::Mime;
use serde_json::Value;

use super::Params;
use crate::RequestContext;
use crate::error::{FieldError, Location, ValidationError};
use crate::schema::Field;

/// How the body document maps onto body parameters.
#[derive(Debug, Clone, Default)]
pub(crate) enum BodyPlan {
    #[default]
    None,
    /// A single structured parameter receives the whole document.
    Whole(Field),
    /// Each parameter is read from the top-level object under its own name.
    Embedded(Vec<Field>),
}

impl BodyPlan {
    pub(crate) fn new(mut fields: Vec<Field>, has_scalar_fields: bool) -> Self {
        match fields.len() {
            0 => BodyPlan::None,
            1 if !has_scalar_fields => BodyPlan::Whole(fields.remove(0)),
            _ => BodyPlan::Embedded(fields),
        }
    }

    pub(crate) fn fields(&self) -> &[Field] {
        match self {
            BodyPlan::None => &[],
            BodyPlan::Whole(field) => std::slice::from_ref(field),
            BodyPlan::Embedded(fields) => fields,
        }
    }

    pub(crate) fn resolve_into(&self, ctx: &RequestContext<'_>, params: &mut Params, errors: &mut ValidationError) {
        if matches!(self, BodyPlan::None) {
            return;
        }

        let document = match parse(ctx) {
            Ok(document) => document,
            Err(error) => {
                errors.push(error);
                return;
            }
        };

        match self {
            BodyPlan::None => {}
            BodyPlan::Whole(field) => {
                let value = match &document {
                    Some(document) => field.check(document, Location::Body, "", errors),
                    None => field.absent(Location::Body, "", errors),
                };
                if let Some(value) = value {
                    params.insert(field.name(), value);
                }
            }
            BodyPlan::Embedded(fields) => {
                let object = match &document {
                    Some(Value::Object(object)) => Some(object),
                    Some(_) => {
                        errors.push(FieldError::wrong_type(Location::Body, "", "object"));
                        return;
                    }
                    None => None,
                };
                for field in fields {
                    let value = match object.and_then(|object| object.get(field.name())) {
                        Some(raw) => field.check(raw, Location::Body, field.name(), errors),
                        None => field.absent(Location::Body, field.name(), errors),
                    };
                    if let Some(value) = value {
                        params.insert(field.name(), value);
                    }
                }
            }
        }
    }
}

/// An empty body is "no document"; anything else must be JSON.
fn parse(ctx: &RequestContext<'_>) -> Result<Option<Value>, FieldError> {
    if ctx.body().is_empty() {
        return Ok(None);
    }
    if let Some(content_type) = ctx.content_type().filter(|content_type| !is_json(content_type)) {
        return Err(FieldError::json_invalid(format!(
            "expected an application/json body, got `{}`",
            content_type.essence_str()
        )));
    }
    serde_json::from_slice(ctx.body()).map(Some).map_err(|e| FieldError::json_invalid(format!("invalid JSON body: {e}")))
}

fn is_json(content_type: &Mime) -> bool {
    content_type.subtype() == mime::JSON || content_type.suffix() == Some(mime::JSON)
}
