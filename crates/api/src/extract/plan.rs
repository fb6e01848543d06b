use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use super::body::BodyPlan;
use super::{ParamSpec, Params, QueryParams};
use crate::RequestContext;
use crate::error::{ConfigError, FieldError, Location, ValidationError};
use crate::router::PathPattern;
use crate::schema::{Field, SemanticType};

/// The classification table of one handler's or provider's parameters against one route pattern.
///
/// Built once per route when the application is built; resolving a request only walks the table.
#[derive(Debug, Clone, Default)]
pub struct ParamPlan {
    path: Vec<Field>,
    query: Vec<Field>,
    body: BodyPlan,
}

impl ParamPlan {
    pub fn classify(owner: &str, specs: &[ParamSpec], pattern: &PathPattern) -> Result<Self, ConfigError> {
        let mut seen = HashSet::with_capacity(specs.len());
        let mut plan = Self::default();
        let mut body_fields = Vec::new();
        let mut has_scalar_body_fields = false;

        for spec in specs {
            if !seen.insert(spec.name()) {
                return Err(ConfigError::DuplicateParameter { name: spec.name().to_owned(), owner: owner.to_owned() });
            }

            let field = spec.field().clone();
            if pattern.has_variable(spec.name()) {
                plan.path.push(field);
            } else if spec.is_body_override() || field.ty().is_structured() {
                has_scalar_body_fields |= !field.ty().is_structured();
                body_fields.push(field);
            } else {
                plan.query.push(field);
            }
        }

        plan.body = BodyPlan::new(body_fields, has_scalar_body_fields);
        debug!(owner, pattern = pattern.as_str(), plan = ?plan.summary(), "parameters classified");
        Ok(plan)
    }

    /// Where the parameter `name` is read from, if it is declared.
    pub fn location_of(&self, name: &str) -> Option<Location> {
        let has = |fields: &[Field]| fields.iter().any(|field| field.name() == name);
        if has(&self.path) {
            Some(Location::Path)
        } else if has(&self.query) {
            Some(Location::Query)
        } else if has(self.body.fields()) {
            Some(Location::Body)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty() && self.query.is_empty() && self.body.fields().is_empty()
    }

    /// Resolves every parameter, reporting all offending fields at once.
    pub fn resolve(&self, ctx: &RequestContext<'_>) -> Result<Params, ValidationError> {
        let mut errors = ValidationError::new();
        let params = self.resolve_into(ctx, &mut errors);
        errors.finish(params)
    }

    pub(crate) fn resolve_into(&self, ctx: &RequestContext<'_>, errors: &mut ValidationError) -> Params {
        let mut params = Params::new();
        if self.is_empty() {
            return params;
        }

        for field in &self.path {
            if ctx.path_params().is_undecodable(field.name()) {
                errors.push(FieldError::value(Location::Path, field.name(), "not valid UTF-8 once percent-decoded"));
                continue;
            }
            let value = match ctx.path_params().get(field.name()) {
                Some(raw) => field.check(&Value::from(raw), Location::Path, field.name(), errors),
                None => field.absent(Location::Path, field.name(), errors),
            };
            if let Some(value) = value {
                params.insert(field.name(), value);
            }
        }

        if !self.query.is_empty() {
            let query = QueryParams::parse(ctx.query()).unwrap_or_else(|e| {
                errors.push(FieldError::value(Location::Query, "", e));
                QueryParams::default()
            });
            for field in &self.query {
                let value = match raw_query_value(&query, field) {
                    Some(raw) => field.check(&raw, Location::Query, field.name(), errors),
                    None => field.absent(Location::Query, field.name(), errors),
                };
                if let Some(value) = value {
                    params.insert(field.name(), value);
                }
            }
        }

        self.body.resolve_into(ctx, &mut params, errors);
        params
    }

    fn summary(&self) -> Vec<(&str, Location)> {
        let mut summary = Vec::new();
        for (fields, location) in [
            (self.path.as_slice(), Location::Path),
            (self.query.as_slice(), Location::Query),
            (self.body.fields(), Location::Body),
        ] {
            summary.extend(fields.iter().map(|field| (field.name(), location)));
        }
        summary
    }
}

fn raw_query_value(query: &QueryParams, field: &Field) -> Option<Value> {
    match field.ty() {
        SemanticType::List(_) => {
            let values: Vec<Value> = query.all(field.name()).map(Value::from).collect();
            (!values.is_empty()).then_some(Value::Array(values))
        }
        _ => query.last(field.name()).map(Value::from),
    }
}
