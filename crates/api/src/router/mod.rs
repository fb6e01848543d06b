//! Route registration and dispatch.
//!
//! Routes are matched strictly in registration order and the first match wins. There is no
//! specificity ranking: a literal route such as `/products/latest` must be registered before
//! `/products/{product_id}`, otherwise the variable route shadows it.

mod pattern;

use std::fmt;

use http::{Method, StatusCode};
use tracing::debug;

use crate::dependency::{DependencyGraph, NodeId, ProviderParams};
use crate::error::{ConfigError, ValidationError};
use crate::extract::{ParamPlan, ParamSpec, Params};
use crate::handler::Handler;
use crate::shape::ResponseSchema;
use crate::{PathParams, RequestContext};

pub use pattern::{PathPattern, Segment};

/// A registered route: immutable once the application is built.
pub struct Route {
    method: Method,
    pattern: PathPattern,
    handler: Box<dyn Handler>,
    params: ParamPlan,
    dependencies: Vec<NodeId>,
    provider_plans: Vec<(NodeId, ParamPlan)>,
    response: Option<ResponseSchema>,
    status: StatusCode,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .field("dependencies", &self.dependencies)
            .field("response", &self.response)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Route {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }

    pub fn params(&self) -> &ParamPlan {
        &self.params
    }

    pub fn response(&self) -> Option<&ResponseSchema> {
        self.response.as_ref()
    }

    /// The status of a successful response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub(crate) fn dependencies(&self) -> &[NodeId] {
        &self.dependencies
    }

    /// Resolves the parameters of the handler and of every provider reachable from it, so that a
    /// single [`ValidationError`] names every offending field.
    pub(crate) fn resolve_inputs(&self, ctx: &RequestContext<'_>) -> Result<(Params, ProviderParams), ValidationError> {
        let mut errors = ValidationError::new();
        let handler = self.params.resolve_into(ctx, &mut errors);
        let providers: ProviderParams =
            self.provider_plans.iter().map(|(id, plan)| (*id, plan.resolve_into(ctx, &mut errors))).collect();
        errors.finish((handler, providers))
    }
}

/// Route table, in registration order.
#[derive(Debug)]
pub struct Router {
    routes: Vec<Route>,
}

/// Result of matching a request to a route
#[derive(Debug)]
pub struct RouteMatch<'router> {
    route: &'router Route,
    params: PathParams,
}

impl Router {
    pub(crate) fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Finds the first route, in registration order, whose method and pattern match.
    pub fn dispatch<'router>(&'router self, method: &Method, path: &str) -> Option<RouteMatch<'router>> {
        let matched = self
            .routes
            .iter()
            .filter(|route| route.method == method)
            .find_map(|route| route.pattern.matches(path).map(|params| RouteMatch { route, params }));
        if matched.is_none() {
            debug!(%method, path, "no route matched");
        }
        matched
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<'router> RouteMatch<'router> {
    pub fn route(&self) -> &'router Route {
        self.route
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn into_parts(self) -> (&'router Route, PathParams) {
        (self.route, self.params)
    }
}

pub struct RouteBuilder {
    method: Method,
    handler: Box<dyn Handler>,
    params: Vec<ParamSpec>,
    dependencies: Vec<String>,
    response: Option<ResponseSchema>,
    status: StatusCode,
}

impl fmt::Debug for RouteBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteBuilder")
            .field("method", &self.method)
            .field("params", &self.params)
            .field("dependencies", &self.dependencies)
            .field("response", &self.response)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl RouteBuilder {
    fn new(method: Method, handler: Box<dyn Handler>) -> Self {
        Self { method, handler, params: Vec::new(), dependencies: Vec::new(), response: None, status: StatusCode::OK }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn param(mut self, param: impl Into<ParamSpec>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Declares a dependency on the provider registered under `name`.
    #[must_use]
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    #[must_use]
    pub fn response(mut self, schema: impl Into<ResponseSchema>) -> Self {
        self.response = Some(schema.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub(crate) fn build(self, pattern: &str, graph: &DependencyGraph) -> Result<Route, ConfigError> {
        let pattern = PathPattern::parse(pattern)?;
        let owner = format!("{} {}", self.method, pattern);

        let params = ParamPlan::classify(&owner, &self.params, &pattern)?;
        let dependencies =
            self.dependencies.iter().map(|name| graph.lookup(name, &owner)).collect::<Result<Vec<_>, _>>()?;

        // provider parameters are classified against this route's pattern too
        let provider_plans = graph
            .reachable(&dependencies)
            .into_iter()
            .map(|id| {
                let node = graph.node(id);
                ParamPlan::classify(node.name(), node.params(), &pattern).map(|plan| (id, plan))
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(route = %owner, providers = provider_plans.len(), "route compiled");

        Ok(Route {
            method: self.method,
            pattern,
            handler: self.handler,
            params,
            dependencies,
            provider_plans,
            response: self.response,
            status: self.status,
        })
    }
}

macro_rules! method_route {
    ($method:ident, $upper_case_method:ident) => {
        #[doc = concat!("Starts a route answering HTTP ", stringify!($upper_case_method), " requests.")]
        pub fn $method<H: Handler + 'static>(handler: H) -> RouteBuilder {
            RouteBuilder::new(Method::$upper_case_method, Box::new(handler))
        }
    };
}

method_route!(get, GET);
method_route!(post, POST);
method_route!(put, PUT);
method_route!(delete, DELETE);
method_route!(patch, PATCH);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::handler::{Inputs, handler_fn};
    use crate::schema::Field;

    async fn latest(_inputs: Inputs) -> Result<&'static str, ApiError> {
        Ok("latest")
    }

    async fn by_id(_inputs: Inputs) -> Result<&'static str, ApiError> {
        Ok("by_id")
    }

    fn router(routes: Vec<(&str, RouteBuilder)>) -> Router {
        let graph = DependencyGraph::build(Vec::new()).unwrap();
        Router::new(routes.into_iter().map(|(pattern, builder)| builder.build(pattern, &graph).unwrap()).collect())
    }

    fn product_id() -> Field {
        Field::integer("product_id")
    }

    #[test]
    fn literal_registered_first_wins() {
        let router = router(vec![
            ("/products/latest", get(handler_fn(latest))),
            ("/products/{product_id}", get(handler_fn(by_id)).param(product_id())),
        ]);

        let matched = router.dispatch(&Method::GET, "/products/latest").unwrap();
        assert_eq!(matched.route().pattern().as_str(), "/products/latest");
        assert!(matched.params().is_empty());

        let matched = router.dispatch(&Method::GET, "/products/42").unwrap();
        assert_eq!(matched.route().pattern().as_str(), "/products/{product_id}");
        assert_eq!(matched.params().get("product_id"), Some("42"));
    }

    #[test]
    fn variable_registered_first_shadows_the_literal() {
        let router = router(vec![
            ("/products/{product_id}", get(handler_fn(by_id)).param(product_id())),
            ("/products/latest", get(handler_fn(latest))),
        ]);

        let matched = router.dispatch(&Method::GET, "/products/latest").unwrap();
        assert_eq!(matched.route().pattern().as_str(), "/products/{product_id}");
        assert_eq!(matched.params().get("product_id"), Some("latest"));
    }

    #[test]
    fn method_must_match() {
        let router = router(vec![("/items", get(handler_fn(latest))), ("/items", post(handler_fn(by_id)))]);
        assert_eq!(router.dispatch(&Method::POST, "/items").unwrap().route().method(), Method::POST);
        assert!(router.dispatch(&Method::DELETE, "/items").is_none());
    }

    #[test]
    fn no_match() {
        let router = router(vec![("/users/{user_id}", get(handler_fn(by_id)))]);
        assert!(router.dispatch(&Method::GET, "/users").is_none());
        assert!(router.dispatch(&Method::GET, "/users/1/profile").is_none());
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let graph = DependencyGraph::build(Vec::new()).unwrap();
        let error = get(handler_fn(latest)).depends_on("db").build("/me", &graph).err().unwrap();
        assert_eq!(error, ConfigError::unknown_dependency("db", "GET /me"));
    }
}
