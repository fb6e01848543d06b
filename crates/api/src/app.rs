use std::collections::HashSet;

use bytes::Bytes;
use http::{Request, Response};
use tracing::{error, info, warn};

use crate::dependency::{DependencyGraph, Provider, RequestScope, resolve_all};
use crate::error::{ApiError, ConfigError};
use crate::handler::Inputs;
use crate::responder::{Reply, Responder};
use crate::router::{Route, RouteBuilder, Router};
use crate::RequestContext;

/// Collects providers and routes; [`AppBuilder::build`] validates the whole wiring at once.
#[derive(Debug, Default)]
pub struct AppBuilder {
    providers: Vec<Provider>,
    routes: Vec<(String, RouteBuilder)>,
}

impl AppBuilder {
    fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn provide(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Registers a route. Routes are matched in the order they are registered.
    #[must_use]
    pub fn route(mut self, pattern: impl Into<String>, route: RouteBuilder) -> Self {
        self.routes.push((pattern.into(), route));
        self
    }

    pub fn build(self) -> Result<App, ConfigError> {
        let graph = DependencyGraph::build(self.providers)?;

        let mut registered = HashSet::with_capacity(self.routes.len());
        let routes = self
            .routes
            .into_iter()
            .map(|(pattern, builder)| {
                let route = builder.build(&pattern, &graph)?;
                // `/users/{id}` and `/users/{user_id}` accept the same paths
                if !registered.insert((route.method().clone(), route.pattern().shape())) {
                    return Err(ConfigError::DuplicateRoute { method: route.method().to_string(), pattern });
                }
                Ok(route)
            })
            .collect::<Result<Vec<Route>, _>>()?;

        info!(routes = routes.len(), providers = graph.len(), "application built");
        Ok(App { router: Router::new(routes), graph })
    }
}

/// A built application: immutable, and safe to share across concurrently handled requests.
#[derive(Debug)]
pub struct App {
    router: Router,
    graph: DependencyGraph,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Runs one request through the pipeline: dispatch, parameter resolution, dependency
    /// resolution, the handler, then response shaping.
    pub async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let (head, body) = request.into_parts();
        let method = &head.method;
        let path = head.uri.path();

        let result = match self.router.dispatch(method, path) {
            Some(matched) => {
                let (route, path_params) = matched.into_parts();
                let ctx = RequestContext::new(&head, path_params, body);
                self.process(route, &ctx).await
            }
            None => Err(ApiError::not_found("Not Found")),
        };

        match &result {
            Ok(reply) => info!(%method, path, status = %reply.status(), "request handled"),
            Err(e) if e.is_server_error() => error!(%method, path, cause = %e, "request failed"),
            Err(e) => warn!(%method, path, status = %e.status(), cause = %e, "request rejected"),
        }
        result.into_response()
    }

    async fn process(&self, route: &Route, ctx: &RequestContext<'_>) -> Result<Reply, ApiError> {
        let (params, mut provider_params) = route.resolve_inputs(ctx)?;

        let mut scope = RequestScope::new();
        let deps = match resolve_all(&self.graph, route.dependencies(), &mut provider_params, &mut scope).await {
            Ok(deps) => deps,
            Err(e) => {
                scope.close();
                return Err(e);
            }
        };
        let output = route.handler().invoke(Inputs { params, deps }).await;
        scope.close();

        let output = output?;
        let body = match route.response() {
            Some(schema) => schema.shape(output)?,
            None => output,
        };
        Ok(Reply::new(route.status(), body))
    }
}
