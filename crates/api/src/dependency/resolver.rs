use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use super::graph::{DependencyGraph, NodeId};
use super::provider::{Instance, Provided, ProviderInput};
use super::scope::RequestScope;
use crate::error::ApiError;
use crate::extract::Params;

/// The resolved parameters of every provider a route reaches, keyed by node.
pub(crate) type ProviderParams = HashMap<NodeId, Params>;

/// Resolved dependency values, keyed by provider name.
#[derive(Clone, Default)]
pub struct Resolved {
    values: HashMap<String, Instance>,
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

impl Resolved {
    /// Returns the value of the dependency `name` as `T`.
    ///
    /// Fails with [`ApiError::Internal`] when the dependency was not declared or is not a `T`.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ApiError> {
        let instance = self
            .values
            .get(name)
            .ok_or_else(|| ApiError::internal(format!("dependency `{name}` was not declared")))?;
        Arc::clone(instance)
            .downcast::<T>()
            .map_err(|_| ApiError::internal(format!("dependency `{name}` is not a `{}`", type_name::<T>())))
    }

    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn insert(&mut self, name: &str, value: Instance) {
        self.values.insert(name.to_owned(), value);
    }
}

/// Resolves `roots` in declared order, one after another.
///
/// On failure the error is returned as is; scoped resources acquired so far stay registered in
/// `scope` and are released when it is closed or dropped.
pub(crate) async fn resolve_all(
    graph: &DependencyGraph,
    roots: &[NodeId],
    params: &mut ProviderParams,
    scope: &mut RequestScope,
) -> Result<Resolved, ApiError> {
    let mut resolved = Resolved::default();
    for &root in roots {
        let value = resolve(graph, root, params, scope).await?;
        resolved.insert(graph.node(root).name(), value);
    }
    Ok(resolved)
}

fn resolve<'s, 'g: 's>(
    graph: &'g DependencyGraph,
    id: NodeId,
    params: &'s mut ProviderParams,
    scope: &'s mut RequestScope,
) -> BoxFuture<'s, Result<Instance, ApiError>> {
    Box::pin(async move {
        let node = graph.node(id);
        if let Some(value) = scope.cached(id) {
            debug!(provider = node.name(), "dependency served from the request cache");
            return Ok(value);
        }

        let mut deps = Resolved::default();
        for &dependency in node.dependencies() {
            let value = resolve(graph, dependency, &mut *params, &mut *scope).await?;
            deps.insert(graph.node(dependency).name(), value);
        }

        debug!(provider = node.name(), "invoking provider");
        let own = params.remove(&id).unwrap_or_default();
        let value = match node.provide().provide(ProviderInput::new(own, deps)).await? {
            Provided::Value(value) => value,
            Provided::Scoped { value, teardown } => {
                scope.defer(node.name(), teardown);
                value
            }
        };
        scope.store(id, Arc::clone(&value));
        Ok(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::{Provider, Scoped, provider_fn, scoped_fn};
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<String>>>;

    fn scoped(name: &'static str, dependencies: &[&str], log: &Log) -> Provider {
        let log = log.clone();
        let provider = Provider::new(
            name,
            scoped_fn(move |_input: ProviderInput| {
                let log = log.clone();
                async move {
                    log.lock().unwrap().push(format!("open {name}"));
                    Ok::<_, ApiError>(Scoped::new(name, move || log.lock().unwrap().push(format!("close {name}"))))
                }
            }),
        );
        dependencies.iter().fold(provider, |provider, dependency| provider.depends_on(*dependency))
    }

    fn roots(graph: &DependencyGraph, names: &[&str]) -> Vec<NodeId> {
        names.iter().map(|name| graph.lookup(name, "test").unwrap()).collect()
    }

    #[tokio::test]
    async fn chained_scoped_resources_are_released_in_reverse() {
        let log = Log::default();
        let graph =
            DependencyGraph::build(vec![scoped("a", &[], &log), scoped("b", &["a"], &log), scoped("c", &["b"], &log)])
                .unwrap();

        let mut scope = RequestScope::new();
        let resolved = resolve_all(&graph, &roots(&graph, &["c"]), &mut ProviderParams::new(), &mut scope).await.unwrap();
        assert_eq!(*resolved.get::<&str>("c").unwrap(), "c");
        assert_eq!(scope.pending(), 3);

        scope.close();
        assert_eq!(*log.lock().unwrap(), ["open a", "open b", "open c", "close c", "close b", "close a"]);
    }

    #[tokio::test]
    async fn shared_dependency_runs_once_per_request() {
        struct Token;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let shared = Provider::new(
            "shared",
            provider_fn(move |_input: ProviderInput| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, ApiError>(Token) }
            }),
        );
        let consumer = |name: &str| {
            Provider::new(name, provider_fn(|input: ProviderInput| async move { input.deps().get::<Token>("shared") }))
                .depends_on("shared")
        };
        let graph = DependencyGraph::build(vec![shared, consumer("left"), consumer("right")]).unwrap();

        let mut scope = RequestScope::new();
        let resolved = resolve_all(&graph, &roots(&graph, &["left", "right", "shared"]), &mut ProviderParams::new(), &mut scope)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let shared = resolved.get::<Token>("shared").unwrap();
        let left = resolved.get::<Arc<Token>>("left").unwrap();
        let right = resolved.get::<Arc<Token>>("right").unwrap();
        assert!(Arc::ptr_eq(&*left, &shared));
        assert!(Arc::ptr_eq(&*right, &shared));
    }

    #[tokio::test]
    async fn provider_receives_its_own_parameters() {
        let pagination = Provider::new(
            "pagination",
            provider_fn(|input: ProviderInput| async move {
                Ok::<_, ApiError>((input.params().get::<u32>("skip")?, input.params().get::<u32>("limit")?))
            }),
        );
        let graph = DependencyGraph::build(vec![pagination]).unwrap();
        let id = graph.lookup("pagination", "test").unwrap();
        let params: Params = [("skip".to_owned(), json!(10)), ("limit".to_owned(), json!(5))].into_iter().collect();

        let mut scope = RequestScope::new();
        let resolved = resolve_all(&graph, &[id], &mut ProviderParams::from([(id, params)]), &mut scope).await.unwrap();
        assert_eq!(*resolved.get::<(u32, u32)>("pagination").unwrap(), (10, 5));
    }

    #[tokio::test]
    async fn failing_provider_short_circuits_and_releases_what_was_acquired() {
        let log = Log::default();
        let failing = Provider::new(
            "current_user",
            provider_fn(|_input: ProviderInput| async { Err::<(), _>(ApiError::unauthorized("Invalid token")) }),
        )
        .depends_on("b");
        let graph = DependencyGraph::build(vec![scoped("a", &[], &log), scoped("b", &["a"], &log), failing]).unwrap();

        let mut scope = RequestScope::new();
        let error = resolve_all(&graph, &roots(&graph, &["current_user"]), &mut ProviderParams::new(), &mut scope)
            .await
            .err()
            .unwrap();
        assert!(matches!(error, ApiError::Unauthorized { .. }));

        drop(scope);
        assert_eq!(*log.lock().unwrap(), ["open a", "open b", "close b", "close a"]);
    }

    #[tokio::test]
    async fn cancelled_request_releases_its_resources() {
        let log = Log::default();
        let slow = Provider::new(
            "slow",
            provider_fn(|_input: ProviderInput| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok::<_, ApiError>(())
            }),
        )
        .depends_on("a");
        let graph = DependencyGraph::build(vec![scoped("a", &[], &log), slow]).unwrap();
        let roots = roots(&graph, &["slow"]);

        let request = async {
            let mut scope = RequestScope::new();
            resolve_all(&graph, &roots, &mut ProviderParams::new(), &mut scope).await
        };
        assert!(tokio::time::timeout(Duration::from_millis(20), request).await.is_err());
        assert_eq!(*log.lock().unwrap(), ["open a", "close a"]);
    }

    #[test]
    fn typed_access_reports_mismatches() {
        let mut resolved = Resolved::default();
        resolved.insert("db", Arc::new(1_u64));
        assert_eq!(*resolved.get::<u64>("db").unwrap(), 1);
        assert!(matches!(resolved.get::<String>("db"), Err(ApiError::Internal { .. })));
        assert!(matches!(resolved.get::<u64>("cache"), Err(ApiError::Internal { .. })));
    }
}
