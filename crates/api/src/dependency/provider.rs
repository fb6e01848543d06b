use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use super::Resolved;
use crate::error::ApiError;
use crate::extract::{ParamSpec, Params};

/// A resolved dependency value, shared by every consumer within one request.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Releases a scoped resource. Runs synchronously so it can run from `Drop`.
pub type Teardown = Box<dyn FnOnce() + Send>;

/// What a provider callback receives: its own declared parameters and its sub-dependencies.
#[derive(Debug)]
pub struct ProviderInput {
    params: Params,
    deps: Resolved,
}

impl ProviderInput {
    pub(crate) fn new(params: Params, deps: Resolved) -> Self {
        Self { params, deps }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn deps(&self) -> &Resolved {
        &self.deps
    }
}

/// The outcome of one provider invocation.
pub enum Provided {
    Value(Instance),
    Scoped { value: Instance, teardown: Teardown },
}

/// A value together with the callback that releases it.
pub struct Scoped<T> {
    value: T,
    teardown: Teardown,
}

impl fmt::Debug for Provided {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provided::Value(_) => f.write_str("Provided::Value"),
            Provided::Scoped { .. } => f.write_str("Provided::Scoped"),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Scoped<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scoped").field("value", &self.value).finish_non_exhaustive()
    }
}

impl<T> Scoped<T> {
    pub fn new<F>(value: T, teardown: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self { value, teardown: Box::new(teardown) }
    }
}

#[async_trait]
pub trait Provide: Send + Sync {
    async fn provide(&self, input: ProviderInput) -> Result<Provided, ApiError>;
}

/// Wraps any `async Fn(ProviderInput) -> Result<T, ApiError>`
pub struct FnProvider<F, T> {
    f: F,
    _phantom: PhantomData<fn() -> T>,
}

pub fn provider_fn<F, Fut, T>(f: F) -> FnProvider<F, T>
where
    F: Fn(ProviderInput) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, ApiError>> + Send,
    T: Send + Sync + 'static,
{
    FnProvider { f, _phantom: PhantomData }
}

impl<F, T> fmt::Debug for FnProvider<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProvider").field("output", &std::any::type_name::<T>()).finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut, T> Provide for FnProvider<F, T>
where
    F: Fn(ProviderInput) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, ApiError>> + Send,
    T: Send + Sync + 'static,
{
    async fn provide(&self, input: ProviderInput) -> Result<Provided, ApiError> {
        let value = (self.f)(input).await?;
        Ok(Provided::Value(Arc::new(value)))
    }
}

/// Wraps any `async Fn(ProviderInput) -> Result<Scoped<T>, ApiError>`
pub struct ScopedFnProvider<F, T> {
    f: F,
    _phantom: PhantomData<fn() -> T>,
}

pub fn scoped_fn<F, Fut, T>(f: F) -> ScopedFnProvider<F, T>
where
    F: Fn(ProviderInput) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Scoped<T>, ApiError>> + Send,
    T: Send + Sync + 'static,
{
    ScopedFnProvider { f, _phantom: PhantomData }
}

impl<F, T> fmt::Debug for ScopedFnProvider<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedFnProvider").field("output", &std::any::type_name::<T>()).finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut, T> Provide for ScopedFnProvider<F, T>
where
    F: Fn(ProviderInput) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Scoped<T>, ApiError>> + Send,
    T: Send + Sync + 'static,
{
    async fn provide(&self, input: ProviderInput) -> Result<Provided, ApiError> {
        let Scoped { value, teardown } = (self.f)(input).await?;
        Ok(Provided::Scoped { value: Arc::new(value), teardown })
    }
}

/// A named dependency provider, registered once with
/// [`AppBuilder::provide`](crate::AppBuilder::provide).
pub struct Provider {
    pub(crate) name: String,
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) dependencies: Vec<String>,
    pub(crate) provide: Arc<dyn Provide>,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

impl Provider {
    pub fn new<P: Provide + 'static>(name: impl Into<String>, provide: P) -> Self {
        Self { name: name.into(), params: Vec::new(), dependencies: Vec::new(), provide: Arc::new(provide) }
    }

    #[must_use]
    pub fn param(mut self, param: impl Into<ParamSpec>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Declares a sub-dependency, resolved before this provider runs.
    #[must_use]
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    async fn answer(_input: ProviderInput) -> Result<u32, ApiError> {
        Ok(42)
    }

    fn input() -> ProviderInput {
        ProviderInput::new(Params::new(), Resolved::default())
    }

    #[tokio::test]
    async fn fn_provider_wraps_the_value() {
        let provided = provider_fn(answer).provide(input()).await.unwrap();
        let Provided::Value(value) = provided else { panic!("expected a plain value") };
        assert_eq!(value.downcast_ref::<u32>(), Some(&42));
    }

    #[tokio::test]
    async fn scoped_provider_hands_over_its_teardown() {
        let released = Arc::new(AtomicBool::new(false));
        let flag = released.clone();
        let provider = scoped_fn(move |_input: ProviderInput| {
            let flag = flag.clone();
            async move { Ok::<_, ApiError>(Scoped::new("session", move || flag.store(true, Ordering::SeqCst))) }
        });

        let Provided::Scoped { value, teardown } = provider.provide(input()).await.unwrap() else {
            panic!("expected a scoped value")
        };
        assert_eq!(value.downcast_ref::<&str>(), Some(&"session"));
        assert!(!released.load(Ordering::SeqCst));
        teardown();
        assert!(released.load(Ordering::SeqCst));
    }
}
