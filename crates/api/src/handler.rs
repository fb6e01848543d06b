use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::dependency::Resolved;
use crate::error::ApiError;
use crate::extract::Params;

/// Everything a handler receives: its resolved parameters and dependencies.
#[derive(Debug)]
pub struct Inputs {
    pub params: Params,
    pub deps: Resolved,
}

#[async_trait]
pub trait Handler: Send + Sync {
    async fn invoke(&self, inputs: Inputs) -> Result<Value, ApiError>;
}

/// Holds any `async Fn(Inputs) -> Result<T, ApiError>` where `T` serializes to JSON
pub struct FnHandler<F, T> {
    f: F,
    _phantom: PhantomData<fn() -> T>,
}

impl<F, T> fmt::Debug for FnHandler<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").field("output", &std::any::type_name::<T>()).finish_non_exhaustive()
    }
}

impl<F, Fut, T> FnHandler<F, T>
where
    F: Fn(Inputs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, ApiError>> + Send,
    T: Serialize,
{
    fn new(f: F) -> Self {
        Self { f, _phantom: PhantomData }
    }
}

pub fn handler_fn<F, Fut, T>(f: F) -> FnHandler<F, T>
where
    F: Fn(Inputs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, ApiError>> + Send,
    T: Serialize,
{
    FnHandler::new(f)
}

#[async_trait]
impl<F, Fut, T> Handler for FnHandler<F, T>
where
    F: Fn(Inputs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, ApiError>> + Send,
    T: Serialize,
{
    async fn invoke(&self, inputs: Inputs) -> Result<Value, ApiError> {
        let output = (self.f)(inputs).await?;
        serde_json::to_value(output).map_err(|e| ApiError::internal(format!("handler output is not JSON: {e}")))
    }
}
