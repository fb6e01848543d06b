//! Dependency injection.
//!
//! Providers are registered by name and may depend on each other; the registered set must form a
//! DAG, checked once when the application is built. Within one request every provider runs at most
//! once and every consumer observes the same [`Arc`](std::sync::Arc). Scoped providers hand back a
//! teardown callback alongside their value; the [`RequestScope`] releases those in reverse
//! acquisition order when the request ends, however it ends.
//!
//! # Example
//! ```
//! use micro_api::dependency::{Provider, ProviderInput, Scoped, provider_fn, scoped_fn};
//! use micro_api::ApiError;
//!
//! struct Session;
//!
//! async fn open_session(_input: ProviderInput) -> Result<Scoped<Session>, ApiError> {
//!     Ok(Scoped::new(Session, || println!("session closed")))
//! }
//!
//! async fn current_user(input: ProviderInput) -> Result<String, ApiError> {
//!     let _session = input.deps().get::<Session>("db")?;
//!     Ok("alice".to_owned())
//! }
//!
//! let db = Provider::new("db", scoped_fn(open_session));
//! let user = Provider::new("current_user", provider_fn(current_user)).depends_on("db");
//! # let _ = (db, user);
//! ```

mod graph;
mod provider;
mod resolver;
mod scope;

pub use graph::{DependencyGraph, Node, NodeId};
pub use provider::{
    FnProvider, Instance, Provide, Provided, Provider, ProviderInput, Scoped, ScopedFnProvider, Teardown, provider_fn,
    scoped_fn,
};
pub use resolver::Resolved;
pub(crate) use resolver::{ProviderParams, resolve_all};
pub use scope::RequestScope;
