//! A typed request pipeline with dependency injection.
//!
//! A request flows through five stages:
//!
//! 1. the [`Router`] picks the first registered route matching the method and path,
//! 2. the route's [`ParamPlan`](extract::ParamPlan) reads path, query and body parameters,
//!    validated by the [`schema`] module,
//! 3. the [`dependency`] resolver runs the providers the route depends on,
//! 4. the handler runs,
//! 5. the route's [`ResponseSchema`] filters the handler output.
//!
//! # Example
//! ```
//! use bytes::Bytes;
//! use http::{Request, StatusCode};
//! use micro_api::schema::Field;
//! use micro_api::{ApiError, App, Inputs, get, handler_fn};
//! use serde_json::{Value, json};
//!
//! async fn read_item(inputs: Inputs) -> Result<Value, ApiError> {
//!     let item_id: i64 = inputs.params.get("item_id")?;
//!     Ok(json!({ "item_id": item_id }))
//! }
//!
//! # futures::executor::block_on(async {
//! let app = App::builder()
//!     .route("/items/{item_id}", get(handler_fn(read_item)).param(Field::integer("item_id")))
//!     .build()
//!     .unwrap();
//!
//! let request = Request::get("/items/5").body(Bytes::new()).unwrap();
//! let response = app.handle(request).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! # });
//! ```

mod app;
mod handler;
mod request;
mod responder;

pub mod dependency;
pub mod error;
pub mod extract;
pub mod router;
pub mod schema;
pub mod shape;

pub use app::App;
pub use app::AppBuilder;
pub use dependency::Provider;
pub use error::ApiError;
pub use error::ConfigError;
pub use error::ValidationError;
pub use handler::FnHandler;
pub use handler::Handler;
pub use handler::Inputs;
pub use handler::handler_fn;
pub use request::PathParams;
pub use request::RequestContext;
pub use responder::Reply;
pub use responder::Responder;
pub use router::{Router, delete, get, patch, post, put};
pub use shape::ResponseSchema;
