//! Tutorial applications built on `micro-api`, from a two-route hello world up to a user
//! service backed by a pooled store.

use std::fmt;
use std::str::FromStr;

use micro_api::{App, ConfigError};
use thiserror::Error;

use crate::store::SessionPool;

pub mod config;
pub mod console;
pub mod dependencies;
pub mod hello;
pub mod path_params;
pub mod query_params;
pub mod request_body;
pub mod response_models;
pub mod status_codes;
pub mod store;
pub mod users;

/// The applications the console can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tutorial {
    Hello,
    PathParams,
    QueryParams,
    RequestBody,
    ResponseModels,
    StatusCodes,
    Dependencies,
    Users,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown tutorial `{0}`, expected one of: {names}", names = Tutorial::names())]
pub struct UnknownTutorial(pub String);

impl Tutorial {
    pub const ALL: [Tutorial; 8] = [
        Tutorial::Hello,
        Tutorial::PathParams,
        Tutorial::QueryParams,
        Tutorial::RequestBody,
        Tutorial::ResponseModels,
        Tutorial::StatusCodes,
        Tutorial::Dependencies,
        Tutorial::Users,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tutorial::Hello => "hello",
            Tutorial::PathParams => "path-params",
            Tutorial::QueryParams => "query-params",
            Tutorial::RequestBody => "request-body",
            Tutorial::ResponseModels => "response-models",
            Tutorial::StatusCodes => "status-codes",
            Tutorial::Dependencies => "dependencies",
            Tutorial::Users => "users",
        }
    }

    fn names() -> String {
        Self::ALL.map(Tutorial::as_str).join(", ")
    }

    /// Builds the application; only [`Tutorial::Users`] uses the pool.
    pub fn app(self, pool: &SessionPool) -> Result<App, ConfigError> {
        match self {
            Tutorial::Hello => hello::app(),
            Tutorial::PathParams => path_params::app(),
            Tutorial::QueryParams => query_params::app(),
            Tutorial::RequestBody => request_body::app(),
            Tutorial::ResponseModels => response_models::app(),
            Tutorial::StatusCodes => status_codes::app(),
            Tutorial::Dependencies => dependencies::app(),
            Tutorial::Users => users::app(pool),
        }
    }
}

impl FromStr for Tutorial {
    type Err = UnknownTutorial;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|tutorial| tutorial.as_str() == s).ok_or_else(|| UnknownTutorial(s.to_owned()))
    }
}

impl fmt::Display for Tutorial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use bytes::Bytes;
    use http::header::CONTENT_TYPE;
    use http::{Method, Request, StatusCode};
    use micro_api::App;
    use serde_json::Value;

    /// Sends one request, returning the status and the decoded body (`Null` when empty).
    pub(crate) async fn send(app: &App, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header(CONTENT_TYPE, "application/json");
                Bytes::from(serde_json::to_vec(&body).unwrap())
            }
            None => Bytes::new(),
        };

        let response = app.handle(request.body(body).unwrap()).await;
        let status = response.status();
        let body = response.into_body();
        let body = if body.is_empty() { Value::Null } else { serde_json::from_slice(&body).unwrap() };
        (status, body)
    }

    pub(crate) async fn get_json(app: &App, uri: &str) -> Value {
        let (status, body) = send(app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK, "GET {uri} answered {body}");
        body
    }
}
