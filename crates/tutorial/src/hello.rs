//! The smallest application: two fixed JSON answers.

use micro_api::{ApiError, App, ConfigError, Inputs, get, handler_fn};
use serde_json::{Value, json};

async fn read_root(_inputs: Inputs) -> Result<Value, ApiError> {
    Ok(json!({ "message": "Hello, World!" }))
}

async fn greet(_inputs: Inputs) -> Result<Value, ApiError> {
    Ok(json!({ "message": "Welcome to micro-api!" }))
}

pub fn app() -> Result<App, ConfigError> {
    App::builder().route("/", get(handler_fn(read_root))).route("/greet", get(handler_fn(greet))).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{get_json, send};
    use http::{Method, StatusCode};

    #[tokio::test]
    async fn both_routes_answer() {
        let app = app().unwrap();
        assert_eq!(get_json(&app, "/").await, json!({ "message": "Hello, World!" }));
        assert_eq!(get_json(&app, "/greet").await, json!({ "message": "Welcome to micro-api!" }));

        let (status, _) = send(&app, Method::GET, "/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
