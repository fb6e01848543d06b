//! Typed path parameters, and why registration order matters.

use micro_api::schema::Field;
use micro_api::{ApiError, App, ConfigError, Inputs, get, handler_fn};
use serde_json::{Value, json};

async fn read_root(_inputs: Inputs) -> Result<Value, ApiError> {
    Ok(json!({
        "message": "Try these URLs:",
        "examples": ["/users/123", "/users/alice", "/items/5/details"],
    }))
}

async fn get_user(inputs: Inputs) -> Result<Value, ApiError> {
    let user_id: i64 = inputs.params.get("user_id")?;
    Ok(json!({ "user_id": user_id, "type": "integer", "message": format!("You requested user #{user_id}") }))
}

async fn get_user_profile(inputs: Inputs) -> Result<Value, ApiError> {
    let username: String = inputs.params.get("username")?;
    Ok(json!({ "profile_url": format!("/users/{username}/profile"), "username": username }))
}

async fn get_item_details(inputs: Inputs) -> Result<Value, ApiError> {
    let item_id: i64 = inputs.params.get("item_id")?;
    Ok(json!({ "item_id": item_id, "details": format!("Details for item #{item_id}") }))
}

async fn get_latest_products(_inputs: Inputs) -> Result<Value, ApiError> {
    Ok(json!({ "message": "Here are the latest products" }))
}

async fn get_product(inputs: Inputs) -> Result<Value, ApiError> {
    let product_id: i64 = inputs.params.get("product_id")?;
    Ok(json!({ "product_id": product_id }))
}

pub fn app() -> Result<App, ConfigError> {
    App::builder()
        .route("/", get(handler_fn(read_root)))
        .route("/users/{user_id}", get(handler_fn(get_user)).param(Field::integer("user_id")))
        .route("/users/{username}/profile", get(handler_fn(get_user_profile)).param(Field::string("username")))
        .route("/items/{item_id}/details", get(handler_fn(get_item_details)).param(Field::integer("item_id")))
        // the literal route must come first, `/products/{product_id}` would shadow it
        .route("/products/latest", get(handler_fn(get_latest_products)))
        .route("/products/{product_id}", get(handler_fn(get_product)).param(Field::integer("product_id")))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{get_json, send};
    use http::{Method, StatusCode};

    #[tokio::test]
    async fn typed_ids() {
        let app = app().unwrap();
        assert_eq!(
            get_json(&app, "/users/123").await,
            json!({ "user_id": 123, "type": "integer", "message": "You requested user #123" })
        );

        let (status, body) = send(&app, Method::GET, "/users/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "detail": [{ "loc": ["path", "user_id"], "msg": "value is not a valid integer", "type": "type_error" }] })
        );
    }

    #[tokio::test]
    async fn string_and_nested_segments() {
        let app = app().unwrap();
        assert_eq!(
            get_json(&app, "/users/alice/profile").await,
            json!({ "profile_url": "/users/alice/profile", "username": "alice" })
        );
        assert_eq!(get_json(&app, "/items/5/details").await["details"], "Details for item #5");
    }

    #[tokio::test]
    async fn latest_is_not_a_product_id() {
        let app = app().unwrap();
        assert_eq!(get_json(&app, "/products/latest").await, json!({ "message": "Here are the latest products" }));
        assert_eq!(get_json(&app, "/products/7").await, json!({ "product_id": 7 }));
    }
}
