//! Query parameters: required, defaulted and constrained.

use micro_api::schema::Field;
use micro_api::{ApiError, App, ConfigError, Inputs, get, handler_fn};
use serde_json::{Value, json};

async fn read_root(_inputs: Inputs) -> Result<Value, ApiError> {
    Ok(json!({
        "message": "Query parameter examples",
        "examples": [
            "/search?q=rust",
            "/search?q=rust&limit=5",
            "/items?skip=10&limit=20",
            "/filter?min_price=10&max_price=100&in_stock=true",
        ],
    }))
}

async fn search(inputs: Inputs) -> Result<Value, ApiError> {
    let q: String = inputs.params.get("q")?;
    let limit: i64 = inputs.params.get("limit")?;
    Ok(json!({ "query": q, "limit": limit, "results": format!("Searching for '{q}' with limit {limit}") }))
}

async fn list_items(inputs: Inputs) -> Result<Value, ApiError> {
    let skip: i64 = inputs.params.get("skip")?;
    let limit: i64 = inputs.params.get("limit")?;
    let sort_by: Option<String> = inputs.params.get("sort_by")?;
    Ok(json!({
        "skip": skip,
        "limit": limit,
        "sort_by": sort_by,
        "message": format!("Showing items {skip} to {}", skip.saturating_add(limit)),
    }))
}

async fn filter_items(inputs: Inputs) -> Result<Value, ApiError> {
    let min_price: f64 = inputs.params.get("min_price")?;
    let max_price: f64 = inputs.params.get("max_price")?;
    let in_stock: bool = inputs.params.get("in_stock")?;
    let category: Option<String> = inputs.params.get("category")?;
    Ok(json!({
        "filters": { "min_price": min_price, "max_price": max_price, "in_stock": in_stock, "category": category },
        "message": format!("Filtering items: ${min_price} - ${max_price}"),
    }))
}

async fn compare_query(inputs: Inputs) -> Result<Value, ApiError> {
    let path_id: String = inputs.params.get("path_id")?;
    Ok(json!({ "path_id": path_id, "type": "query parameter" }))
}

async fn compare_path(inputs: Inputs) -> Result<Value, ApiError> {
    let path_id: String = inputs.params.get("path_id")?;
    Ok(json!({ "path_id": path_id, "type": "path parameter" }))
}

pub fn app() -> Result<App, ConfigError> {
    App::builder()
        .route("/", get(handler_fn(read_root)))
        .route("/search", get(handler_fn(search)).param(Field::string("q")).param(Field::integer("limit").with_default(10)))
        .route(
            "/items",
            get(handler_fn(list_items))
                .param(Field::integer("skip").with_default(0))
                .param(Field::integer("limit").with_default(10))
                .param(Field::string("sort_by").optional()),
        )
        .route(
            "/filter",
            get(handler_fn(filter_items))
                .param(Field::float("min_price").with_default(0.0).ge(0.0))
                .param(Field::float("max_price").with_default(1000.0).le(10000.0))
                .param(Field::boolean("in_stock").with_default(true))
                .param(Field::string("category").optional().min_length(2).max_length(50)),
        )
        // same parameter name, classified by each route's pattern
        .route("/compare", get(handler_fn(compare_query)).param(Field::string("path_id").with_default("default")))
        .route("/compare/{path_id}", get(handler_fn(compare_path)).param(Field::string("path_id")))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{get_json, send};
    use http::{Method, StatusCode};

    #[tokio::test]
    async fn required_and_defaulted() {
        let app = app().unwrap();
        assert_eq!(
            get_json(&app, "/search?q=rust").await,
            json!({ "query": "rust", "limit": 10, "results": "Searching for 'rust' with limit 10" })
        );
        assert_eq!(get_json(&app, "/search?q=rust&limit=5").await["limit"], 5);

        let (status, body) = send(&app, Method::GET, "/search", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"][0]["loc"], json!(["query", "q"]));
        assert_eq!(body["detail"][0]["type"], "missing");
    }

    #[tokio::test]
    async fn all_optional() {
        let app = app().unwrap();
        assert_eq!(
            get_json(&app, "/items?skip=5&limit=20&sort_by=price").await,
            json!({ "skip": 5, "limit": 20, "sort_by": "price", "message": "Showing items 5 to 25" })
        );
        assert_eq!(get_json(&app, "/items").await["sort_by"], Value::Null);
    }

    #[tokio::test]
    async fn item_range_saturates_at_the_integer_limit() {
        let app = app().unwrap();
        let body = get_json(&app, &format!("/items?skip={}&limit=1", i64::MAX)).await;
        assert_eq!(body["skip"], i64::MAX);
        assert_eq!(body["message"], format!("Showing items {max} to {max}", max = i64::MAX));
    }

    #[tokio::test]
    async fn constrained_filters() {
        let app = app().unwrap();
        let body = get_json(&app, "/filter?min_price=10&in_stock=false&category=electronics").await;
        assert_eq!(
            body["filters"],
            json!({ "min_price": 10.0, "max_price": 1000.0, "in_stock": false, "category": "electronics" })
        );

        let (status, body) = send(&app, Method::GET, "/filter?min_price=-5&category=x", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let kinds: Vec<_> = body["detail"].as_array().unwrap().iter().map(|e| e["type"].clone()).collect();
        assert_eq!(kinds, [json!("range_error"), json!("length_error")]);
    }

    #[tokio::test]
    async fn query_or_path_by_pattern() {
        let app = app().unwrap();
        assert_eq!(get_json(&app, "/compare").await, json!({ "path_id": "default", "type": "query parameter" }));
        assert_eq!(get_json(&app, "/compare?path_id=custom").await["path_id"], "custom");
        assert_eq!(get_json(&app, "/compare/123").await, json!({ "path_id": "123", "type": "path parameter" }));
    }
}
