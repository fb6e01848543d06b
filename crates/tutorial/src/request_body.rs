//! JSON request bodies validated against schemas.

use jiff::Timestamp;
use micro_api::extract::ParamSpec;
use micro_api::schema::{Field, Schema, SemanticType};
use micro_api::{ApiError, App, ConfigError, Inputs, get, handler_fn, post};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub fn user_schema() -> Schema {
    Schema::new("User")
        .field(Field::string("username").min_length(3).max_length(50))
        .field(Field::string("email").email())
        .field(Field::integer("age").optional().ge(0.0).le(120.0))
        .field(Field::boolean("is_active").with_default(true))
}

pub fn product_schema() -> Schema {
    Schema::new("Product")
        .field(Field::string("name").min_length(1).max_length(100))
        .field(Field::string("description").optional())
        .field(Field::float("price").gt(0.0))
        .field(Field::float("tax").optional().ge(0.0))
        .field(Field::list("tags", SemanticType::String).with_default(json!([])))
}

#[derive(Debug, Serialize, Deserialize)]
struct Product {
    name: String,
    description: Option<String>,
    price: f64,
    tax: Option<f64>,
    tags: Vec<String>,
}

async fn read_root(_inputs: Inputs) -> Result<Value, ApiError> {
    Ok(json!({ "message": "Use POST requests to send data", "tip": "Send a JSON body with content-type application/json" }))
}

async fn create_user(inputs: Inputs) -> Result<Value, ApiError> {
    let user: Value = inputs.params.get("user")?;
    Ok(json!({ "message": "User created!", "user": user, "received_at": Timestamp::now() }))
}

async fn create_product(inputs: Inputs) -> Result<Value, ApiError> {
    let product: Product = inputs.params.get("product")?;
    let total_price = product.price + product.tax.unwrap_or_default();
    Ok(json!({ "message": "Product created!", "product": product, "total_price": total_price }))
}

async fn mixed_parameters(inputs: Inputs) -> Result<Value, ApiError> {
    let user_id: i64 = inputs.params.get("user_id")?;
    let user: Value = inputs.params.get("user")?;
    let token: String = inputs.params.get("token")?;
    Ok(json!({ "user_id": user_id, "user": user, "token": token }))
}

async fn simple_body(inputs: Inputs) -> Result<Value, ApiError> {
    let name: String = inputs.params.get("name")?;
    let age: i64 = inputs.params.get("age")?;
    Ok(json!({ "name": name, "age": age }))
}

pub fn app() -> Result<App, ConfigError> {
    App::builder()
        .route("/", get(handler_fn(read_root)))
        .route("/users", post(handler_fn(create_user)).param(Field::object("user", user_schema())))
        .route("/products", post(handler_fn(create_product)).param(Field::object("product", product_schema())))
        .route(
            "/mixed/{user_id}",
            post(handler_fn(mixed_parameters))
                .param(Field::integer("user_id"))
                .param(Field::object("user", user_schema()))
                .param(Field::string("token").with_default("default-token")),
        )
        .route(
            "/simple",
            post(handler_fn(simple_body))
                .param(ParamSpec::body(Field::string("name")))
                .param(ParamSpec::body(Field::integer("age"))),
        )
        .build()
}
