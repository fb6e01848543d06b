//! Response schemas: handlers return more than the client is allowed to see.

use micro_api::schema::{Field, Schema};
use micro_api::{ApiError, App, ConfigError, Inputs, ResponseSchema, get, handler_fn, post};
use serde_json::{Value, json};

fn user_input() -> Schema {
    Schema::new("UserInput")
        .field(Field::string("username"))
        .field(Field::string("email").email())
        .field(Field::string("password"))
}

fn user_output() -> Schema {
    Schema::new("UserOutput")
        .field(Field::integer("id"))
        .field(Field::string("username"))
        .field(Field::string("email"))
        .field(Field::boolean("is_active"))
}

fn user_detailed() -> Schema {
    Schema::extend(&user_output(), "UserDetailed")
        .field(Field::string("created_at"))
        .field(Field::integer("login_count"))
}

async fn read_root(_inputs: Inputs) -> Result<Value, ApiError> {
    Ok(json!({ "message": "Response model examples" }))
}

async fn register_user(inputs: Inputs) -> Result<Value, ApiError> {
    let mut user: Value = inputs.params.get("user")?;
    user["id"] = json!(123);
    user["is_active"] = json!(true);
    Ok(user)
}

async fn get_user(inputs: Inputs) -> Result<Value, ApiError> {
    let user_id: i64 = inputs.params.get("user_id")?;
    Ok(json!({
        "id": user_id,
        "username": "alice",
        "email": "alice@example.com",
        "is_active": true,
        "password": "secret123",
        "credit_card": "1234-5678",
    }))
}

async fn get_user_details(inputs: Inputs) -> Result<Value, ApiError> {
    let user_id: i64 = inputs.params.get("user_id")?;
    Ok(json!({
        "id": user_id,
        "username": "alice",
        "email": "alice@example.com",
        "is_active": true,
        "created_at": "2024-01-01",
        "login_count": 42,
    }))
}

async fn get_users(_inputs: Inputs) -> Result<Value, ApiError> {
    Ok(json!([
        { "id": 1, "username": "alice", "email": "alice@example.com", "is_active": true, "password": "a" },
        { "id": 2, "username": "bob", "email": "bob@example.com", "is_active": false, "password": "b" },
    ]))
}

pub fn app() -> Result<App, ConfigError> {
    App::builder()
        .route("/", get(handler_fn(read_root)))
        .route("/register", post(handler_fn(register_user)).param(Field::object("user", user_input())).response(user_output()))
        .route("/users/{user_id}", get(handler_fn(get_user)).param(Field::integer("user_id")).response(user_output()))
        .route(
            "/users/{user_id}/details",
            get(handler_fn(get_user_details)).param(Field::integer("user_id")).response(user_detailed()),
        )
        .route("/users-list", get(handler_fn(get_users)).response(ResponseSchema::list(user_output())))
        .build()
}
