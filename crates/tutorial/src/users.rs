//! The user service: CRUD over the session pool.

use std::sync::Arc;

use http::StatusCode;
use micro_api::schema::{Field, Schema};
use micro_api::{ApiError, App, ConfigError, Inputs, Provider, ResponseSchema, delete, get, handler_fn, post, put};
use serde_json::{Value, json};
use tracing::info;

use crate::store::{NewUser, Session, SessionPool, SessionProvider, User};

pub fn user_base() -> Schema {
    Schema::new("UserBase")
        .field(Field::string("username").min_length(3).max_length(50))
        .field(Field::string("email").email())
        .field(Field::string("full_name").optional().max_length(100))
        .field(Field::boolean("is_active").with_default(true))
}

pub fn user_create() -> Schema {
    Schema::extend(&user_base(), "UserCreate")
}

pub fn user_response() -> Schema {
    Schema::extend(&user_base(), "UserResponse")
        .field(Field::integer("id"))
        .field(Field::string("created_at"))
        .field(Field::string("updated_at"))
}

fn session(inputs: &Inputs) -> Result<Arc<Session>, ApiError> {
    inputs.deps.get::<Session>("db")
}

async fn read_root(_inputs: Inputs) -> Result<Value, ApiError> {
    Ok(json!({
        "message": "Database Basics Example",
        "endpoints": {
            "create_user": "POST /users",
            "get_all_users": "GET /users",
            "get_user": "GET /users/{user_id}",
            "get_by_username": "GET /users/username/{username}",
            "update_user": "PUT /users/{user_id}",
            "delete_user": "DELETE /users/{user_id}",
        },
    }))
}

async fn create_user(inputs: Inputs) -> Result<User, ApiError> {
    let user: NewUser = inputs.params.get("user")?;
    let session = session(&inputs)?;
    let store = session.store()?;

    if store.find_by_username(&user.username).await?.is_some() {
        return Err(ApiError::bad_request(format!("Username '{}' is already taken", user.username)));
    }
    if store.find_by_email(&user.email).await?.is_some() {
        return Err(ApiError::bad_request(format!("Email '{}' is already registered", user.email)));
    }

    let user = store.insert(user).await?;
    info!(id = user.id, username = %user.username, "user created");
    Ok(user)
}

async fn get_users(inputs: Inputs) -> Result<Vec<User>, ApiError> {
    let skip: usize = inputs.params.get("skip")?;
    let limit: usize = inputs.params.get("limit")?;
    Ok(session(&inputs)?.store()?.list(skip, limit).await?)
}

async fn get_user(inputs: Inputs) -> Result<User, ApiError> {
    let user_id: i64 = inputs.params.get("user_id")?;
    session(&inputs)?
        .store()?
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User with id {user_id} not found")))
}

async fn get_user_by_username(inputs: Inputs) -> Result<User, ApiError> {
    let username: String = inputs.params.get("username")?;
    session(&inputs)?
        .store()?
        .find_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User '{username}' not found")))
}

async fn update_user(inputs: Inputs) -> Result<User, ApiError> {
    let user_id: i64 = inputs.params.get("user_id")?;
    let update: NewUser = inputs.params.get("user_update")?;
    session(&inputs)?
        .store()?
        .update(user_id, update)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User with id {user_id} not found")))
}

async fn delete_user(inputs: Inputs) -> Result<(), ApiError> {
    let user_id: i64 = inputs.params.get("user_id")?;
    if session(&inputs)?.store()?.delete(user_id).await? {
        info!(id = user_id, "user deleted");
        Ok(())
    } else {
        Err(ApiError::not_found(format!("User with id {user_id} not found")))
    }
}

async fn get_stats(inputs: Inputs) -> Result<Value, ApiError> {
    let session = session(&inputs)?;
    let store = session.store()?;
    let total_users = store.count().await?;
    let active_users = store.count_active().await?;
    Ok(json!({
        "total_users": total_users,
        "active_users": active_users,
        "inactive_users": total_users.saturating_sub(active_users),
    }))
}

async fn reset_database(inputs: Inputs) -> Result<Value, ApiError> {
    let deleted = session(&inputs)?.store()?.clear().await?;
    info!(deleted, "user store reset");
    Ok(json!({
        "message": format!("Database reset. Deleted {deleted} users."),
        "warning": "All data has been removed!",
    }))
}

pub fn app(pool: &SessionPool) -> Result<App, ConfigError> {
    App::builder()
        .provide(Provider::new("db", SessionProvider::new(pool.clone())))
        .route("/", get(handler_fn(read_root)))
        .route(
            "/users",
            post(handler_fn(create_user))
                .param(Field::object("user", user_create()))
                .depends_on("db")
                .response(user_response())
                .status(StatusCode::CREATED),
        )
        .route(
            "/users",
            get(handler_fn(get_users))
                .param(Field::integer("skip").with_default(0).ge(0.0))
                .param(Field::integer("limit").with_default(100).ge(0.0))
                .depends_on("db")
                .response(ResponseSchema::list(user_response())),
        )
        .route(
            "/users/{user_id}",
            get(handler_fn(get_user)).param(Field::integer("user_id")).depends_on("db").response(user_response()),
        )
        .route(
            "/users/username/{username}",
            get(handler_fn(get_user_by_username))
                .param(Field::string("username"))
                .depends_on("db")
                .response(user_response()),
        )
        .route(
            "/users/{user_id}",
            put(handler_fn(update_user))
                .param(Field::integer("user_id"))
                .param(Field::object("user_update", user_create()))
                .depends_on("db")
                .response(user_response()),
        )
        .route(
            "/users/{user_id}",
            delete(handler_fn(delete_user))
                .param(Field::integer("user_id"))
                .depends_on("db")
                .status(StatusCode::NO_CONTENT),
        )
        .route("/stats", get(handler_fn(get_stats)).depends_on("db"))
        .route("/reset-database", post(handler_fn(reset_database)).depends_on("db"))
        .build()
}
