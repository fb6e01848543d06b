//! Dependency injection: plain providers, authentication, chained scoped resources and a
//! reusable pagination provider.

use jiff::Timestamp;
use micro_api::dependency::{Provider, ProviderInput, Scoped, provider_fn, scoped_fn};
use micro_api::schema::Field;
use micro_api::{ApiError, App, ConfigError, Inputs, get, handler_fn};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
}

/// A stand-in for a database connection; opening and closing are logged.
#[derive(Debug, Serialize)]
pub struct FakeDatabase {
    pub connected: bool,
    pub data: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub token: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Page {
    pub skip: usize,
    pub limit: usize,
}

async fn current_time(_input: ProviderInput) -> Result<Timestamp, ApiError> {
    Ok(Timestamp::now())
}

async fn verify_token(input: ProviderInput) -> Result<AuthenticatedUser, ApiError> {
    match input.params().get::<Option<String>>("token")?.as_deref() {
        None | Some("") => Err(ApiError::unauthorized("Token is required")),
        Some("secret-token") => Ok(AuthenticatedUser { user_id: 123, username: "alice".to_owned() }),
        Some(_) => Err(ApiError::unauthorized("Invalid token")),
    }
}

async fn open_database(_input: ProviderInput) -> Result<Scoped<FakeDatabase>, ApiError> {
    info!("opening database connection");
    let db = FakeDatabase { connected: true, data: vec![1, 2, 3] };
    Ok(Scoped::new(db, || info!("closing database connection")))
}

async fn current_user(input: ProviderInput) -> Result<Option<CurrentUser>, ApiError> {
    let _db = input.deps().get::<FakeDatabase>("database")?;
    let token = input.params().get::<Option<String>>("token")?.filter(|token| !token.is_empty());
    Ok(token.map(|token| CurrentUser { id: 1, username: "alice".to_owned(), token }))
}

async fn pagination(input: ProviderInput) -> Result<Page, ApiError> {
    Ok(Page { skip: input.params().get("skip")?, limit: input.params().get("limit")? })
}

async fn show_time(inputs: Inputs) -> Result<Value, ApiError> {
    let now = inputs.deps.get::<Timestamp>("current_time")?;
    Ok(json!({ "current_time": *now, "formatted": now.strftime("%Y-%m-%d %H:%M:%S").to_string() }))
}

async fn public_endpoint(_inputs: Inputs) -> Result<Value, ApiError> {
    Ok(json!({ "message": "This is public" }))
}

async fn protected_endpoint(inputs: Inputs) -> Result<Value, ApiError> {
    let user = inputs.deps.get::<AuthenticatedUser>("verify_token")?;
    Ok(json!({ "message": "This is protected", "user": user.as_ref() }))
}

async fn my_profile(inputs: Inputs) -> Result<Value, ApiError> {
    let current_user = inputs.deps.get::<Option<CurrentUser>>("current_user")?;
    let db = inputs.deps.get::<FakeDatabase>("database")?;
    Ok(match &*current_user {
        Some(user) => json!({ "message": "Your profile", "user": user, "db_connected": db.connected }),
        None => json!({ "message": "Not logged in", "db_connected": db.connected }),
    })
}

fn page_of(prefix: &str, total: usize, page: Page) -> Vec<String> {
    (0..total).skip(page.skip).take(page.limit).map(|i| format!("{prefix} {i}")).collect()
}

async fn get_items(inputs: Inputs) -> Result<Value, ApiError> {
    let page = *inputs.deps.get::<Page>("pagination")?;
    Ok(json!({ "items": page_of("Item", 100, page), "pagination": page }))
}

async fn get_users(inputs: Inputs) -> Result<Value, ApiError> {
    let page = *inputs.deps.get::<Page>("pagination")?;
    Ok(json!({ "users": page_of("User", 50, page), "pagination": page }))
}

fn token() -> Field {
    Field::string("token").optional()
}

pub fn app() -> Result<App, ConfigError> {
    App::builder()
        .provide(Provider::new("current_time", provider_fn(current_time)))
        .provide(Provider::new("verify_token", provider_fn(verify_token)).param(token()))
        .provide(Provider::new("database", scoped_fn(open_database)))
        .provide(Provider::new("current_user", provider_fn(current_user)).depends_on("database").param(token()))
        .provide(
            Provider::new("pagination", provider_fn(pagination))
                .param(Field::integer("skip").with_default(0).ge(0.0))
                .param(Field::integer("limit").with_default(10).ge(0.0)),
        )
        .route("/time", get(handler_fn(show_time)).depends_on("current_time"))
        .route("/public", get(handler_fn(public_endpoint)))
        .route("/protected", get(handler_fn(protected_endpoint)).depends_on("verify_token"))
        .route("/me", get(handler_fn(my_profile)).depends_on("current_user").depends_on("database"))
        .route("/items", get(handler_fn(get_items)).depends_on("pagination"))
        .route("/users", get(handler_fn(get_users)).depends_on("pagination"))
        .build()
}
