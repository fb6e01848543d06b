//! Success and error status codes.

use std::collections::BTreeMap;
use std::sync::Arc;

use http::StatusCode;
use micro_api::schema::{Field, Schema};
use micro_api::{ApiError, App, ConfigError, Inputs, delete, get, handler_fn, post};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Item {
    name: String,
    price: f64,
}

/// The item catalogue shared by every request of one application.
#[derive(Debug, Clone)]
struct Catalogue {
    items: Arc<Mutex<BTreeMap<i64, Item>>>,
}

impl Catalogue {
    fn seeded() -> Self {
        let items = [(1, "Laptop", 999.99), (2, "Mouse", 29.99), (3, "Keyboard", 79.99)]
            .into_iter()
            .map(|(id, name, price)| (id, Item { name: name.to_owned(), price }))
            .collect();
        Self { items: Arc::new(Mutex::new(items)) }
    }

    async fn overview(&self) -> Result<Value, ApiError> {
        let ids: Vec<i64> = self.items.lock().await.keys().copied().collect();
        Ok(json!({ "message": "Status code examples", "available_items": ids }))
    }

    async fn get(&self, inputs: Inputs) -> Result<Item, ApiError> {
        let item_id: i64 = inputs.params.get("item_id")?;
        self.items.lock().await.get(&item_id).cloned().ok_or_else(|| ApiError::not_found(format!("Item {item_id} not found")))
    }

    async fn create(&self, inputs: Inputs) -> Result<Value, ApiError> {
        let item: Item = inputs.params.get("item")?;
        let mut items = self.items.lock().await;
        let id = items.keys().next_back().copied().unwrap_or_default() + 1;
        items.insert(id, item.clone());
        Ok(json!({ "id": id, "name": item.name, "price": item.price }))
    }

    async fn delete(&self, inputs: Inputs) -> Result<(), ApiError> {
        let item_id: i64 = inputs.params.get("item_id")?;
        match self.items.lock().await.remove(&item_id) {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found(format!("Item {item_id} not found"))),
        }
    }
}

fn item_schema() -> Schema {
    Schema::new("Item").field(Field::string("name")).field(Field::float("price"))
}

async fn error_demo(inputs: Inputs) -> Result<Value, ApiError> {
    let code: i64 = inputs.params.get("code")?;
    Err(match code {
        401 => ApiError::unauthorized("Unauthorized - You need to log in"),
        403 => ApiError::forbidden("Forbidden - You don't have permission"),
        404 => ApiError::not_found("Not Found - This doesn't exist"),
        500 => ApiError::internal("Internal Server Error - Something broke on our side"),
        400 => ApiError::bad_request("Bad Request - You sent something wrong"),
        _ => ApiError::bad_request("Unknown error"),
    })
}

async fn validate_age(inputs: Inputs) -> Result<Value, ApiError> {
    let age: i64 = inputs.params.get("age")?;
    if age < 0 {
        return Err(ApiError::bad_request("Age cannot be negative"));
    }
    if age < 18 {
        return Err(ApiError::forbidden("You must be 18 or older"));
    }
    Ok(json!({ "message": format!("Welcome! You are {age} years old") }))
}

pub fn app() -> Result<App, ConfigError> {
    let catalogue = Catalogue::seeded();
    let (overview, read, create, remove) = (catalogue.clone(), catalogue.clone(), catalogue.clone(), catalogue);

    App::builder()
        .route(
            "/",
            get(handler_fn(move |_inputs: Inputs| {
                let catalogue = overview.clone();
                async move { catalogue.overview().await }
            })),
        )
        .route(
            "/items/{item_id}",
            get(handler_fn(move |inputs: Inputs| {
                let catalogue = read.clone();
                async move { catalogue.get(inputs).await }
            }))
            .param(Field::integer("item_id")),
        )
        .route(
            "/items",
            post(handler_fn(move |inputs: Inputs| {
                let catalogue = create.clone();
                async move { catalogue.create(inputs).await }
            }))
            .param(Field::object("item", item_schema()))
            .status(StatusCode::CREATED),
        )
        .route(
            "/items/{item_id}",
            delete(handler_fn(move |inputs: Inputs| {
                let catalogue = remove.clone();
                async move { catalogue.delete(inputs).await }
            }))
            .param(Field::integer("item_id"))
            .status(StatusCode::NO_CONTENT),
        )
        .route("/error-demo", get(handler_fn(error_demo)).param(Field::integer("code").with_default(400)))
        .route("/validate-age", post(handler_fn(validate_age)).param(Field::integer("age")))
        .build()
}
