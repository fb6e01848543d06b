//! The storage collaborator of the user service.
//!
//! Handlers never see a store directly: they receive a [`Session`] from the `db` provider, which
//! checks one out of the bounded [`SessionPool`] and returns it when the request ends.

mod memory;
mod pool;

use async_trait::async_trait;
use jiff::Timestamp;
use micro_api::ApiError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryUserStore;
pub use pool::{Session, SessionPool, SessionProvider};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The client supplied fields of a user, for both creation and update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("{field} `{value}` already exists")]
    Conflict { field: &'static str, value: String },

    #[error("the session pool is shut down")]
    PoolClosed,

    #[error("the session is already closed")]
    SessionClosed,
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { .. } => ApiError::bad_request(e),
            StoreError::PoolClosed | StoreError::SessionClosed => ApiError::internal(e),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Users ordered by id, skipping the first `skip`.
    async fn list(&self, skip: usize, limit: usize) -> Result<Vec<User>, StoreError>;

    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Returns `None` when no user has this id.
    async fn update(&self, id: i64, user: NewUser) -> Result<Option<User>, StoreError>;

    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    async fn count_active(&self) -> Result<usize, StoreError>;

    /// Removes every user, returning how many there were.
    async fn clear(&self) -> Result<usize, StoreError>;
}
