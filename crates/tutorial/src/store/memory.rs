use std::collections::BTreeMap;

use async_trait::async_trait;
use jiff::Timestamp;
use tokio::sync::RwLock;
use tracing::debug;

use super::{NewUser, StoreError, User, UserStore};

/// A [`UserStore`] kept in process memory, with unique usernames and emails.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    users: BTreeMap<i64, User>,
}

impl State {
    /// Checks the unique columns against every user except `except`.
    fn check_unique(&self, user: &NewUser, except: Option<i64>) -> Result<(), StoreError> {
        let others = self.users.values().filter(|existing| Some(existing.id) != except);
        for existing in others {
            if existing.username == user.username {
                return Err(StoreError::Conflict { field: "username", value: user.username.clone() });
            }
            if existing.email == user.email {
                return Err(StoreError::Conflict { field: "email", value: user.email.clone() });
            }
        }
        Ok(())
    }
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().await.users.values().find(|user| user.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().await.users.values().find(|user| user.email == email).cloned())
    }

    async fn list(&self, skip: usize, limit: usize) -> Result<Vec<User>, StoreError> {
        Ok(self.state.read().await.users.values().skip(skip).take(limit).cloned().collect())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        state.check_unique(&user, None)?;

        state.next_id += 1;
        let now = Timestamp::now();
        let user = User {
            id: state.next_id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            is_active: user.is_active,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        debug!(id = user.id, username = %user.username, "user inserted");
        Ok(user)
    }

    async fn update(&self, id: i64, update: NewUser) -> Result<Option<User>, StoreError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&id) {
            return Ok(None);
        }
        state.check_unique(&update, Some(id))?;

        let Some(user) = state.users.get_mut(&id) else { return Ok(None) };
        user.username = update.username;
        user.email = update.email;
        user.full_name = update.full_name;
        user.is_active = update.is_active;
        user.updated_at = Timestamp::now();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.state.write().await.users.remove(&id).is_some())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.state.read().await.users.len())
    }

    async fn count_active(&self) -> Result<usize, StoreError> {
        Ok(self.state.read().await.users.values().filter(|user| user.is_active).count())
    }

    async fn clear(&self) -> Result<usize, StoreError> {
        let mut state = self.state.write().await;
        let removed = state.users.len();
        state.users.clear();
        Ok(removed)
    }
}
