use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use micro_api::ApiError;
use micro_api::dependency::{Provide, Provided, ProviderInput};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

use super::{StoreError, UserStore};

/// A bounded set of sessions over one [`UserStore`].
///
/// Built explicitly at process start with [`SessionPool::init`] and stopped with
/// [`SessionPool::shutdown`]; cloning shares the same pool.
#[derive(Clone)]
pub struct SessionPool {
    store: Arc<dyn UserStore>,
    permits: Arc<Semaphore>,
    size: usize,
}

impl SessionPool {
    pub fn init(store: Arc<dyn UserStore>, size: usize) -> Self {
        info!(size, "session pool initialized");
        Self { store, permits: Arc::new(Semaphore::new(size)), size }
    }

    /// Waits for a free session.
    pub async fn acquire(&self) -> Result<Session, StoreError> {
        let permit = Arc::clone(&self.permits).acquire_owned().await.map_err(|_| StoreError::PoolClosed)?;
        debug!(available = self.permits.available_permits(), "session acquired");
        Ok(Session { store: Arc::clone(&self.store), permit: Arc::new(Mutex::new(Some(permit))) })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Sessions not checked out at the moment.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Refuses new sessions; sessions already handed out stay usable until closed.
    pub fn shutdown(&self) {
        self.permits.close();
        info!("session pool shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.permits.is_closed()
    }
}

impl fmt::Debug for SessionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionPool").field("size", &self.size).field("available", &self.available()).finish()
    }
}

/// One checked out session. Clones share the checkout; closing any clone returns it to the pool.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn UserStore>,
    permit: Arc<Mutex<Option<OwnedSemaphorePermit>>>,
}

impl Session {
    pub fn store(&self) -> Result<&dyn UserStore, StoreError> {
        if self.is_open() { Ok(self.store.as_ref()) } else { Err(StoreError::SessionClosed) }
    }

    pub fn is_open(&self) -> bool {
        self.permit.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn close(&self) {
        if self.permit.lock().unwrap_or_else(PoisonError::into_inner).take().is_some() {
            debug!("session closed");
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("open", &self.is_open()).finish()
    }
}

/// Provides a [`Session`] per request and closes it when the request ends.
#[derive(Debug)]
pub struct SessionProvider {
    pool: SessionPool,
}

impl SessionProvider {
    pub fn new(pool: SessionPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Provide for SessionProvider {
    async fn provide(&self, _input: ProviderInput) -> Result<Provided, ApiError> {
        let session = self.pool.acquire().await?;
        let handle = session.clone();
        Ok(Provided::Scoped { value: Arc::new(session), teardown: Box::new(move || handle.close()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockUserStore;
    use std::time::Duration;

    fn pool(size: usize) -> SessionPool {
        SessionPool::init(Arc::new(MockUserStore::new()), size)
    }

    #[tokio::test]
    async fn closing_returns_the_session() {
        let pool = pool(1);
        let session = pool.acquire().await.unwrap();
        assert_eq!(pool.available(), 0);
        assert!(tokio::time::timeout(Duration::from_millis(20), pool.acquire()).await.is_err());

        session.clone().close();
        assert!(!session.is_open());
        assert!(matches!(session.store(), Err(StoreError::SessionClosed)));
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn shutdown_refuses_new_sessions() {
        let pool = pool(2);
        pool.shutdown();
        assert!(pool.is_shut_down());
        assert_eq!(pool.acquire().await.unwrap_err(), StoreError::PoolClosed);
    }

    #[tokio::test]
    async fn store_reached_through_an_open_session() {
        let mut store = MockUserStore::new();
        store.expect_count().times(1).returning(|| Ok(3));
        let pool = SessionPool::init(Arc::new(store), 1);

        let session = pool.acquire().await.unwrap();
        assert_eq!(session.store().unwrap().count().await.unwrap(), 3);
    }
}
