use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use rxconsole_auth::SessionId;
use rxconsole_core::UserId;

use super::SessionStore;
use crate::repository::StoreError;

#[derive(Debug, Clone, Copy)]
struct Entry {
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Volatile session store for single-process deployments and tests.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: RwLock<HashMap<SessionId, Entry>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::backend("session store lock poisoned")
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, sid: &SessionId, user_id: UserId, ttl: Duration) -> Result<(), StoreError> {
        let entry = Entry {
            user_id,
            expires_at: Utc::now() + ttl,
        };
        self.inner.write().map_err(poisoned)?.insert(sid.clone(), entry);
        Ok(())
    }

    async fn get(&self, sid: &SessionId) -> Result<Option<UserId>, StoreError> {
        let map = self.inner.read().map_err(poisoned)?;
        let now = Utc::now();
        Ok(map.get(sid).filter(|e| e.is_live(now)).map(|e| e.user_id))
    }

    async fn delete(&self, sid: &SessionId) -> Result<Option<UserId>, StoreError> {
        let removed = self.inner.write().map_err(poisoned)?.remove(sid);
        let now = Utc::now();
        Ok(removed.filter(|e| e.is_live(now)).map(|e| e.user_id))
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        let now = Utc::now();
        let before = map.len();
        map.retain(|_, e| e.is_live(now));
        Ok((before - map.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let store = InMemorySessionStore::new();
        let sid = SessionId::generate();

        store.put(&sid, UserId::new(7), Duration::hours(1)).await.unwrap();
        assert_eq!(store.get(&sid).await.unwrap(), Some(UserId::new(7)));

        assert_eq!(store.delete(&sid).await.unwrap(), Some(UserId::new(7)));
        assert_eq!(store.get(&sid).await.unwrap(), None);
        // Second delete is a harmless no-op.
        assert_eq!(store.delete(&sid).await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_session_reads_as_missing() {
        let store = InMemorySessionStore::new();
        let sid = SessionId::generate();

        store.put(&sid, UserId::new(1), Duration::seconds(0)).await.unwrap();
        assert_eq!(store.get(&sid).await.unwrap(), None);
        assert_eq!(store.delete(&sid).await.unwrap(), None);
    }

    #[tokio::test]
    async fn purge_removes_only_expired() {
        let store = InMemorySessionStore::new();
        let live = SessionId::generate();
        let dead = SessionId::generate();

        store.put(&live, UserId::new(1), Duration::hours(1)).await.unwrap();
        store.put(&dead, UserId::new(2), Duration::seconds(-5)).await.unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.get(&live).await.unwrap(), Some(UserId::new(1)));
    }
}
