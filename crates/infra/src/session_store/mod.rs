//! Server-side session state.
//!
//! A session binds an opaque [`SessionId`] to a user id until it expires or is
//! deleted. Reads after expiry behave exactly like reads of a missing session.

use async_trait::async_trait;
use chrono::Duration;

use rxconsole_auth::SessionId;
use rxconsole_core::UserId;

use crate::repository::StoreError;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemorySessionStore;
pub use postgres::PostgresSessionStore;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Bind `sid` to `user_id` for `ttl`. Overwrites an existing binding.
    async fn put(&self, sid: &SessionId, user_id: UserId, ttl: Duration) -> Result<(), StoreError>;

    /// The bound user, or `None` when the session is missing or expired.
    async fn get(&self, sid: &SessionId) -> Result<Option<UserId>, StoreError>;

    /// Remove the session. Returns the bound user when a live session was removed.
    async fn delete(&self, sid: &SessionId) -> Result<Option<UserId>, StoreError>;

    /// Drop every expired session, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64, StoreError>;
}
