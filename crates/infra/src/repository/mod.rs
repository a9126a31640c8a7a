//! Account repository boundary.
//!
//! One contract for users, organizations and activities, with an in-memory
//! variant for tests/dev and a Postgres variant for production. Services
//! depend only on the trait.
//!
//! Contract shared by every implementation:
//! - `get*` return `Ok(None)` for absence, never an error.
//! - `create*` return the fully materialized record with its assigned id.
//! - `update*` with an empty patch returns the current record unchanged;
//!   on a missing id it returns `Ok(None)`.
//! - `delete*` report whether a record was actually removed.
//! - Username and email uniqueness is enforced atomically with the write and
//!   reported as [`StoreError::Conflict`].

use async_trait::async_trait;
use thiserror::Error;

use rxconsole_auth::{
    Activity, NewActivity, NewOrganization, NewUser, Organization, OrganizationPatch, Role, User,
    UserPatch,
};
use rxconsole_core::{ConflictKind, OrganizationId, UserId};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryAccountRepository;
pub use postgres::PostgresAccountRepository;

/// Storage-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A uniqueness rule was hit at write time.
    #[error("unique constraint violated: {0}")]
    Conflict(ConflictKind),

    /// The backend failed (I/O, connection, decode, poisoned lock).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    // Users

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;
    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<Option<User>, StoreError>;
    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError>;
    /// All users, ordered by id.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, StoreError>;
    async fn list_users_by_organization(&self, org: OrganizationId) -> Result<Vec<User>, StoreError>;
    async fn list_users_by_manager(&self, manager: UserId) -> Result<Vec<User>, StoreError>;
    async fn count_users(&self) -> Result<u64, StoreError>;

    // Organizations

    async fn get_organization(&self, id: OrganizationId) -> Result<Option<Organization>, StoreError>;
    async fn create_organization(&self, new: NewOrganization) -> Result<Organization, StoreError>;
    async fn update_organization(
        &self,
        id: OrganizationId,
        patch: OrganizationPatch,
    ) -> Result<Option<Organization>, StoreError>;
    async fn delete_organization(&self, id: OrganizationId) -> Result<bool, StoreError>;
    /// All organizations, ordered by id.
    async fn list_organizations(&self) -> Result<Vec<Organization>, StoreError>;

    // Activities (append-only)

    /// Append an entry. The timestamp is assigned here, never by the caller.
    async fn create_activity(&self, new: NewActivity) -> Result<Activity, StoreError>;
    /// Newest first, by `(timestamp, id)` descending, optionally capped.
    async fn list_activities(&self, limit: Option<usize>) -> Result<Vec<Activity>, StoreError>;
    /// Entries for one user, same ordering.
    async fn list_activities_by_user(&self, user_id: UserId) -> Result<Vec<Activity>, StoreError>;
}
