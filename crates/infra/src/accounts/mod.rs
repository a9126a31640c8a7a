//! Account services: authentication, lifecycle, directory and audit.
//!
//! Services receive their repository, session store and hasher through
//! constructors so tests can substitute in-memory implementations.

use thiserror::Error;

use rxconsole_auth::{AuthzError, HashError};
use rxconsole_core::DomainError;

use crate::repository::StoreError;

pub mod authenticator;
pub mod directory;
pub mod lifecycle;
pub mod recorder;
pub mod validation;

pub use authenticator::{Authenticator, IssuedSession, Registration};
pub use directory::{Directory, EnrichedActivity, Page, Stats, UserQuery, UserSummary};
pub use lifecycle::{AccountLifecycle, CreateUserInput, UserChanges};
pub use recorder::ActivityRecorder;

pub type AccountResult<T> = Result<T, AccountError>;

/// Error returned by account services.
///
/// `Domain` errors are expected control flow and safe to show to the caller.
/// The other variants are internal failures: callers should log them and
/// respond with an opaque server error.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage failure: {0}")]
    Storage(String),

    /// The business action ran but its audit entry could not be written.
    #[error("audit log write failed: {0}")]
    Audit(String),

    #[error(transparent)]
    Hash(#[from] HashError),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(kind) => AccountError::Domain(DomainError::conflict(kind)),
            StoreError::Backend(msg) => AccountError::Storage(msg),
        }
    }
}

impl From<AuthzError> for AccountError {
    fn from(err: AuthzError) -> Self {
        AccountError::Domain(err.into())
    }
}

impl AccountError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            AccountError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use async_trait::async_trait;
    use rxconsole_auth::{
        Activity, NewActivity, NewOrganization, NewUser, Organization, OrganizationPatch,
        Principal, Role, Sha256Hasher, User, UserPatch,
    };
    use rxconsole_core::{OrganizationId, UserId};

    use crate::repository::{AccountRepository, InMemoryAccountRepository, StoreError};

    pub fn repo() -> Arc<dyn AccountRepository> {
        Arc::new(InMemoryAccountRepository::new())
    }

    pub fn hasher() -> Arc<Sha256Hasher> {
        Arc::new(Sha256Hasher)
    }

    pub fn principal(id: i64, role: Role) -> Principal {
        Principal {
            user_id: UserId::new(id),
            username: format!("actor{id}"),
            role,
            organization_id: None,
        }
    }

    /// In-memory repository whose activity log is unreachable.
    pub struct AuditOutage {
        inner: InMemoryAccountRepository,
    }

    impl AuditOutage {
        pub fn new() -> Self {
            Self {
                inner: InMemoryAccountRepository::new(),
            }
        }
    }

    #[async_trait]
    impl AccountRepository for AuditOutage {
        async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
            self.inner.get_user(id).await
        }
        async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
            self.inner.get_user_by_username(username).await
        }
        async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            self.inner.get_user_by_email(email).await
        }
        async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
            self.inner.create_user(new).await
        }
        async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<Option<User>, StoreError> {
            self.inner.update_user(id, patch).await
        }
        async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
            self.inner.delete_user(id).await
        }
        async fn list_users(&self) -> Result<Vec<User>, StoreError> {
            self.inner.list_users().await
        }
        async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
            self.inner.list_users_by_role(role).await
        }
        async fn list_users_by_organization(&self, org: OrganizationId) -> Result<Vec<User>, StoreError> {
            self.inner.list_users_by_organization(org).await
        }
        async fn list_users_by_manager(&self, manager: UserId) -> Result<Vec<User>, StoreError> {
            self.inner.list_users_by_manager(manager).await
        }
        async fn count_users(&self) -> Result<u64, StoreError> {
            self.inner.count_users().await
        }
        async fn get_organization(&self, id: OrganizationId) -> Result<Option<Organization>, StoreError> {
            self.inner.get_organization(id).await
        }
        async fn create_organization(&self, new: NewOrganization) -> Result<Organization, StoreError> {
            self.inner.create_organization(new).await
        }
        async fn update_organization(
            &self,
            id: OrganizationId,
            patch: OrganizationPatch,
        ) -> Result<Option<Organization>, StoreError> {
            self.inner.update_organization(id, patch).await
        }
        async fn delete_organization(&self, id: OrganizationId) -> Result<bool, StoreError> {
            self.inner.delete_organization(id).await
        }
        async fn list_organizations(&self) -> Result<Vec<Organization>, StoreError> {
            self.inner.list_organizations().await
        }
        async fn create_activity(&self, _new: NewActivity) -> Result<Activity, StoreError> {
            Err(StoreError::backend("activity table unavailable"))
        }
        async fn list_activities(&self, limit: Option<usize>) -> Result<Vec<Activity>, StoreError> {
            self.inner.list_activities(limit).await
        }
        async fn list_activities_by_user(&self, user_id: UserId) -> Result<Vec<Activity>, StoreError> {
            self.inner.list_activities_by_user(user_id).await
        }
    }
}
