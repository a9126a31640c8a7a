use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use rxconsole_auth::{
    Activity, NewActivity, NewOrganization, NewUser, Organization, OrganizationPatch, Role, User,
    UserPatch,
};
use rxconsole_core::{ActivityId, ConflictKind, OrganizationId, UserId};

use super::{AccountRepository, StoreError};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    organizations: BTreeMap<OrganizationId, Organization>,
    activities: Vec<Activity>,
    last_user_id: i64,
    last_organization_id: i64,
    last_activity_id: i64,
}

impl State {
    /// Uniqueness check, run under the same write lock as the mutation.
    fn check_unique(&self, username: Option<&str>, email: Option<&str>, except: Option<UserId>) -> Result<(), StoreError> {
        for user in self.users.values().filter(|u| Some(u.id) != except) {
            if username.is_some_and(|n| n == user.username) {
                return Err(StoreError::Conflict(ConflictKind::UsernameTaken));
            }
            if email.is_some_and(|e| e == user.email) {
                return Err(StoreError::Conflict(ConflictKind::EmailTaken));
            }
        }
        Ok(())
    }
}

/// In-memory account repository for tests/dev.
///
/// Every mutation happens under one write lock, so a record is never observed
/// half-updated and uniqueness checks cannot race with inserts.
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    inner: RwLock<State>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::backend("account repository lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::backend("account repository lock poisoned"))
    }

    fn users_where(&self, pred: impl Fn(&User) -> bool) -> Result<Vec<User>, StoreError> {
        let state = self.read()?;
        Ok(state.users.values().filter(|u| pred(u)).cloned().collect())
    }

    fn activities_where(
        &self,
        pred: impl Fn(&Activity) -> bool,
        limit: Option<usize>,
    ) -> Result<Vec<Activity>, StoreError> {
        let state = self.read()?;
        let mut items: Vec<Activity> = state.activities.iter().filter(|a| pred(a)).cloned().collect();
        items.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        if let Some(limit) = limit {
            items.truncate(limit);
        }
        Ok(items)
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let state = self.read()?;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.read()?;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut state = self.write()?;
        state.check_unique(Some(&new.username), Some(&new.email), None)?;

        state.last_user_id += 1;
        let user = User::from_new(UserId::new(state.last_user_id), new, Utc::now());
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let mut state = self.write()?;
        if !state.users.contains_key(&id) {
            return Ok(None);
        }
        if patch.is_empty() {
            return Ok(state.users.get(&id).cloned());
        }
        state.check_unique(None, patch.email.as_deref(), Some(id))?;

        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        user.apply(&patch);
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        Ok(self.write()?.users.remove(&id).is_some())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.users_where(|_| true)
    }

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        self.users_where(|u| u.role == role)
    }

    async fn list_users_by_organization(&self, org: OrganizationId) -> Result<Vec<User>, StoreError> {
        self.users_where(|u| u.organization_id == Some(org))
    }

    async fn list_users_by_manager(&self, manager: UserId) -> Result<Vec<User>, StoreError> {
        self.users_where(|u| u.manager_id == Some(manager))
    }

    async fn count_users(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.users.len() as u64)
    }

    async fn get_organization(&self, id: OrganizationId) -> Result<Option<Organization>, StoreError> {
        Ok(self.read()?.organizations.get(&id).cloned())
    }

    async fn create_organization(&self, new: NewOrganization) -> Result<Organization, StoreError> {
        let mut state = self.write()?;
        state.last_organization_id += 1;
        let org = Organization {
            id: OrganizationId::new(state.last_organization_id),
            name: new.name,
            kind: new.kind,
            created_at: Utc::now(),
        };
        state.organizations.insert(org.id, org.clone());
        Ok(org)
    }

    async fn update_organization(
        &self,
        id: OrganizationId,
        patch: OrganizationPatch,
    ) -> Result<Option<Organization>, StoreError> {
        let mut state = self.write()?;
        Ok(state.organizations.get_mut(&id).map(|org| {
            org.apply(&patch);
            org.clone()
        }))
    }

    async fn delete_organization(&self, id: OrganizationId) -> Result<bool, StoreError> {
        Ok(self.write()?.organizations.remove(&id).is_some())
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        Ok(self.read()?.organizations.values().cloned().collect())
    }

    async fn create_activity(&self, new: NewActivity) -> Result<Activity, StoreError> {
        let mut state = self.write()?;
        state.last_activity_id += 1;
        // Never earlier than the previous entry, even if the wall clock steps back.
        let timestamp = match state.activities.last() {
            Some(prev) => prev.timestamp.max(Utc::now()),
            None => Utc::now(),
        };
        let activity = Activity {
            id: ActivityId::new(state.last_activity_id),
            user_id: new.user_id,
            action: new.action,
            description: new.description,
            timestamp,
        };
        state.activities.push(activity.clone());
        Ok(activity)
    }

    async fn list_activities(&self, limit: Option<usize>) -> Result<Vec<Activity>, StoreError> {
        self.activities_where(|_| true, limit)
    }

    async fn list_activities_by_user(&self, user_id: UserId) -> Result<Vec<Activity>, StoreError> {
        self.activities_where(|a| a.user_id == Some(user_id), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rxconsole_auth::{ActivityAction, OrganizationType, UserStatus};

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "digest".to_string(),
            full_name: format!("{username} full"),
            email: email.to_string(),
            role: Role::MedicalRepresentative,
            status: UserStatus::Active,
            organization_id: None,
            region: Some("West".to_string()),
            state: None,
            city: None,
            pincode: None,
            address: None,
            manager_id: None,
        }
    }

    fn activity(action: ActivityAction) -> NewActivity {
        NewActivity {
            user_id: Some(UserId::new(1)),
            action,
            description: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_and_get_finds_them() {
        let repo = InMemoryAccountRepository::new();
        let a = repo.create_user(new_user("a", "a@x.io")).await.unwrap();
        let b = repo.create_user(new_user("b", "b@x.io")).await.unwrap();

        assert_eq!(a.id, UserId::new(1));
        assert_eq!(b.id, UserId::new(2));
        assert_eq!(repo.get_user(b.id).await.unwrap(), Some(b.clone()));
        assert_eq!(repo.get_user_by_username("a").await.unwrap(), Some(a));
        assert_eq!(repo.get_user_by_email("b@x.io").await.unwrap(), Some(b));
        assert_eq!(repo.get_user(UserId::new(99)).await.unwrap(), None);
        assert_eq!(repo.count_users().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn duplicate_username_or_email_leaves_store_unchanged() {
        let repo = InMemoryAccountRepository::new();
        repo.create_user(new_user("a", "a@x.io")).await.unwrap();

        let err = repo.create_user(new_user("a", "other@x.io")).await.unwrap_err();
        assert_eq!(err, StoreError::Conflict(ConflictKind::UsernameTaken));

        let err = repo.create_user(new_user("other", "a@x.io")).await.unwrap_err();
        assert_eq!(err, StoreError::Conflict(ConflictKind::EmailTaken));

        assert_eq!(repo.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_rejects_email_owned_by_someone_else() {
        let repo = InMemoryAccountRepository::new();
        let a = repo.create_user(new_user("a", "a@x.io")).await.unwrap();
        repo.create_user(new_user("b", "b@x.io")).await.unwrap();

        let patch = UserPatch {
            email: Some("b@x.io".into()),
            ..Default::default()
        };
        assert_eq!(
            repo.update_user(a.id, patch).await.unwrap_err(),
            StoreError::Conflict(ConflictKind::EmailTaken)
        );

        // Re-saving your own email is not a conflict.
        let patch = UserPatch {
            email: Some("a@x.io".into()),
            ..Default::default()
        };
        assert!(repo.update_user(a.id, patch).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn empty_update_is_noop_and_missing_id_is_none() {
        let repo = InMemoryAccountRepository::new();
        let a = repo.create_user(new_user("a", "a@x.io")).await.unwrap();

        assert_eq!(repo.update_user(a.id, UserPatch::default()).await.unwrap(), Some(a));
        assert_eq!(
            repo.update_user(UserId::new(42), UserPatch::default()).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let repo = InMemoryAccountRepository::new();
        let a = repo.create_user(new_user("a", "a@x.io")).await.unwrap();
        assert!(repo.delete_user(a.id).await.unwrap());
        assert!(!repo.delete_user(a.id).await.unwrap());
        assert_eq!(repo.get_user(a.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn scoped_listings_filter_by_reference() {
        let repo = InMemoryAccountRepository::new();
        let org = repo
            .create_organization(NewOrganization {
                name: "Acme Pharma".into(),
                kind: OrganizationType::PharmaCompany,
            })
            .await
            .unwrap();

        let boss = repo.create_user(new_user("boss", "boss@x.io")).await.unwrap();
        let mut rep = new_user("rep", "rep@x.io");
        rep.organization_id = Some(org.id);
        rep.manager_id = Some(boss.id);
        rep.role = Role::AreaSalesManager;
        let rep = repo.create_user(rep).await.unwrap();

        assert_eq!(repo.list_users_by_organization(org.id).await.unwrap(), vec![rep.clone()]);
        assert_eq!(repo.list_users_by_manager(boss.id).await.unwrap(), vec![rep.clone()]);
        assert_eq!(repo.list_users_by_role(Role::AreaSalesManager).await.unwrap(), vec![rep]);
        assert_eq!(repo.list_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn activities_come_back_newest_first_and_capped() {
        let repo = InMemoryAccountRepository::new();
        for action in [
            ActivityAction::Register,
            ActivityAction::Login,
            ActivityAction::Logout,
            ActivityAction::Login,
        ] {
            repo.create_activity(activity(action)).await.unwrap();
        }

        let top = repo.list_activities(Some(3)).await.unwrap();
        let ids: Vec<i64> = top.iter().map(|a| a.id.get()).collect();
        assert_eq!(ids, vec![4, 3, 2]);
        assert_eq!(repo.list_activities(None).await.unwrap().len(), 4);
        assert_eq!(repo.list_activities_by_user(UserId::new(1)).await.unwrap().len(), 4);
        assert!(repo.list_activities_by_user(UserId::new(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn organization_update_and_delete() {
        let repo = InMemoryAccountRepository::new();
        let org = repo
            .create_organization(NewOrganization {
                name: "Old".into(),
                kind: OrganizationType::Distributor,
            })
            .await
            .unwrap();

        let updated = repo
            .update_organization(
                org.id,
                OrganizationPatch {
                    name: Some("New".into()),
                    kind: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "New");
        assert_eq!(updated.kind, OrganizationType::Distributor);

        assert!(repo.delete_organization(org.id).await.unwrap());
        assert_eq!(
            repo.update_organization(org.id, OrganizationPatch::default()).await.unwrap(),
            None
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: updating only fullName leaves every other field bit-identical.
        #[test]
        fn full_name_update_touches_nothing_else(name in "[A-Za-z][A-Za-z ]{0,40}") {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let repo = InMemoryAccountRepository::new();
                let before = repo.create_user(new_user("a", "a@x.io")).await.unwrap();

                let patch = UserPatch { full_name: Some(name.clone()), ..Default::default() };
                let after = repo.update_user(before.id, patch).await.unwrap().unwrap();

                prop_assert_eq!(&after.full_name, &name);
                prop_assert_eq!(User { full_name: before.full_name.clone(), ..after }, before);
                Ok(())
            })?;
        }
    }
}
