//! Read side: user listings, aggregate stats and the activity feed.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;

use rxconsole_auth::{
    can_view, Activity, OrganizationType, Principal, Role, User, UserStatus,
};
use rxconsole_core::{DomainError, OrganizationId, UserId};

use super::AccountResult;
use crate::repository::AccountRepository;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;
pub const DEFAULT_ACTIVITY_LIMIT: usize = 50;
pub const MAX_ACTIVITY_LIMIT: usize = 500;

/// User listing filters. All present filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub role: Option<Role>,
    pub organization_id: Option<OrganizationId>,
    pub manager_id: Option<UserId>,
    pub status: Option<UserStatus>,
    /// Case-insensitive substring over username, full name and email.
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl UserQuery {
    fn matches(&self, user: &User, needle: Option<&str>) -> bool {
        if self.role.is_some_and(|r| r != user.role) {
            return false;
        }
        if self.status.is_some_and(|s| s != user.status) {
            return false;
        }
        if self.organization_id.is_some() && self.organization_id != user.organization_id {
            return false;
        }
        if self.manager_id.is_some() && self.manager_id != user.manager_id {
            return false;
        }
        match needle {
            Some(needle) => [&user.username, &user.full_name, &user.email]
                .iter()
                .any(|field| field.to_lowercase().contains(needle)),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
}

/// An activity plus a minimal view of the acting user, when it still exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedActivity {
    #[serde(flatten)]
    pub activity: Activity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserCounts {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub pending: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationCounts {
    pub total: u64,
    pub by_type: BTreeMap<&'static str, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub users: UserCounts,
    pub organizations: OrganizationCounts,
    /// ACTIVE users per role. Every role is listed, zero or not.
    pub active_roles: BTreeMap<&'static str, u64>,
}

pub struct Directory {
    repo: Arc<dyn AccountRepository>,
}

impl Directory {
    pub fn new(repo: Arc<dyn AccountRepository>) -> Self {
        Self { repo }
    }

    /// Users visible to `viewer` that match `query`, ordered by id.
    pub async fn list_users(&self, viewer: &Principal, query: UserQuery) -> AccountResult<Page<User>> {
        let page = query.page.unwrap_or(1);
        if page == 0 {
            return Err(DomainError::validation("page must be at least 1").into());
        }
        let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);
        if per_page == 0 {
            return Err(DomainError::validation("perPage must be at least 1").into());
        }
        let per_page = per_page.min(MAX_PER_PAGE);

        let base = if let Some(org) = query.organization_id {
            self.repo.list_users_by_organization(org).await?
        } else if let Some(manager) = query.manager_id {
            self.repo.list_users_by_manager(manager).await?
        } else if let Some(role) = query.role {
            self.repo.list_users_by_role(role).await?
        } else {
            self.repo.list_users().await?
        };

        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let mut matched: Vec<User> = base
            .into_iter()
            .filter(|u| can_view(viewer, u) && query.matches(u, needle.as_deref()))
            .collect();
        matched.sort_by_key(|u| u.id);

        let total = matched.len() as u64;
        let skip = (page as usize - 1).saturating_mul(per_page as usize);
        let items = matched.into_iter().skip(skip).take(per_page as usize).collect();

        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }

    /// Users outside the viewer's scope read as absent.
    pub async fn get_user(&self, viewer: &Principal, id: UserId) -> AccountResult<User> {
        match self.repo.get_user(id).await? {
            Some(user) if can_view(viewer, &user) => Ok(user),
            _ => Err(DomainError::not_found("user").into()),
        }
    }

    pub async fn stats(&self) -> AccountResult<Stats> {
        let users = self.repo.list_users().await?;
        let organizations = self.repo.list_organizations().await?;

        let mut stats = Stats::default();
        for role in Role::ALL {
            stats.active_roles.insert(role.as_str(), 0);
        }
        for kind in OrganizationType::ALL {
            stats.organizations.by_type.insert(kind.as_str(), 0);
        }

        for user in &users {
            stats.users.total += 1;
            match user.status {
                UserStatus::Active => {
                    stats.users.active += 1;
                    *stats.active_roles.entry(user.role.as_str()).or_default() += 1;
                }
                UserStatus::Inactive => stats.users.inactive += 1,
                UserStatus::Pending => stats.users.pending += 1,
            }
        }
        for org in &organizations {
            stats.organizations.total += 1;
            *stats.organizations.by_type.entry(org.kind.as_str()).or_default() += 1;
        }

        Ok(stats)
    }

    /// Newest first. `limit` defaults to 50 and is capped at 500.
    pub async fn activities(&self, limit: Option<usize>) -> AccountResult<Vec<EnrichedActivity>> {
        let limit = limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT).min(MAX_ACTIVITY_LIMIT);
        let items = self.repo.list_activities(Some(limit)).await?;
        Ok(self.enrich(items).await)
    }

    pub async fn user_activities(&self, user_id: UserId) -> AccountResult<Vec<EnrichedActivity>> {
        if self.repo.get_user(user_id).await?.is_none() {
            return Err(DomainError::not_found("user").into());
        }
        let items = self.repo.list_activities_by_user(user_id).await?;
        Ok(self.enrich(items).await)
    }

    /// Attach the acting user to each entry. A failed or empty lookup omits
    /// the user; it never fails the listing.
    async fn enrich(&self, items: Vec<Activity>) -> Vec<EnrichedActivity> {
        let mut seen: HashMap<UserId, Option<UserSummary>> = HashMap::new();
        let mut out = Vec::with_capacity(items.len());

        for activity in items {
            let user = match activity.user_id {
                None => None,
                Some(id) => match seen.get(&id) {
                    Some(cached) => cached.clone(),
                    None => {
                        let summary = match self.repo.get_user(id).await {
                            Ok(found) => found.map(|u| UserSummary {
                                id: u.id,
                                username: u.username,
                                full_name: u.full_name,
                            }),
                            Err(e) => {
                                tracing::warn!(error = %e, user_id = %id, "activity enrichment lookup failed");
                                None
                            }
                        };
                        seen.insert(id, summary.clone());
                        summary
                    }
                },
            };
            out.push(EnrichedActivity { activity, user });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{testing, ActivityRecorder};
    use rxconsole_auth::{ActivityAction, NewOrganization, NewUser};

    fn new_user(username: &str, role: Role, org: Option<OrganizationId>) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "digest".to_string(),
            full_name: format!("{username} Example"),
            email: format!("{username}@example.com"),
            role,
            status: UserStatus::Active,
            organization_id: org,
            region: None,
            state: None,
            city: None,
            pincode: None,
            address: None,
            manager_id: None,
        }
    }

    #[tokio::test]
    async fn organization_filter_returns_exact_members() {
        let repo = testing::repo();
        let org = repo
            .create_organization(NewOrganization {
                name: "Acme Pharma".into(),
                kind: OrganizationType::PharmaCompany,
            })
            .await
            .unwrap();
        let member = repo
            .create_user(new_user("bob", Role::MedicalRepresentative, Some(org.id)))
            .await
            .unwrap();
        repo.create_user(new_user("carol", Role::MedicalRepresentative, None))
            .await
            .unwrap();

        let directory = Directory::new(repo);
        let page = directory
            .list_users(
                &testing::principal(1, Role::SuperAdmin),
                UserQuery {
                    organization_id: Some(org.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, member.id);
    }

    #[tokio::test]
    async fn listing_is_scoped_searched_and_paged() {
        let repo = testing::repo();
        let org = OrganizationId::new(7);
        let viewer = repo
            .create_user(new_user("viewer", Role::AreaSalesManager, Some(org)))
            .await
            .unwrap();
        for i in 0..5 {
            repo.create_user(new_user(&format!("rep{i}"), Role::MedicalRepresentative, Some(org)))
                .await
                .unwrap();
        }
        repo.create_user(new_user("outsider", Role::MedicalRepresentative, None))
            .await
            .unwrap();

        let directory = Directory::new(repo);
        let viewer = Principal::from(&viewer);

        let all = directory.list_users(&viewer, UserQuery::default()).await.unwrap();
        assert_eq!(all.total, 6);
        assert!(all.items.iter().all(|u| u.username != "outsider"));

        let page = directory
            .list_users(
                &viewer,
                UserQuery {
                    search: Some("REP".into()),
                    page: Some(2),
                    per_page: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        let names: Vec<&str> = page.items.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["rep2", "rep3"]);

        let capped = directory
            .list_users(
                &viewer,
                UserQuery {
                    per_page: Some(1000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(capped.per_page, MAX_PER_PAGE);

        assert!(directory
            .list_users(
                &viewer,
                UserQuery {
                    page: Some(0),
                    ..Default::default()
                },
            )
            .await
            .is_err());
    }

    #[tokio::test]
    async fn out_of_scope_users_read_as_missing() {
        let repo = testing::repo();
        let hidden = repo
            .create_user(new_user("hidden", Role::MedicalRepresentative, Some(OrganizationId::new(2))))
            .await
            .unwrap();
        let directory = Directory::new(repo);

        let rep = testing::principal(50, Role::MedicalRepresentative);
        let err = directory.get_user(&rep, hidden.id).await.unwrap_err();
        assert_eq!(err.domain(), Some(&DomainError::NotFound("user")));

        let head = testing::principal(51, Role::BusinessUnitHead);
        assert_eq!(directory.get_user(&head, hidden.id).await.unwrap().id, hidden.id);
    }

    #[tokio::test]
    async fn stats_count_every_bucket() {
        let repo = testing::repo();
        repo.create_user(new_user("a", Role::SuperAdmin, None)).await.unwrap();
        let mut inactive = new_user("b", Role::AreaSalesManager, None);
        inactive.status = UserStatus::Inactive;
        repo.create_user(inactive).await.unwrap();
        let mut pending = new_user("c", Role::MedicalRepresentative, None);
        pending.status = UserStatus::Pending;
        repo.create_user(pending).await.unwrap();
        repo.create_organization(NewOrganization {
            name: "Distro".into(),
            kind: OrganizationType::Distributor,
        })
        .await
        .unwrap();

        let stats = Directory::new(repo).stats().await.unwrap();
        assert_eq!(
            stats.users,
            UserCounts {
                total: 3,
                active: 1,
                inactive: 1,
                pending: 1
            }
        );
        assert_eq!(stats.organizations.total, 1);
        assert_eq!(stats.organizations.by_type["DISTRIBUTOR"], 1);
        assert_eq!(stats.organizations.by_type["SYSTEM"], 0);
        assert_eq!(stats.active_roles.len(), Role::ALL.len());
        assert_eq!(stats.active_roles["SUPER_ADMIN"], 1);
        assert_eq!(stats.active_roles["AREA_SALES_MANAGER"], 0);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["organizations"]["byType"]["DISTRIBUTOR"], 1);
        assert_eq!(json["activeRoles"]["SUPER_ADMIN"], 1);
    }

    #[tokio::test]
    async fn limit_returns_newest_first_and_enriches_best_effort() {
        let repo = testing::repo();
        let alice = repo
            .create_user(new_user("alice", Role::SuperAdmin, None))
            .await
            .unwrap();
        let recorder = ActivityRecorder::new(repo.clone());
        for (i, action) in [
            ActivityAction::Register,
            ActivityAction::Login,
            ActivityAction::CreateUser,
            ActivityAction::Logout,
        ]
        .into_iter()
        .enumerate()
        {
            recorder.record(Some(alice.id), action, format!("event {i}")).await.unwrap();
        }
        recorder
            .record(Some(UserId::new(999)), ActivityAction::DeleteUser, "ghost")
            .await
            .unwrap();

        let directory = Directory::new(repo);
        let feed = directory.activities(Some(3)).await.unwrap();

        let descriptions: Vec<&str> = feed.iter().map(|e| e.activity.description.as_str()).collect();
        assert_eq!(descriptions, vec!["ghost", "event 3", "event 2"]);
        assert!(feed[0].user.is_none());
        assert_eq!(feed[1].user.as_ref().unwrap().username, "alice");

        let json = serde_json::to_value(&feed[0]).unwrap();
        assert!(json.get("user").is_none());
        assert_eq!(json["action"], "DELETE_USER");
    }

    #[tokio::test]
    async fn per_user_feed_requires_existing_user() {
        let repo = testing::repo();
        let directory = Directory::new(repo);
        let err = directory.user_activities(UserId::new(5)).await.unwrap_err();
        assert_eq!(err.domain(), Some(&DomainError::NotFound("user")));
    }
}
