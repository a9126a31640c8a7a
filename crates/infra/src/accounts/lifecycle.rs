//! Administrative create/update/delete of users and organizations.
//!
//! Role-set membership is checked by the HTTP gate before these are called.
//! What stays here is the policy that depends on the target record: rank
//! escalation, organization scope, self-delete and uniqueness.
//!
//! A target the actor cannot see in the directory is reported as not found,
//! the same answer the directory gives.

use std::sync::Arc;

use rxconsole_auth::{
    can_view, ensure_can_assign, ensure_can_manage, ensure_can_place, permissions::DIRECTORY_WIDE,
    ActivityAction, CredentialHasher, NewOrganization, NewUser, Organization, OrganizationPatch,
    OrganizationType, Principal, Role, User, UserPatch, UserStatus,
};
use rxconsole_core::{ConflictKind, DomainError, OrganizationId, UserId};

use super::{validation, AccountResult, ActivityRecorder};
use crate::repository::AccountRepository;

pub const SYSTEM_ORGANIZATION_NAME: &str = "System";

/// Administrative user creation. `password` is plaintext.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub organization_id: Option<OrganizationId>,
    pub region: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
    pub address: Option<String>,
    pub manager_id: Option<UserId>,
}

/// Requested user changes, with the same presence rules as [`UserPatch`].
/// `password` is plaintext and hashed before it reaches storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub organization_id: Option<Option<OrganizationId>>,
    pub region: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub pincode: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub manager_id: Option<Option<UserId>>,
}

impl UserChanges {
    /// Names of the provided fields, in wire spelling.
    fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut push = |present: bool, name: &'static str| {
            if present {
                names.push(name);
            }
        };
        push(self.password.is_some(), "password");
        push(self.full_name.is_some(), "fullName");
        push(self.email.is_some(), "email");
        push(self.role.is_some(), "role");
        push(self.status.is_some(), "status");
        push(self.organization_id.is_some(), "organizationId");
        push(self.region.is_some(), "region");
        push(self.state.is_some(), "state");
        push(self.city.is_some(), "city");
        push(self.pincode.is_some(), "pincode");
        push(self.address.is_some(), "address");
        push(self.manager_id.is_some(), "managerId");
        names
    }
}

pub struct AccountLifecycle {
    repo: Arc<dyn AccountRepository>,
    hasher: Arc<dyn CredentialHasher>,
    recorder: ActivityRecorder,
}

impl AccountLifecycle {
    pub fn new(repo: Arc<dyn AccountRepository>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            recorder: ActivityRecorder::new(repo.clone()),
            repo,
            hasher,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────

    /// Actors outside the directory-wide roles create users in their own
    /// organization; an omitted `organization_id` defaults to it.
    pub async fn create_user(&self, actor: &Principal, mut input: CreateUserInput) -> AccountResult<User> {
        validation::username(&input.username)?;
        validation::full_name(&input.full_name)?;
        validation::email(&input.email)?;
        validation::password(&input.password)?;
        ensure_can_assign(actor, input.role)?;
        if input.organization_id.is_none() && !DIRECTORY_WIDE.contains(actor.role) {
            input.organization_id = actor.organization_id;
        }
        ensure_can_place(actor, input.organization_id)?;

        if self.repo.get_user_by_username(&input.username).await?.is_some() {
            return Err(DomainError::conflict(ConflictKind::UsernameTaken).into());
        }
        if self.repo.get_user_by_email(&input.email).await?.is_some() {
            return Err(DomainError::conflict(ConflictKind::EmailTaken).into());
        }

        let password = self.hasher.digest(&input.password)?;
        let user = self
            .repo
            .create_user(NewUser {
                username: input.username,
                password,
                full_name: input.full_name,
                email: input.email,
                role: input.role,
                status: input.status,
                organization_id: input.organization_id,
                region: input.region,
                state: input.state,
                city: input.city,
                pincode: input.pincode,
                address: input.address,
                manager_id: input.manager_id,
            })
            .await?;

        self.recorder
            .record(
                Some(actor.user_id),
                ActivityAction::CreateUser,
                format!(
                    "{} created user {} with role {}",
                    actor.username, user.username, user.role
                ),
            )
            .await?;

        tracing::info!(actor = %actor.user_id, user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    /// Apply only the provided fields. An empty change set returns the
    /// current record and records nothing.
    pub async fn update_user(
        &self,
        actor: &Principal,
        id: UserId,
        changes: UserChanges,
    ) -> AccountResult<User> {
        let current = self.visible_user(actor, id).await?;

        if current.id != actor.user_id {
            ensure_can_manage(actor, current.role)?;
        }
        if let Some(organization_id) = changes.organization_id {
            if organization_id != current.organization_id {
                ensure_can_place(actor, organization_id)?;
            }
        }
        if let Some(role) = changes.role {
            if role != current.role {
                ensure_can_assign(actor, role)?;
            }
        }

        if let Some(name) = &changes.full_name {
            validation::full_name(name)?;
        }
        if let Some(password) = &changes.password {
            validation::password(password)?;
        }
        if changes.manager_id == Some(Some(id)) {
            return Err(DomainError::validation("a user cannot be their own manager").into());
        }
        if let Some(email) = &changes.email {
            validation::email(email)?;
            if let Some(other) = self.repo.get_user_by_email(email).await? {
                if other.id != id {
                    return Err(DomainError::conflict(ConflictKind::EmailTaken).into());
                }
            }
        }

        let fields = changes.field_names();
        let patch = UserPatch {
            password: changes
                .password
                .as_deref()
                .map(|p| self.hasher.digest(p))
                .transpose()?,
            full_name: changes.full_name,
            email: changes.email,
            role: changes.role,
            status: changes.status,
            organization_id: changes.organization_id,
            region: changes.region,
            state: changes.state,
            city: changes.city,
            pincode: changes.pincode,
            address: changes.address,
            manager_id: changes.manager_id,
            last_login: None,
        };
        if patch.is_empty() {
            return Ok(current);
        }

        let updated = self
            .repo
            .update_user(id, patch)
            .await?
            .ok_or(DomainError::not_found("user"))?;

        self.recorder
            .record(
                Some(actor.user_id),
                ActivityAction::UpdateUser,
                format!(
                    "{} updated user {} ({})",
                    actor.username,
                    updated.username,
                    fields.join(", ")
                ),
            )
            .await?;

        tracing::info!(actor = %actor.user_id, user_id = %id, ?fields, "user updated");
        Ok(updated)
    }

    pub async fn delete_user(&self, actor: &Principal, id: UserId) -> AccountResult<()> {
        let target = self.visible_user(actor, id).await?;

        if target.id == actor.user_id {
            return Err(DomainError::conflict(ConflictKind::SelfDelete).into());
        }
        ensure_can_manage(actor, target.role)?;

        if !self.repo.delete_user(id).await? {
            return Err(DomainError::not_found("user").into());
        }

        self.recorder
            .record(
                Some(actor.user_id),
                ActivityAction::DeleteUser,
                format!("{} deleted user {}", actor.username, target.username),
            )
            .await?;

        tracing::info!(actor = %actor.user_id, user_id = %id, "user deleted");
        Ok(())
    }

    async fn visible_user(&self, actor: &Principal, id: UserId) -> AccountResult<User> {
        match self.repo.get_user(id).await? {
            Some(user) if can_view(actor, &user) => Ok(user),
            _ => Err(DomainError::not_found("user").into()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Organizations
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_organization(
        &self,
        actor: &Principal,
        new: NewOrganization,
    ) -> AccountResult<Organization> {
        validation::organization_name(&new.name)?;
        let org = self.repo.create_organization(new).await?;

        self.recorder
            .record(
                Some(actor.user_id),
                ActivityAction::CreateOrganization,
                format!("{} created organization {} ({})", actor.username, org.name, org.kind),
            )
            .await?;

        tracing::info!(actor = %actor.user_id, organization_id = %org.id, "organization created");
        Ok(org)
    }

    pub async fn update_organization(
        &self,
        actor: &Principal,
        id: OrganizationId,
        patch: OrganizationPatch,
    ) -> AccountResult<Organization> {
        if let Some(name) = &patch.name {
            validation::organization_name(name)?;
        }
        let current = self
            .repo
            .get_organization(id)
            .await?
            .ok_or(DomainError::not_found("organization"))?;
        if patch.is_empty() {
            return Ok(current);
        }

        let updated = self
            .repo
            .update_organization(id, patch)
            .await?
            .ok_or(DomainError::not_found("organization"))?;

        self.recorder
            .record(
                Some(actor.user_id),
                ActivityAction::UpdateOrganization,
                format!("{} updated organization {}", actor.username, updated.name),
            )
            .await?;
        Ok(updated)
    }

    /// Users that reference the organization keep the now-dangling id.
    pub async fn delete_organization(&self, actor: &Principal, id: OrganizationId) -> AccountResult<()> {
        let org = self
            .repo
            .get_organization(id)
            .await?
            .ok_or(DomainError::not_found("organization"))?;
        if !self.repo.delete_organization(id).await? {
            return Err(DomainError::not_found("organization").into());
        }

        self.recorder
            .record(
                Some(actor.user_id),
                ActivityAction::DeleteOrganization,
                format!("{} deleted organization {}", actor.username, org.name),
            )
            .await?;

        tracing::info!(actor = %actor.user_id, organization_id = %id, "organization deleted");
        Ok(())
    }

    pub async fn get_organization(&self, id: OrganizationId) -> AccountResult<Organization> {
        Ok(self
            .repo
            .get_organization(id)
            .await?
            .ok_or(DomainError::not_found("organization"))?)
    }

    pub async fn list_organizations(&self) -> AccountResult<Vec<Organization>> {
        Ok(self.repo.list_organizations().await?)
    }

    /// Seed the SYSTEM organization if none exists. Safe to call on every boot.
    pub async fn ensure_system_organization(&self) -> AccountResult<Organization> {
        let existing = self
            .repo
            .list_organizations()
            .await?
            .into_iter()
            .find(|o| o.kind == OrganizationType::System);
        if let Some(org) = existing {
            return Ok(org);
        }

        let org = self
            .repo
            .create_organization(NewOrganization {
                name: SYSTEM_ORGANIZATION_NAME.to_string(),
                kind: OrganizationType::System,
            })
            .await?;
        self.recorder
            .record(
                None,
                ActivityAction::CreateOrganization,
                format!("system organization {} seeded", org.name),
            )
            .await?;

        tracing::info!(organization_id = %org.id, "system organization seeded");
        Ok(org)
    }
}
