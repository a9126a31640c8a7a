//! Login, logout, registration and session resolution.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Duration, Utc};

use rxconsole_auth::{
    ActivityAction, CredentialHasher, NewUser, OrganizationType, Role, SessionId, SessionSigner,
    User, UserPatch, UserStatus,
};
use rxconsole_core::{ConflictKind, DomainError, UserId};

use super::{validation, AccountResult, ActivityRecorder};
use crate::repository::AccountRepository;
use crate::session_store::SessionStore;

/// Self-service registration input. The password is plaintext here.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub region: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
    pub address: Option<String>,
}

/// A freshly issued session and the account it belongs to.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

pub struct Authenticator {
    repo: Arc<dyn AccountRepository>,
    sessions: Arc<dyn SessionStore>,
    hasher: Arc<dyn CredentialHasher>,
    signer: SessionSigner,
    recorder: ActivityRecorder,
    ttl: Duration,
    decoy: OnceLock<String>,
}

const DECOY_PASSWORD: &str = "rxconsole-decoy-credential";

impl Authenticator {
    pub fn new(
        repo: Arc<dyn AccountRepository>,
        sessions: Arc<dyn SessionStore>,
        hasher: Arc<dyn CredentialHasher>,
        signer: SessionSigner,
        ttl: Duration,
    ) -> Self {
        Self {
            recorder: ActivityRecorder::new(repo.clone()),
            repo,
            sessions,
            hasher,
            signer,
            ttl,
            decoy: OnceLock::new(),
        }
    }

    /// A digest produced by the configured hasher, verified against when the
    /// username is unknown so that both rejection paths do the same work.
    fn decoy_digest(&self) -> &str {
        self.decoy.get_or_init(|| match self.hasher.digest(DECOY_PASSWORD) {
            Ok(digest) => digest,
            Err(e) => {
                tracing::warn!(error = %e, "could not prepare decoy credential");
                String::new()
            }
        })
    }

    /// Verify credentials and open a session.
    ///
    /// Unknown username and wrong password produce the same error.
    pub async fn login(&self, username: &str, password: &str) -> AccountResult<IssuedSession> {
        let Some(user) = self.repo.get_user_by_username(username).await? else {
            let _ = self.hasher.verify(password, self.decoy_digest());
            tracing::info!(username, "login rejected");
            return Err(DomainError::InvalidCredentials.into());
        };

        if !self.hasher.verify(password, &user.password) {
            tracing::info!(username, "login rejected");
            return Err(DomainError::InvalidCredentials.into());
        }

        let user = self
            .repo
            .update_user(user.id, UserPatch::last_login(Utc::now()))
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        let session = self.issue(user).await?;
        self.recorder
            .record(
                Some(session.user.id),
                ActivityAction::Login,
                format!("{} logged in", session.user.username),
            )
            .await?;

        tracing::info!(user_id = %session.user.id, "login succeeded");
        Ok(session)
    }

    /// Destroy the session behind `token`. Succeeds whether or not it existed.
    pub async fn logout(&self, token: &str) -> AccountResult<()> {
        let Some(sid) = self.signer.verify(token) else {
            return Ok(());
        };
        let Some(user_id) = self.sessions.delete(&sid).await? else {
            return Ok(());
        };

        let who = match self.repo.get_user(user_id).await? {
            Some(user) => user.username,
            None => format!("user #{user_id}"),
        };
        self.recorder
            .record(Some(user_id), ActivityAction::Logout, format!("{who} logged out"))
            .await?;

        tracing::info!(%user_id, "logout");
        Ok(())
    }

    /// Create an account and log it in.
    ///
    /// The very first account becomes SUPER_ADMIN of the SYSTEM organization;
    /// every later registrant is a MEDICAL_REPRESENTATIVE without an
    /// organization. Status is always ACTIVE.
    pub async fn register(&self, input: Registration) -> AccountResult<IssuedSession> {
        validation::username(&input.username)?;
        validation::full_name(&input.full_name)?;
        validation::email(&input.email)?;
        validation::password(&input.password)?;

        if self.repo.get_user_by_username(&input.username).await?.is_some() {
            return Err(DomainError::conflict(ConflictKind::UsernameTaken).into());
        }
        if self.repo.get_user_by_email(&input.email).await?.is_some() {
            return Err(DomainError::conflict(ConflictKind::EmailTaken).into());
        }

        let (role, organization_id) = if self.repo.count_users().await? == 0 {
            let system = self
                .repo
                .list_organizations()
                .await?
                .into_iter()
                .find(|o| o.kind == OrganizationType::System)
                .map(|o| o.id);
            (Role::SuperAdmin, system)
        } else {
            (Role::MedicalRepresentative, None)
        };

        let password = self.hasher.digest(&input.password)?;
        let user = self
            .repo
            .create_user(NewUser {
                username: input.username,
                password,
                full_name: input.full_name,
                email: input.email,
                role,
                status: UserStatus::Active,
                organization_id,
                region: input.region,
                state: input.state,
                city: input.city,
                pincode: input.pincode,
                address: input.address,
                manager_id: None,
            })
            .await?;

        self.recorder
            .record(
                Some(user.id),
                ActivityAction::Register,
                format!("{} registered as {}", user.username, user.role),
            )
            .await?;

        let user = self
            .repo
            .update_user(user.id, UserPatch::last_login(Utc::now()))
            .await?
            .ok_or(DomainError::not_found("user"))?;

        tracing::info!(user_id = %user.id, role = %user.role, "registered");
        self.issue(user).await
    }

    /// The user bound to `token`, if the token is authentic and the session live.
    pub async fn resolve(&self, token: &str) -> AccountResult<Option<UserId>> {
        let Some(sid) = self.signer.verify(token) else {
            return Ok(None);
        };
        Ok(self.sessions.get(&sid).await?)
    }

    async fn issue(&self, user: User) -> AccountResult<IssuedSession> {
        let sid = SessionId::generate();
        self.sessions.put(&sid, user.id, self.ttl).await?;
        Ok(IssuedSession {
            token: self.signer.sign(&sid),
            expires_at: Utc::now() + self.ttl,
            user,
        })
    }
}
