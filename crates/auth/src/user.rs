//! User account records.
//!
//! A user is a plain record owned by the account repository. These types carry
//! no storage concerns; the repository decides how ids and timestamps are
//! assigned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rxconsole_core::{OrganizationId, UserId};

use crate::Role;

// ─────────────────────────────────────────────────────────────────────────────
// User Status
// ─────────────────────────────────────────────────────────────────────────────

/// Account status annotation.
///
/// Any status may change to any other; nothing in the system enforces a
/// workflow between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Pending,
}

impl UserStatus {
    pub const ALL: [UserStatus; 3] = [UserStatus::Active, UserStatus::Inactive, UserStatus::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Inactive => "INACTIVE",
            UserStatus::Pending => "PENDING",
        }
    }
}

impl core::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for UserStatus {
    type Err = rxconsole_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| rxconsole_core::DomainError::validation(format!("unknown status '{s}'")))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A persisted user account.
///
/// `password` holds the credential digest, never plaintext. This type is not
/// `Serialize` on purpose: HTTP responses go through a DTO that omits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
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
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Materialize a new record from create input.
    pub fn from_new(id: UserId, new: NewUser, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            username: new.username,
            password: new.password,
            full_name: new.full_name,
            email: new.email,
            role: new.role,
            status: new.status,
            organization_id: new.organization_id,
            region: new.region,
            state: new.state,
            city: new.city,
            pincode: new.pincode,
            address: new.address,
            manager_id: new.manager_id,
            last_login: None,
            created_at,
        }
    }

    /// Apply only the fields present in `patch`.
    pub fn apply(&mut self, patch: &UserPatch) {
        if let Some(v) = &patch.password {
            self.password = v.clone();
        }
        if let Some(v) = &patch.full_name {
            self.full_name = v.clone();
        }
        if let Some(v) = &patch.email {
            self.email = v.clone();
        }
        if let Some(v) = patch.role {
            self.role = v;
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = patch.organization_id {
            self.organization_id = v;
        }
        if let Some(v) = &patch.region {
            self.region = v.clone();
        }
        if let Some(v) = &patch.state {
            self.state = v.clone();
        }
        if let Some(v) = &patch.city {
            self.city = v.clone();
        }
        if let Some(v) = &patch.pincode {
            self.pincode = v.clone();
        }
        if let Some(v) = &patch.address {
            self.address = v.clone();
        }
        if let Some(v) = patch.manager_id {
            self.manager_id = v;
        }
        if let Some(v) = patch.last_login {
            self.last_login = Some(v);
        }
    }
}

/// Create input. `password` must already be a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
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

/// Partial update.
///
/// `None` leaves a field untouched. For nullable attributes, `Some(None)`
/// clears the stored value and `Some(Some(v))` sets it. Username is absent:
/// it cannot change after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
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
    pub last_login: Option<DateTime<Utc>>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        *self == UserPatch::default()
    }

    pub fn last_login(at: DateTime<Utc>) -> Self {
        Self {
            last_login: Some(at),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User::from_new(
            UserId::new(1),
            NewUser {
                username: "alice".into(),
                password: "digest".into(),
                full_name: "Alice A".into(),
                email: "alice@example.com".into(),
                role: Role::AreaSalesManager,
                status: UserStatus::Active,
                organization_id: Some(OrganizationId::new(3)),
                region: Some("North".into()),
                state: None,
                city: Some("Pune".into()),
                pincode: None,
                address: None,
                manager_id: Some(UserId::new(9)),
            },
            Utc::now(),
        )
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let before = sample();
        let mut after = before.clone();
        after.apply(&UserPatch {
            full_name: Some("X".into()),
            ..Default::default()
        });

        assert_eq!(after.full_name, "X");
        assert_eq!(
            User {
                full_name: before.full_name.clone(),
                ..after
            },
            before
        );
    }

    #[test]
    fn explicit_null_clears_but_absent_keeps() {
        let mut user = sample();
        user.apply(&UserPatch {
            organization_id: Some(None),
            ..Default::default()
        });
        assert_eq!(user.organization_id, None);
        assert_eq!(user.manager_id, Some(UserId::new(9)));
        assert_eq!(user.region.as_deref(), Some("North"));
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(UserPatch::default().is_empty());
        assert!(!UserPatch::last_login(Utc::now()).is_empty());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in UserStatus::ALL {
            assert_eq!(status.as_str().parse::<UserStatus>().unwrap(), status);
        }
        assert_eq!(UserStatus::default(), UserStatus::Active);
    }
}
