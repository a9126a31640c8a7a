//! Audit log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rxconsole_core::{ActivityId, UserId};

/// What happened. Unknown values survive a round trip as [`ActivityAction::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ActivityAction {
    Register,
    Login,
    Logout,
    CreateUser,
    UpdateUser,
    DeleteUser,
    CreateOrganization,
    UpdateOrganization,
    DeleteOrganization,
    Other(String),
}

impl ActivityAction {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityAction::Register => "REGISTER",
            ActivityAction::Login => "LOGIN",
            ActivityAction::Logout => "LOGOUT",
            ActivityAction::CreateUser => "CREATE_USER",
            ActivityAction::UpdateUser => "UPDATE_USER",
            ActivityAction::DeleteUser => "DELETE_USER",
            ActivityAction::CreateOrganization => "CREATE_ORGANIZATION",
            ActivityAction::UpdateOrganization => "UPDATE_ORGANIZATION",
            ActivityAction::DeleteOrganization => "DELETE_ORGANIZATION",
            ActivityAction::Other(s) => s,
        }
    }
}

impl core::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ActivityAction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "REGISTER" => ActivityAction::Register,
            "LOGIN" => ActivityAction::Login,
            "LOGOUT" => ActivityAction::Logout,
            "CREATE_USER" => ActivityAction::CreateUser,
            "UPDATE_USER" => ActivityAction::UpdateUser,
            "DELETE_USER" => ActivityAction::DeleteUser,
            "CREATE_ORGANIZATION" => ActivityAction::CreateOrganization,
            "UPDATE_ORGANIZATION" => ActivityAction::UpdateOrganization,
            "DELETE_ORGANIZATION" => ActivityAction::DeleteOrganization,
            _ => ActivityAction::Other(value),
        }
    }
}

impl From<ActivityAction> for String {
    fn from(value: ActivityAction) -> Self {
        match value {
            ActivityAction::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// An immutable audit entry. `user_id` is a weak reference: the user may
/// since have been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub user_id: Option<UserId>,
    pub action: ActivityAction,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Append input. The timestamp is always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub user_id: Option<UserId>,
    pub action: ActivityAction,
    pub description: String,
}
