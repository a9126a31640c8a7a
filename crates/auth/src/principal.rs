use rxconsole_core::{OrganizationId, UserId};

use crate::{Role, User};

/// The caller of a request, as of this request.
///
/// Built from a fresh repository read on every request, so a role change
/// takes effect on the caller's next request without touching the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
    pub organization_id: Option<OrganizationId>,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            organization_id: user.organization_id,
        }
    }
}
