//! Named role sets used by the authorization gate.

use crate::Role;

/// A permitted set of roles for one class of action.
///
/// The name describes the action ("manage users") and appears in 403 messages.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RoleSet {
    action: &'static str,
    roles: &'static [Role],
}

impl RoleSet {
    pub const fn new(action: &'static str, roles: &'static [Role]) -> Self {
        Self { action, roles }
    }

    pub fn action(&self) -> &'static str {
        self.action
    }

    pub fn contains(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// May create, update and delete user accounts.
pub const USER_ADMINISTRATORS: RoleSet = RoleSet::new(
    "manage users",
    &[Role::SuperAdmin, Role::BusinessUnitHead, Role::DistributorHead],
);

/// May create, update and delete organizations.
pub const ORGANIZATION_ADMINISTRATORS: RoleSet = RoleSet::new(
    "manage organizations",
    &[Role::SuperAdmin, Role::BusinessUnitHead],
);

/// See every user in directory listings, regardless of organization.
pub const DIRECTORY_WIDE: RoleSet = RoleSet::new(
    "view all users",
    &[Role::SuperAdmin, Role::BusinessUnitHead],
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_two_ranks_sit_in_every_set() {
        for role in Role::ALL {
            let everywhere = [USER_ADMINISTRATORS, ORGANIZATION_ADMINISTRATORS, DIRECTORY_WIDE]
                .iter()
                .all(|set| set.contains(role));
            assert_eq!(everywhere, matches!(role, Role::SuperAdmin | Role::BusinessUnitHead));
        }
        assert!(!ORGANIZATION_ADMINISTRATORS.contains(Role::DistributorHead));
        assert!(USER_ADMINISTRATORS.contains(Role::DistributorHead));
    }
}
