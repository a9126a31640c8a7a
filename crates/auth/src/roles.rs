use core::str::FromStr;

use serde::{Deserialize, Serialize};

use rxconsole_core::DomainError;

/// Role identifier used for RBAC.
///
/// The role set is fixed. Each role has a rank; a higher rank may administer
/// a lower one (see [`crate::authorize`]).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    BusinessUnitHead,
    RegionalSalesManager,
    AreaSalesManager,
    MedicalRepresentative,
    DistributorHead,
    DistributorExecutive,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::SuperAdmin,
        Role::BusinessUnitHead,
        Role::RegionalSalesManager,
        Role::AreaSalesManager,
        Role::MedicalRepresentative,
        Role::DistributorHead,
        Role::DistributorExecutive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::BusinessUnitHead => "BUSINESS_UNIT_HEAD",
            Role::RegionalSalesManager => "REGIONAL_SALES_MANAGER",
            Role::AreaSalesManager => "AREA_SALES_MANAGER",
            Role::MedicalRepresentative => "MEDICAL_REPRESENTATIVE",
            Role::DistributorHead => "DISTRIBUTOR_HEAD",
            Role::DistributorExecutive => "DISTRIBUTOR_EXECUTIVE",
        }
    }

    /// Position in the administrative hierarchy. Sales and distributor chains
    /// share one scale so heads of either chain sit at the same level.
    pub fn rank(&self) -> u8 {
        match self {
            Role::SuperAdmin => 100,
            Role::BusinessUnitHead => 80,
            Role::RegionalSalesManager | Role::DistributorHead => 60,
            Role::AreaSalesManager => 40,
            Role::MedicalRepresentative | Role::DistributorExecutive => 20,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown role '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&Role::RegionalSalesManager).unwrap();
        assert_eq!(json, "\"REGIONAL_SALES_MANAGER\"");

        let role: Role = serde_json::from_str("\"DISTRIBUTOR_EXECUTIVE\"").unwrap();
        assert_eq!(role, Role::DistributorExecutive);
    }

    #[test]
    fn unknown_role_is_a_validation_error() {
        assert!(matches!("ADMIN".parse::<Role>(), Err(DomainError::Validation(_))));
        assert!(matches!("super_admin".parse::<Role>(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn super_admin_outranks_everyone() {
        for role in Role::ALL.into_iter().filter(|r| *r != Role::SuperAdmin) {
            assert!(Role::SuperAdmin.rank() > role.rank(), "{role}");
        }
    }

    proptest! {
        #[test]
        fn as_str_parses_back(idx in 0usize..Role::ALL.len()) {
            let role = Role::ALL[idx];
            prop_assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
            let json = serde_json::to_string(&role).unwrap();
            prop_assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
    }
}
