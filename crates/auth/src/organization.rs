//! Organization records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rxconsole_core::{DomainError, OrganizationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizationType {
    PharmaCompany,
    Distributor,
    /// The seeded administrative organization.
    System,
}

impl OrganizationType {
    pub const ALL: [OrganizationType; 3] = [
        OrganizationType::PharmaCompany,
        OrganizationType::Distributor,
        OrganizationType::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationType::PharmaCompany => "PHARMA_COMPANY",
            OrganizationType::Distributor => "DISTRIBUTOR",
            OrganizationType::System => "SYSTEM",
        }
    }
}

impl core::fmt::Display for OrganizationType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrganizationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrganizationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown organization type '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OrganizationType,
    pub created_at: DateTime<Utc>,
}

impl Organization {
    pub fn apply(&mut self, patch: &OrganizationPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrganization {
    pub name: String,
    pub kind: OrganizationType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationPatch {
    pub name: Option<String>,
    pub kind: Option<OrganizationType>,
}

impl OrganizationPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.kind.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_kind_as_type() {
        let org = Organization {
            id: OrganizationId::new(2),
            name: "Acme Pharma".into(),
            kind: OrganizationType::PharmaCompany,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&org).unwrap();
        assert_eq!(json["type"], "PHARMA_COMPANY");
        assert_eq!(json["id"], 2);
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn patch_keeps_absent_fields() {
        let mut org = Organization {
            id: OrganizationId::new(1),
            name: "Old".into(),
            kind: OrganizationType::Distributor,
            created_at: Utc::now(),
        };
        org.apply(&OrganizationPatch {
            name: Some("New".into()),
            kind: None,
        });
        assert_eq!(org.name, "New");
        assert_eq!(org.kind, OrganizationType::Distributor);
    }
}
