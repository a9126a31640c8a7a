use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use rxconsole_auth::{OrganizationPatch, OrganizationType, Role, User, UserStatus};
use rxconsole_core::{DomainError, OrganizationId, UserId};
use rxconsole_infra::accounts::{CreateUserInput, IssuedSession, Registration, UserChanges, UserQuery};

// -------------------------
// Request DTOs
// -------------------------

/// Any `role` the client sends is ignored; registration decides the role.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
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

impl From<RegisterRequest> for Registration {
    fn from(body: RegisterRequest) -> Self {
        Registration {
            username: body.username,
            password: body.password,
            full_name: body.full_name,
            email: body.email,
            region: body.region,
            state: body.state,
            city: body.city,
            pincode: body.pincode,
            address: body.address,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub status: UserStatus,
    pub organization_id: Option<OrganizationId>,
    pub region: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
    pub address: Option<String>,
    pub manager_id: Option<UserId>,
}

impl From<CreateUserRequest> for CreateUserInput {
    fn from(body: CreateUserRequest) -> Self {
        CreateUserInput {
            username: body.username,
            password: body.password,
            full_name: body.full_name,
            email: body.email,
            role: body.role,
            status: body.status,
            organization_id: body.organization_id,
            region: body.region,
            state: body.state,
            city: body.city,
            pincode: body.pincode,
            address: body.address,
            manager_id: body.manager_id,
        }
    }
}

/// Absent keys are left alone. For nullable attributes an explicit `null`
/// clears the stored value. `username` is not updatable and is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub organization_id: Option<Option<OrganizationId>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub region: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub pincode: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub manager_id: Option<Option<UserId>>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(body: UpdateUserRequest) -> Self {
        UserChanges {
            password: body.password,
            full_name: body.full_name,
            email: body.email,
            role: body.role,
            status: body.status,
            organization_id: body.organization_id,
            region: body.region,
            state: body.state,
            city: body.city,
            pincode: body.pincode,
            address: body.address,
            manager_id: body.manager_id,
        }
    }
}

/// A present key (even `null`) becomes `Some(..)`; serde's `default` covers absence.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OrganizationType,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrganizationRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<OrganizationType>,
}

impl From<UpdateOrganizationRequest> for OrganizationPatch {
    fn from(body: UpdateOrganizationRequest) -> Self {
        OrganizationPatch {
            name: body.name,
            kind: body.kind,
        }
    }
}

/// Raw `/users` query string. Values are parsed by hand so a bad filter
/// answers with the standard JSON error shape.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListParams {
    pub role: Option<String>,
    pub organization_id: Option<String>,
    pub manager_id: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl TryFrom<UserListParams> for UserQuery {
    type Error = DomainError;

    fn try_from(params: UserListParams) -> Result<Self, Self::Error> {
        Ok(UserQuery {
            role: params.role.as_deref().map(str::parse::<Role>).transpose()?,
            organization_id: params
                .organization_id
                .as_deref()
                .map(str::parse::<OrganizationId>)
                .transpose()?,
            manager_id: params.manager_id.as_deref().map(str::parse::<UserId>).transpose()?,
            status: params.status.as_deref().map(str::parse::<UserStatus>).transpose()?,
            search: params.search,
            page: parse_number("page", params.page.as_deref())?,
            per_page: parse_number("perPage", params.per_page.as_deref())?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityListParams {
    pub limit: Option<String>,
}

impl ActivityListParams {
    pub fn limit(&self) -> Result<Option<usize>, DomainError> {
        parse_number("limit", self.limit.as_deref())
    }
}

fn parse_number<T: core::str::FromStr>(name: &str, raw: Option<&str>) -> Result<Option<T>, DomainError> {
    raw.map(|s| {
        s.trim()
            .parse::<T>()
            .map_err(|_| DomainError::validation(format!("{name} must be a non-negative integer")))
    })
    .transpose()
}

// -------------------------
// Response DTOs
// -------------------------

/// Public view of a user. There is no password field to leak.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
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

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
            status: user.status,
            organization_id: user.organization_id,
            region: user.region,
            state: user.state,
            city: user.city,
            pincode: user.pincode,
            address: user.address,
            manager_id: user.manager_id,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl From<IssuedSession> for SessionResponse {
    fn from(session: IssuedSession) -> Self {
        SessionResponse {
            token: session.token,
            expires_at: session.expires_at,
            user: session.user.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Items<T> {
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_distinguishes_null_from_absent() {
        let body: UpdateUserRequest =
            serde_json::from_str(r#"{"fullName":"X","region":null}"#).unwrap();
        let changes = UserChanges::from(body);
        assert_eq!(changes.full_name.as_deref(), Some("X"));
        assert_eq!(changes.region, Some(None));
        assert_eq!(changes.city, None);
        assert_eq!(changes.organization_id, None);
    }

    #[test]
    fn list_params_parse_or_reject() {
        let query = UserQuery::try_from(UserListParams {
            role: Some("AREA_SALES_MANAGER".into()),
            organization_id: Some("3".into()),
            per_page: Some("10".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(query.role, Some(Role::AreaSalesManager));
        assert_eq!(query.organization_id, Some(OrganizationId::new(3)));
        assert_eq!(query.per_page, Some(10));

        assert!(UserQuery::try_from(UserListParams {
            status: Some("ASLEEP".into()),
            ..Default::default()
        })
        .is_err());
        assert!(UserQuery::try_from(UserListParams {
            page: Some("-1".into()),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn register_ignores_requested_role() {
        let body: RegisterRequest = serde_json::from_str(
            r#"{"username":"a","password":"secret123","fullName":"A","email":"a@b.co","role":"SUPER_ADMIN"}"#,
        )
        .unwrap();
        assert_eq!(Registration::from(body).username, "a");
    }
}
