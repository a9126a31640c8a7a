//! Postgres-backed account repository.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation on `users_username_key`) | `23505` | `Conflict(UsernameTaken)` |
//! | Database (unique violation on `users_email_key`) | `23505` | `Conflict(EmailTaken)` |
//! | Anything else | any | `Backend` |
//!
//! ## Atomicity
//!
//! Each mutation is a single statement (`INSERT/UPDATE/DELETE ... RETURNING`),
//! so a partial-field update never leaves a row half-written. References
//! (`organization_id`, `manager_id`, `activities.user_id`) are plain columns
//! without foreign keys; deleting the referenced row leaves them dangling.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;

use rxconsole_auth::{
    Activity, ActivityAction, NewActivity, NewOrganization, NewUser, Organization,
    OrganizationPatch, Role, User, UserPatch,
};
use rxconsole_core::{ActivityId, ConflictKind, DomainError, OrganizationId, UserId};

use super::{AccountRepository, StoreError};

const USER_COLUMNS: &str = "id, username, password, full_name, email, role, status, organization_id, \
     region, state, city, pincode, address, manager_id, last_login, created_at";

const ORGANIZATION_COLUMNS: &str = "id, name, type, created_at";

const ACTIVITY_COLUMNS: &str = "id, user_id, action, description, created_at";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS organizations (
        id          BIGSERIAL PRIMARY KEY,
        name        TEXT NOT NULL,
        type        TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id               BIGSERIAL PRIMARY KEY,
        username         TEXT NOT NULL,
        password         TEXT NOT NULL,
        full_name        TEXT NOT NULL,
        email            TEXT NOT NULL,
        role             TEXT NOT NULL,
        status           TEXT NOT NULL DEFAULT 'ACTIVE',
        organization_id  BIGINT,
        region           TEXT,
        state            TEXT,
        city             TEXT,
        pincode          TEXT,
        address          TEXT,
        manager_id       BIGINT,
        last_login       TIMESTAMPTZ,
        created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT users_username_key UNIQUE (username),
        CONSTRAINT users_email_key UNIQUE (email)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS users_organization_id_idx ON users (organization_id)",
    "CREATE INDEX IF NOT EXISTS users_manager_id_idx ON users (manager_id)",
    r#"
    CREATE TABLE IF NOT EXISTS activities (
        id           BIGSERIAL PRIMARY KEY,
        user_id      BIGINT,
        action       TEXT NOT NULL,
        description  TEXT NOT NULL,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS activities_recent_idx ON activities (created_at DESC, id DESC)",
    "CREATE INDEX IF NOT EXISTS activities_user_id_idx ON activities (user_id)",
];

/// The single parameter of a user listing query, if any.
enum UserFilter<'a> {
    All,
    Id(i64),
    Text(&'a str),
}

/// Postgres-backed account repository.
///
/// Uses SQLx connection pool which is thread-safe (Arc + Send + Sync).
#[derive(Debug, Clone)]
pub struct PostgresAccountRepository {
    pool: Arc<PgPool>,
}

impl PostgresAccountRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create tables and indexes if they do not exist yet. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    async fn fetch_users(&self, operation: &str, sql: &str, bind: UserFilter<'_>) -> Result<Vec<User>, StoreError> {
        let query = sqlx::query(sql);
        let query = match bind {
            UserFilter::All => query,
            UserFilter::Id(value) => query.bind(value),
            UserFilter::Text(value) => query.bind(value),
        };
        let rows = query
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        rows.iter().map(|r| decode_user(operation, r)).collect()
    }

    async fn fetch_activities(
        &self,
        operation: &str,
        user_id: Option<UserId>,
        limit: Option<usize>,
    ) -> Result<Vec<Activity>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(ACTIVITY_COLUMNS).push(" FROM activities");
        if let Some(user_id) = user_id {
            qb.push(" WHERE user_id = ").push_bind(user_id.get());
        }
        qb.push(" ORDER BY created_at DESC, id DESC");
        if let Some(limit) = limit {
            qb.push(" LIMIT ").push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = qb
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        rows.iter()
            .map(|r| {
                ActivityRow::from_row(r)
                    .map(Activity::from)
                    .map_err(|e| map_sqlx_error(operation, e))
            })
            .collect()
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        row.map(|r| decode_user("get_user", &r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user_by_username", e))?;
        row.map(|r| decode_user("get_user_by_username", &r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user_by_email", e))?;
        row.map(|r| decode_user("get_user_by_email", &r)).transpose()
    }

    #[instrument(skip(self, new), fields(username = %new.username), err)]
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (
                username, password, full_name, email, role, status, organization_id,
                region, state, city, pincode, address, manager_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.username)
        .bind(&new.password)
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(new.role.as_str())
        .bind(new.status.as_str())
        .bind(new.organization_id.map(|id| id.get()))
        .bind(&new.region)
        .bind(&new.state)
        .bind(&new.city)
        .bind(&new.pincode)
        .bind(&new.address)
        .bind(new.manager_id.map(|id| id.get()))
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;
        decode_user("create_user", &row)
    }

    #[instrument(skip(self, patch), fields(user_id = %id), err)]
    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<Option<User>, StoreError> {
        if patch.is_empty() {
            return self.get_user(id).await;
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET ");
        let mut set = qb.separated(", ");
        if let Some(v) = patch.password {
            set.push("password = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.full_name {
            set.push("full_name = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.email {
            set.push("email = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.role {
            set.push("role = ").push_bind_unseparated(v.as_str());
        }
        if let Some(v) = patch.status {
            set.push("status = ").push_bind_unseparated(v.as_str());
        }
        if let Some(v) = patch.organization_id {
            set.push("organization_id = ").push_bind_unseparated(v.map(|id| id.get()));
        }
        if let Some(v) = patch.region {
            set.push("region = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.state {
            set.push("state = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.city {
            set.push("city = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.pincode {
            set.push("pincode = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.address {
            set.push("address = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.manager_id {
            set.push("manager_id = ").push_bind_unseparated(v.map(|id| id.get()));
        }
        if let Some(v) = patch.last_login {
            set.push("last_login = ").push_bind_unseparated(v);
        }
        qb.push(" WHERE id = ")
            .push_bind(id.get())
            .push(" RETURNING ")
            .push(USER_COLUMNS);

        let row = qb
            .build()
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_user", e))?;
        row.map(|r| decode_user("update_user", &r)).transpose()
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        self.fetch_users("list_users", &sql, UserFilter::All).await
    }

    #[instrument(skip(self), fields(role = %role), err)]
    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY id");
        self.fetch_users("list_users_by_role", &sql, UserFilter::Text(role.as_str())).await
    }

    #[instrument(skip(self), fields(organization_id = %org), err)]
    async fn list_users_by_organization(&self, org: OrganizationId) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE organization_id = $1 ORDER BY id");
        self.fetch_users("list_users_by_organization", &sql, UserFilter::Id(org.get())).await
    }

    #[instrument(skip(self), fields(manager_id = %manager), err)]
    async fn list_users_by_manager(&self, manager: UserId) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE manager_id = $1 ORDER BY id");
        self.fetch_users("list_users_by_manager", &sql, UserFilter::Id(manager.get())).await
    }

    #[instrument(skip(self), err)]
    async fn count_users(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM users")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_users", e))?;
        let total: i64 = row
            .try_get("total")
            .map_err(|e| map_sqlx_error("count_users", e))?;
        Ok(total.max(0) as u64)
    }

    #[instrument(skip(self), fields(organization_id = %id), err)]
    async fn get_organization(&self, id: OrganizationId) -> Result<Option<Organization>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_organization", e))?;
        row.map(|r| decode_organization("get_organization", &r)).transpose()
    }

    #[instrument(skip(self, new), fields(name = %new.name), err)]
    async fn create_organization(&self, new: NewOrganization) -> Result<Organization, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO organizations (name, type) VALUES ($1, $2) RETURNING {ORGANIZATION_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(new.kind.as_str())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_organization", e))?;
        decode_organization("create_organization", &row)
    }

    #[instrument(skip(self, patch), fields(organization_id = %id), err)]
    async fn update_organization(
        &self,
        id: OrganizationId,
        patch: OrganizationPatch,
    ) -> Result<Option<Organization>, StoreError> {
        if patch.is_empty() {
            return self.get_organization(id).await;
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE organizations SET ");
        let mut set = qb.separated(", ");
        if let Some(name) = patch.name {
            set.push("name = ").push_bind_unseparated(name);
        }
        if let Some(kind) = patch.kind {
            set.push("type = ").push_bind_unseparated(kind.as_str());
        }
        qb.push(" WHERE id = ")
            .push_bind(id.get())
            .push(" RETURNING ")
            .push(ORGANIZATION_COLUMNS);

        let row = qb
            .build()
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_organization", e))?;
        row.map(|r| decode_organization("update_organization", &r)).transpose()
    }

    #[instrument(skip(self), fields(organization_id = %id), err)]
    async fn delete_organization(&self, id: OrganizationId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_organization", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn list_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {ORGANIZATION_COLUMNS} FROM organizations ORDER BY id"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_organizations", e))?;
        rows.iter()
            .map(|r| decode_organization("list_organizations", r))
            .collect()
    }

    #[instrument(skip(self, new), fields(action = %new.action), err)]
    async fn create_activity(&self, new: NewActivity) -> Result<Activity, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO activities (user_id, action, description) VALUES ($1, $2, $3) RETURNING {ACTIVITY_COLUMNS}"
        ))
        .bind(new.user_id.map(|id| id.get()))
        .bind(new.action.as_str())
        .bind(&new.description)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_activity", e))?;
        ActivityRow::from_row(&row)
            .map(Activity::from)
            .map_err(|e| map_sqlx_error("create_activity", e))
    }

    #[instrument(skip(self), err)]
    async fn list_activities(&self, limit: Option<usize>) -> Result<Vec<Activity>, StoreError> {
        self.fetch_activities("list_activities", None, limit).await
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn list_activities_by_user(&self, user_id: UserId) -> Result<Vec<Activity>, StoreError> {
        self.fetch_activities("list_activities_by_user", Some(user_id), None).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLx row types
// ─────────────────────────────────────────────────────────────────────────────

struct UserRow(User);

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        let status: String = row.try_get("status")?;
        let organization_id: Option<i64> = row.try_get("organization_id")?;
        let manager_id: Option<i64> = row.try_get("manager_id")?;

        Ok(UserRow(User {
            id: UserId::new(row.try_get("id")?),
            username: row.try_get("username")?,
            password: row.try_get("password")?,
            full_name: row.try_get("full_name")?,
            email: row.try_get("email")?,
            role: role.parse().map_err(decode_error)?,
            status: status.parse().map_err(decode_error)?,
            organization_id: organization_id.map(OrganizationId::new),
            region: row.try_get("region")?,
            state: row.try_get("state")?,
            city: row.try_get("city")?,
            pincode: row.try_get("pincode")?,
            address: row.try_get("address")?,
            manager_id: manager_id.map(UserId::new),
            last_login: row.try_get("last_login")?,
            created_at: row.try_get("created_at")?,
        }))
    }
}

struct OrganizationRow(Organization);

impl<'r> FromRow<'r, PgRow> for OrganizationRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("type")?;
        Ok(OrganizationRow(Organization {
            id: OrganizationId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            kind: kind.parse().map_err(decode_error)?,
            created_at: row.try_get("created_at")?,
        }))
    }
}

#[derive(Debug)]
struct ActivityRow {
    id: i64,
    user_id: Option<i64>,
    action: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ActivityRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ActivityRow {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            action: row.try_get("action")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<ActivityRow> for Activity {
    fn from(row: ActivityRow) -> Self {
        Activity {
            id: ActivityId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            action: ActivityAction::from(row.action),
            description: row.description,
            timestamp: row.created_at,
        }
    }
}

fn decode_user(operation: &str, row: &PgRow) -> Result<User, StoreError> {
    UserRow::from_row(row)
        .map(|r| r.0)
        .map_err(|e| map_sqlx_error(operation, e))
}

fn decode_organization(operation: &str, row: &PgRow) -> Result<Organization, StoreError> {
    OrganizationRow::from_row(row)
        .map(|r| r.0)
        .map_err(|e| map_sqlx_error(operation, e))
}

fn decode_error(err: DomainError) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

/// Map SQLx errors to [`StoreError`].
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                match db_err.constraint() {
                    Some("users_username_key") => return StoreError::Conflict(ConflictKind::UsernameTaken),
                    Some("users_email_key") => return StoreError::Conflict(ConflictKind::EmailTaken),
                    _ => {}
                }
            }
            StoreError::Backend(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {}", operation)),
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
