use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use rxconsole_auth::{Argon2Hasher, CredentialHasher, SessionSigner, Sha256Hasher};
use rxconsole_infra::{
    accounts::{AccountLifecycle, Authenticator, Directory},
    repository::{AccountRepository, InMemoryAccountRepository, PostgresAccountRepository},
    session_store::{InMemorySessionStore, PostgresSessionStore, SessionStore},
};

use crate::config::{HasherKind, Settings, StorageBackend};

/// Everything a handler needs, built once per process.
pub struct AppServices {
    pub authenticator: Authenticator,
    pub lifecycle: AccountLifecycle,
    pub directory: Directory,
    pub repo: Arc<dyn AccountRepository>,
    pub sessions: Arc<dyn SessionStore>,
}

/// Wire storage, hashing and the account services from `settings`, prepare
/// the schema and seed the SYSTEM organization.
pub async fn build_services(settings: &Settings) -> anyhow::Result<AppServices> {
    let (repo, sessions): (Arc<dyn AccountRepository>, Arc<dyn SessionStore>) = match &settings.storage {
        StorageBackend::Memory => {
            tracing::info!("using in-memory account storage");
            (
                Arc::new(InMemoryAccountRepository::new()),
                Arc::new(InMemorySessionStore::new()),
            )
        }
        StorageBackend::Postgres { url, max_connections } => {
            let pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .connect(url)
                .await
                .context("failed to connect to DATABASE_URL")?;

            let repo = PostgresAccountRepository::new(pool.clone());
            repo.ensure_schema().await.context("failed to prepare account schema")?;
            let sessions = PostgresSessionStore::new(pool);
            sessions.ensure_schema().await.context("failed to prepare session schema")?;

            tracing::info!(max_connections, "using postgres account storage");
            (Arc::new(repo), Arc::new(sessions))
        }
    };

    let hasher: Arc<dyn CredentialHasher> = match settings.password_hasher {
        HasherKind::Argon2 => Arc::new(Argon2Hasher::new()),
        HasherKind::Sha256 => Arc::new(Sha256Hasher),
    };
    let signer = SessionSigner::new(&settings.session_secret).context("invalid SESSION_SECRET")?;

    let services = AppServices {
        authenticator: Authenticator::new(
            repo.clone(),
            sessions.clone(),
            hasher.clone(),
            signer,
            settings.session_ttl,
        ),
        lifecycle: AccountLifecycle::new(repo.clone(), hasher),
        directory: Directory::new(repo.clone()),
        repo,
        sessions,
    };

    services
        .lifecycle
        .ensure_system_organization()
        .await
        .context("failed to seed the system organization")?;

    Ok(services)
}

/// Periodically drop expired sessions. Expired sessions already read as
/// absent; this only reclaims space.
pub fn spawn_session_sweeper(
    sessions: Arc<dyn SessionStore>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "expired sessions purged"),
                Err(e) => tracing::warn!(error = %e, "session sweep failed"),
            }
        }
    })
}
