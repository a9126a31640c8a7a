use anyhow::Context;

use rxconsole_api::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            rxconsole_observability::init();
            tracing::error!(error = %e, "invalid configuration");
            return Err(e.into());
        }
    };
    rxconsole_observability::init_with(settings.log_format);

    if settings.uses_dev_secret() {
        tracing::warn!("SESSION_SECRET not set; using insecure dev default");
    }

    let app = rxconsole_api::app::build_app(&settings).await?;

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
