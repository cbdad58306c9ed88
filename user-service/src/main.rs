use service_core::observability::init_tracing;
use user_service::config::UserServiceConfig;
use user_service::startup::Application;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = UserServiceConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "user-service",
        &config.common.log_level,
        config.common.log_format,
    );

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start user-service: {}", e);
        anyhow::anyhow!("Startup error: {}", e)
    })?;

    app.run_until_stopped().await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    tracing::info!("user-service stopped");
    Ok(())
}
