use std::sync::Arc;

use anyhow::Context;

use medinv_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("failed to load .env: {e}");
        }
    }
    medinv_observability::init();

    let config = AppConfig::from_env();
    let bind_addr = config.bind_addr.clone();
    let alerts_enabled = config.alerts_enabled;

    let services = Arc::new(
        medinv_api::app::build_services(config).context("failed to open inventory storage")?,
    );

    let runner = if alerts_enabled {
        Some(
            services
                .spawn_calibration_runner()
                .context("failed to start calibration sweep runner")?,
        )
    } else {
        tracing::info!("calibration alerts disabled; sweep runner not started");
        None
    };

    let app = medinv_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;

    if let Some(runner) = runner {
        runner.shutdown();
    }
    tracing::info!("shut down");
    Ok(())
}
