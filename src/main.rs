use anyhow::Result;
use axum::Router;
use parking_forecast::{api, config, telemetry};
use config::Config;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;
    let state = api::AppState::new(cfg.clone())?;

    #[allow(unused_mut)]
    let mut app: Router = api::router(state);

    #[cfg(feature = "swagger")]
    {
        app = api::with_swagger(app);
    }

    #[cfg(feature = "metrics")]
    {
        app = api::with_metrics(app);
    }

    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!("binding to 0.0.0.0, service is reachable from the network");
    }

    if cfg!(not(feature = "ml")) {
        warn!("built without the `ml` feature, every forecast uses Simple-Pattern");
    }

    info!(%addr, upstream = %cfg.upstream.base_url, "starting parking forecast service");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
