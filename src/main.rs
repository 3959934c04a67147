use anyhow::Result;
use axum::Router;
use flisr_grid_controller::{api, auth, config, controller, telemetry};
use config::Config;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::load()?;

    if !auth::is_usable_token(&cfg.auth.token) {
        anyhow::bail!(
            "SECURITY ERROR: FLISR__AUTH__TOKEN must be set to a secure random token. \
            Generate one with: openssl rand -base64 32"
        );
    }

    if cfg.auth.token == "devtoken" {
        warn!("Using 'devtoken' auth token - this is only safe for local development!");
    }

    let app_state = controller::AppState::new(cfg.clone()).await?;

    #[allow(unused_mut)]
    let mut app: Router = api::router(app_state, &cfg);

    #[cfg(feature = "metrics")]
    {
        app = api::with_metrics(app);
    }

    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!(
            "Server binding to 0.0.0.0 exposes switching endpoints to the network; \
            bind to 127.0.0.1 unless behind a firewall or reverse proxy."
        );
    }

    info!(%addr, commands = ?cfg.commands.mode, "starting FLISR grid controller");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
