use intel_platform::config::Config;
use intel_platform::db::PlatformStorage;
use intel_platform::db::seed::seed_demo_data;
use intel_platform::server::{PlatformState, platform_router};
use intel_platform::service::PasswordHasher;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        listen_addr = %cfg.basic.listen_addr,
        database_url = %cfg.basic.database_url,
        loglevel = %cfg.basic.loglevel,
        assistant_model = %cfg.assistant.model,
        assistant_online = cfg.assistant.is_online()
    );

    let storage = PlatformStorage::connect(&cfg.basic.database_url).await?;

    if cfg.basic.seed_demo_data {
        match seed_demo_data(&storage, PasswordHasher::new(cfg.auth.bcrypt_cost)).await {
            Ok(true) => info!("seeded demo accounts and records"),
            Ok(false) => info!("database already populated, skipping demo seed"),
            Err(e) => warn!(error = %e, "failed to seed demo data"),
        }
    }

    let state = PlatformState::new(storage, &cfg)?;
    let app = platform_router(state);

    let listener = TcpListener::bind(&cfg.basic.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.basic.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
