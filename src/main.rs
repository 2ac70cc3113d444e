use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use roastr::config::{Cli, Config};
use roastr::db::{self, SqliteBackend};
use roastr::graphql::build_schema;
use roastr::routes;
use roastr::service::Roastr;
use roastr::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli)?;
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    let roastr = Arc::new(Roastr::new(Arc::new(SqliteBackend::new(pool.clone()))));
    roastr.load_tags().await;

    let state = AppState {
        db: pool,
        config: config.clone(),
        roastr,
        graphql_schema: build_schema(),
    };

    let with_seed = std::env::var(routes::seed::SEED_ENV).is_ok();
    let app = routes::app(state, with_seed);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
